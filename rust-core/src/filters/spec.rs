//! Brick-wall frequency masks
//!
//! A bin passes when its frequency lies inside the band; a bin exactly on a
//! cutoff passes. Passing bins are left untouched, everything else is zeroed.

use num_complex::Complex;
use std::fmt;

use crate::error::{AudioError, Result};

/// Filter kind and cutoff(s) in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSpec {
    /// Keep bins at or below `cutoff`
    LowPass { cutoff: f64 },

    /// Keep bins at or above `cutoff`
    HighPass { cutoff: f64 },

    /// Keep bins inside `[low, high]`
    BandPass { low: f64, high: f64 },
}

impl FilterSpec {
    pub fn low_pass(cutoff: f64) -> Self {
        FilterSpec::LowPass { cutoff }
    }

    pub fn high_pass(cutoff: f64) -> Self {
        FilterSpec::HighPass { cutoff }
    }

    pub fn band_pass(low: f64, high: f64) -> Self {
        FilterSpec::BandPass { low, high }
    }

    /// Check cutoffs are finite and non-negative, and that a band is ordered
    pub fn validate(&self) -> Result<()> {
        let cutoffs = match *self {
            FilterSpec::LowPass { cutoff } | FilterSpec::HighPass { cutoff } => vec![cutoff],
            FilterSpec::BandPass { low, high } => vec![low, high],
        };

        if let Some(bad) = cutoffs.iter().find(|c| !c.is_finite() || **c < 0.0) {
            return Err(AudioError::InvalidFilter(format!(
                "cutoff {} Hz must be a non-negative number",
                bad
            )));
        }

        if let FilterSpec::BandPass { low, high } = *self {
            if low >= high {
                return Err(AudioError::InvalidFilter(format!(
                    "band low edge {} Hz must be below high edge {} Hz",
                    low, high
                )));
            }
        }

        Ok(())
    }

    /// Whether a bin at `freq` Hz survives the mask
    pub fn passes(&self, freq: f64) -> bool {
        match *self {
            FilterSpec::LowPass { cutoff } => freq <= cutoff,
            FilterSpec::HighPass { cutoff } => freq >= cutoff,
            FilterSpec::BandPass { low, high } => freq >= low && freq <= high,
        }
    }

    /// Zero every bin whose frequency falls outside the pass band
    pub fn apply_mask(&self, spectrum: &mut [Complex<f64>], frequencies: &[f64]) {
        for (bin, &freq) in spectrum.iter_mut().zip(frequencies.iter()) {
            if !self.passes(freq) {
                *bin = Complex::new(0.0, 0.0);
            }
        }
    }

    /// Short kind tag used in output names
    pub fn kind_suffix(&self) -> &'static str {
        match self {
            FilterSpec::LowPass { .. } => "LP",
            FilterSpec::HighPass { .. } => "HP",
            FilterSpec::BandPass { .. } => "BP",
        }
    }

    /// Cutoff parameters as they appear in output names
    pub fn params_label(&self) -> String {
        match self {
            FilterSpec::LowPass { cutoff } | FilterSpec::HighPass { cutoff } => cutoff.to_string(),
            FilterSpec::BandPass { low, high } => format!("{}-{}", low, high),
        }
    }

    /// `<stem>_<params>_<KIND>.wav`
    pub fn output_file_name(&self, stem: &str) -> String {
        format!("{}_{}_{}.wav", stem, self.params_label(), self.kind_suffix())
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::LowPass { cutoff } => write!(f, "low-pass {} Hz", cutoff),
            FilterSpec::HighPass { cutoff } => write!(f, "high-pass {} Hz", cutoff),
            FilterSpec::BandPass { low, high } => write!(f, "band-pass {}-{} Hz", low, high),
        }
    }
}
