//! Whole-buffer FFT filtering
//!
//! normalize -> rfft -> mask -> irfft -> rescale to i16. The magnitudes
//! before and after masking are returned for the comparison plots.

use std::path::{Path, PathBuf};

use super::spec::FilterSpec;
use crate::error::{AudioError, Result};
use crate::signal::{self, DecodeQuirk, SampleBuffer};
use crate::spectrum::FftEngine;

/// Stands in for an exact zero peak: an inverse FFT of an all-zero
/// spectrum returns round-off residue rather than exact zeros
const SILENCE_FLOOR: f64 = 1e-9;

/// Bin frequencies with magnitudes before and after masking
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumPair {
    /// Bin frequencies in Hz
    pub frequencies: Vec<f64>,

    /// |X[k]| of the normalized input
    pub original_magnitudes: Vec<f64>,

    /// |X[k]| after the mask
    pub filtered_magnitudes: Vec<f64>,
}

impl SpectrumPair {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Result of filtering a file on disk
#[derive(Debug, Clone)]
pub struct FilterReport {
    pub output_path: PathBuf,
    pub buffer: SampleBuffer,
    pub spectrum: SpectrumPair,
}

/// FFT filter over complete buffers
///
/// Keeps the last FFT plan so repeated passes over equal-length buffers
/// skip planning.
#[derive(Default)]
pub struct SpectralFilter {
    engine: Option<FftEngine>,
}

impl SpectralFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn engine_for(&mut self, len: usize) -> &mut FftEngine {
        let stale = self.engine.as_ref().map_or(true, |e| e.fft_size() != len);
        if stale {
            self.engine = Some(FftEngine::new(len));
        }
        self.engine.get_or_insert_with(|| FftEngine::new(len))
    }

    /// Filter a buffer, producing a new 16-bit buffer and the spectra
    ///
    /// Fails with `EmptySignal` when the input is silent or when the mask
    /// removes every bin that carried energy.
    pub fn apply(&mut self, buffer: &SampleBuffer, spec: FilterSpec) -> Result<(SampleBuffer, SpectrumPair)> {
        spec.validate()?;

        let normalized = buffer.normalized()?;
        let n = normalized.len();
        let sample_rate = buffer.sample_rate();

        let engine = self.engine_for(n);
        let mut bins = engine.forward(&normalized)?;
        let frequencies = engine.frequency_axis_hz(sample_rate as f64);

        let original_magnitudes: Vec<f64> = bins.iter().map(|c| c.norm()).collect();
        spec.apply_mask(&mut bins, &frequencies);
        let filtered_magnitudes: Vec<f64> = bins.iter().map(|c| c.norm()).collect();

        let reconstructed = engine.inverse(&mut bins)?;

        let peak = reconstructed.iter().map(|x| x.abs()).fold(0.0, f64::max);
        if peak < SILENCE_FLOOR {
            return Err(AudioError::EmptySignal);
        }

        let scale = i16::MAX as f64 / peak;
        let samples: Vec<i16> = reconstructed.iter().map(|&x| (x * scale) as i16).collect();

        log::debug!(
            "Applied {} to {} samples at {} Hz ({} bins)",
            spec,
            n,
            sample_rate,
            frequencies.len()
        );

        let mut filtered = SampleBuffer::from_i16(samples, sample_rate)?;
        if buffer.has_quirk(DecodeQuirk::DuplicatedLength) {
            filtered = filtered.truncated(n / 2);
        }
        let spectrum = SpectrumPair {
            frequencies,
            original_magnitudes,
            filtered_magnitudes,
        };

        Ok((filtered, spectrum))
    }

    /// Load a file, filter it and write `<stem>_<params>_<KIND>.wav` beside it
    ///
    /// Nothing is written unless the whole transform succeeds.
    pub fn process_file(&mut self, path: impl AsRef<Path>, spec: FilterSpec) -> Result<FilterReport> {
        let path = path.as_ref();
        let input = signal::load(path)?;
        let (buffer, spectrum) = self.apply(&input, spec)?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AudioError::UnsupportedFormat(path.display().to_string()))?;
        let output_path = path.with_file_name(spec.output_file_name(stem));

        signal::write_wav(&output_path, &buffer)?;
        log::info!("Wrote {} ({})", output_path.display(), spec);

        Ok(FilterReport {
            output_path,
            buffer,
            spectrum,
        })
    }
}
