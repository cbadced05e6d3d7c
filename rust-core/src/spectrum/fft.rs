//! FFT engine using realfft for real-valued signals
//!
//! Forward and inverse transforms share one planner so a filter pass over a
//! whole buffer plans each length once.

use num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::error::{AudioError, Result};

/// FFT engine for real-valued signals of one fixed length
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Inverse real FFT processor
    c2r: Arc<dyn ComplexToReal<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);

        Self {
            fft_size,
            r2c,
            c2r,
            input_buffer: vec![0.0; fft_size],
        }
    }

    /// Compute the complex spectrum of a real signal
    ///
    /// # Arguments
    /// * `signal` - Input signal (zero-padded if shorter than fft_size)
    ///
    /// # Returns
    /// Bins X[k] for k = 0..=fft_size/2
    pub fn forward(&mut self, signal: &[f64]) -> Result<Vec<Complex<f64>>> {
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        let mut spectrum = self.r2c.make_output_vec();
        self.r2c
            .process(&mut self.input_buffer, &mut spectrum)
            .map_err(|e| AudioError::Transform(e.to_string()))?;

        Ok(spectrum)
    }

    /// Reconstruct a real signal of fft_size samples from its half spectrum
    ///
    /// The spectrum is consumed as scratch space. Output is scaled by 1/N so
    /// `inverse(forward(x)) == x`.
    pub fn inverse(&mut self, spectrum: &mut [Complex<f64>]) -> Result<Vec<f64>> {
        if spectrum.len() != self.num_bins() {
            return Err(AudioError::Transform(format!(
                "expected {} bins, got {}",
                self.num_bins(),
                spectrum.len()
            )));
        }

        // DC and Nyquist bins of a real signal have no imaginary part
        spectrum[0].im = 0.0;
        if self.fft_size % 2 == 0 {
            if let Some(last) = spectrum.last_mut() {
                last.im = 0.0;
            }
        }

        let mut output = self.c2r.make_output_vec();
        self.c2r
            .process(spectrum, &mut output)
            .map_err(|e| AudioError::Transform(e.to_string()))?;

        let scale = 1.0 / self.fft_size as f64;
        for s in output.iter_mut() {
            *s *= scale;
        }

        Ok(output)
    }

    /// Compute FFT and return magnitude spectrum
    pub fn compute_magnitude(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        Ok(self.forward(signal)?.iter().map(|c| c.norm()).collect())
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Frequency of every bin in Hz: k * sample_rate / N
    pub fn frequency_axis_hz(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.num_bins())
            .map(|k| k as f64 * sample_rate / self.fft_size as f64)
            .collect()
    }
}
