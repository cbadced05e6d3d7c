//! Live spectrum of captured chunks
//!
//! Feeds the recording view: each chunk is transformed on its own and its
//! magnitudes are scaled so the strongest bin reads 1.0.

use super::fft::FftEngine;
use crate::error::Result;

/// Live chunk analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Chunk length in samples (one FFT per chunk)
    pub fft_size: usize,

    /// Capture sample rate in Hz
    pub sample_rate: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            sample_rate: 44100.0,
        }
    }
}

/// Peak-normalized magnitude spectrum of one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSpectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

/// Spectrum analyzer for the live capture view
pub struct ChunkAnalyzer {
    config: AnalyzerConfig,
    fft_engine: FftEngine,
    frequencies: Vec<f64>,
}

impl ChunkAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let fft_engine = FftEngine::new(config.fft_size);
        let frequencies = fft_engine.frequency_axis_hz(config.sample_rate);

        Self {
            config,
            fft_engine,
            frequencies,
        }
    }

    /// Analyze one captured chunk
    ///
    /// Short chunks are zero padded. A silent chunk yields all-zero
    /// magnitudes instead of dividing by a zero peak.
    pub fn analyze(&mut self, chunk: &[i16]) -> Result<ChunkSpectrum> {
        let signal: Vec<f64> = chunk.iter().map(|&s| s as f64).collect();
        let mut magnitudes = self.fft_engine.compute_magnitude(&signal)?;

        let peak = magnitudes.iter().copied().fold(0.0, f64::max);
        if peak > 0.0 {
            for m in magnitudes.iter_mut() {
                *m /= peak;
            }
        }

        Ok(ChunkSpectrum {
            frequencies: self.frequencies.clone(),
            magnitudes,
        })
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Get number of frequency bins
    pub fn num_bins(&self) -> usize {
        self.fft_engine.num_bins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_chunk_peak_is_unity() {
        let mut analyzer = ChunkAnalyzer::new(AnalyzerConfig {
            fft_size: 1024,
            sample_rate: 44100.0,
        });

        // Bin 100 of a 1024-point FFT at 44.1 kHz
        let freq_hz = 100.0 * 44100.0 / 1024.0;
        let chunk: Vec<i16> = (0..1024)
            .map(|n| (8000.0 * (2.0 * PI * freq_hz * n as f64 / 44100.0).sin()) as i16)
            .collect();

        let spectrum = analyzer.analyze(&chunk).unwrap();
        assert_eq!(spectrum.magnitudes.len(), 513);
        assert_eq!(spectrum.frequencies.len(), 513);
        assert!((spectrum.magnitudes[100] - 1.0).abs() < 1e-12);
        assert!(spectrum.magnitudes.iter().all(|&m| m <= 1.0));
    }

    #[test]
    fn test_silent_chunk_is_all_zero() {
        let mut analyzer = ChunkAnalyzer::new(AnalyzerConfig::default());
        let spectrum = analyzer.analyze(&[0; 1024]).unwrap();

        assert!(spectrum.magnitudes.iter().all(|&m| m == 0.0));
    }
}
