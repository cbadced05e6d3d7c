//! Python bindings for the live chunk spectrum

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use crate::spectrum::{AnalyzerConfig, ChunkAnalyzer};

/// Chunk analyzer exposed to Python
#[pyclass(name = "ChunkAnalyzer")]
pub struct PyChunkAnalyzer {
    analyzer: ChunkAnalyzer,
}

#[pymethods]
impl PyChunkAnalyzer {
    /// Create a new chunk analyzer
    ///
    /// Args:
    ///     fft_size: Chunk length in samples
    ///     sample_rate: Capture sample rate in Hz
    #[new]
    #[pyo3(signature = (fft_size=1024, sample_rate=44100.0))]
    fn new(fft_size: usize, sample_rate: f64) -> Self {
        Self {
            analyzer: ChunkAnalyzer::new(AnalyzerConfig { fft_size, sample_rate }),
        }
    }

    /// Peak-normalized magnitudes of one captured chunk
    ///
    /// Returns:
    ///     (frequencies, magnitudes)
    fn analyze<'py>(
        &mut self,
        py: Python<'py>,
        chunk: PyReadonlyArray1<i16>,
    ) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
        let spectrum = self.analyzer.analyze(chunk.as_slice()?)?;

        Ok((
            PyArray1::from_vec(py, spectrum.frequencies),
            PyArray1::from_vec(py, spectrum.magnitudes),
        ))
    }

    /// Number of frequency bins per chunk
    fn num_bins(&self) -> usize {
        self.analyzer.num_bins()
    }
}
