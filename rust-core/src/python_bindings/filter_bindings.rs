//! Python bindings for spectral filtering

use numpy::PyArray1;
use pyo3::prelude::*;

use crate::filters::{FilterSpec, SpectralFilter};
use crate::signal;

/// Filter shape exposed to Python
#[pyclass(name = "FilterSpec")]
#[derive(Clone)]
pub struct PyFilterSpec {
    inner: FilterSpec,
}

#[pymethods]
impl PyFilterSpec {
    /// Keep bins at or below `cutoff` Hz
    #[staticmethod]
    fn low_pass(cutoff: f64) -> PyResult<Self> {
        let inner = FilterSpec::low_pass(cutoff);
        inner.validate()?;
        Ok(Self { inner })
    }

    /// Keep bins at or above `cutoff` Hz
    #[staticmethod]
    fn high_pass(cutoff: f64) -> PyResult<Self> {
        let inner = FilterSpec::high_pass(cutoff);
        inner.validate()?;
        Ok(Self { inner })
    }

    /// Keep bins inside `[low, high]` Hz
    #[staticmethod]
    fn band_pass(low: f64, high: f64) -> PyResult<Self> {
        let inner = FilterSpec::band_pass(low, high);
        inner.validate()?;
        Ok(Self { inner })
    }

    /// File name the filtered copy of `stem` is saved under
    fn output_file_name(&self, stem: &str) -> String {
        self.inner.output_file_name(stem)
    }

    fn __repr__(&self) -> String {
        format!("FilterSpec({})", self.inner)
    }
}

/// FFT filter exposed to Python
#[pyclass(name = "SpectralFilter")]
pub struct PySpectralFilter {
    filter: SpectralFilter,
}

#[pymethods]
impl PySpectralFilter {
    #[new]
    fn new() -> Self {
        Self {
            filter: SpectralFilter::new(),
        }
    }

    /// Filter an audio file and save the result next to it
    ///
    /// Args:
    ///     path: Input file (wav, raw or a compressed format)
    ///     spec: FilterSpec to apply
    ///
    /// Returns:
    ///     (output_path, frequencies, original_magnitudes, filtered_magnitudes)
    fn process_file<'py>(
        &mut self,
        py: Python<'py>,
        path: &str,
        spec: &PyFilterSpec,
    ) -> PyResult<(String, &'py PyArray1<f64>, &'py PyArray1<f64>, &'py PyArray1<f64>)> {
        let report = self.filter.process_file(path, spec.inner)?;
        let spectrum = report.spectrum;

        Ok((
            report.output_path.to_string_lossy().into_owned(),
            PyArray1::from_vec(py, spectrum.frequencies),
            PyArray1::from_vec(py, spectrum.original_magnitudes),
            PyArray1::from_vec(py, spectrum.filtered_magnitudes),
        ))
    }
}

/// Load a file for the waveform view
///
/// Returns:
///     (time_axis_seconds, peak_normalized_samples, sample_rate)
#[pyfunction]
pub fn load_waveform<'py>(
    py: Python<'py>,
    path: &str,
) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>, u32)> {
    let buffer = signal::load(path)?;
    let samples = buffer.normalized()?;

    Ok((
        PyArray1::from_vec(py, buffer.time_axis()),
        PyArray1::from_vec(py, samples),
        buffer.sample_rate(),
    ))
}
