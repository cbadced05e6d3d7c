//! PyO3 bindings for Python integration

use pyo3::exceptions::{PyOSError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::error::AudioError;

mod audio_bindings;
mod filter_bindings;
mod playback_bindings;
mod spectrum_bindings;

impl From<AudioError> for PyErr {
    fn from(err: AudioError) -> PyErr {
        match err {
            AudioError::UnsupportedFormat(_)
            | AudioError::InvalidFilter(_)
            | AudioError::InvalidConfig(_)
            | AudioError::EmptySignal => {
                PyValueError::new_err(err.to_string())
            }
            AudioError::Io(_) => PyOSError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Python module definition
#[pymodule]
fn spectral_studio(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<filter_bindings::PyFilterSpec>()?;
    m.add_class::<filter_bindings::PySpectralFilter>()?;
    m.add_class::<spectrum_bindings::PyChunkAnalyzer>()?;
    m.add_class::<playback_bindings::PyPlayer>()?;
    m.add_class::<audio_bindings::PyRecorder>()?;
    m.add_class::<audio_bindings::PyAudioDeviceInfo>()?;

    m.add_function(wrap_pyfunction!(filter_bindings::load_waveform, m)?)?;
    m.add_function(wrap_pyfunction!(audio_bindings::list_input_devices, m)?)?;

    Ok(())
}
