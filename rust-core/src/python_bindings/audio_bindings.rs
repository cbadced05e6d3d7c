//! Python bindings for microphone recording

use std::path::PathBuf;

use numpy::PyArray1;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::audio::device;
use crate::audio::{AudioDeviceInfo, RecordingConfig, RecordingEngine, RecordingEvent, RecordingFormat, RecordingState};

/// Audio device information exposed to Python
#[pyclass(name = "AudioDeviceInfo")]
#[derive(Clone)]
pub struct PyAudioDeviceInfo {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub index: usize,
    #[pyo3(get)]
    pub max_input_channels: u16,
}

impl From<AudioDeviceInfo> for PyAudioDeviceInfo {
    fn from(info: AudioDeviceInfo) -> Self {
        Self {
            name: info.name,
            index: info.index,
            max_input_channels: info.max_input_channels,
        }
    }
}

/// List devices that can capture audio
#[pyfunction]
pub fn list_input_devices() -> PyResult<Vec<PyAudioDeviceInfo>> {
    Ok(device::list_input_devices()?
        .into_iter()
        .map(PyAudioDeviceInfo::from)
        .collect())
}

/// Recorder exposed to Python
#[pyclass(name = "Recorder", unsendable)]
pub struct PyRecorder {
    engine: RecordingEngine,
}

#[pymethods]
impl PyRecorder {
    /// Args:
    ///     output_dir: Directory receiving recorded_{n} files
    ///     format: "raw" or "wav"
    ///     sample_rate: Capture rate in Hz
    ///     chunk_size: Samples per captured chunk
    #[new]
    #[pyo3(signature = (output_dir="records", format="raw", sample_rate=44100, chunk_size=1024))]
    fn new(output_dir: &str, format: &str, sample_rate: u32, chunk_size: usize) -> PyResult<Self> {
        let format = match format {
            "raw" => RecordingFormat::Raw,
            "wav" => RecordingFormat::Wav,
            other => {
                return Err(PyValueError::new_err(format!(
                    "Unknown recording format: {}",
                    other
                )))
            }
        };

        let config = RecordingConfig {
            sample_rate,
            chunk_size,
            output_dir: PathBuf::from(output_dir),
            format,
            ring_capacity: sample_rate as usize,
        };
        config.validate()?;

        Ok(Self {
            engine: RecordingEngine::new(config),
        })
    }

    /// Start capturing; `None` leaves the recorder idle
    #[pyo3(signature = (device=None))]
    fn start(&mut self, device: Option<PyAudioDeviceInfo>) -> PyResult<()> {
        let info = device.map(|d| AudioDeviceInfo {
            name: d.name,
            index: d.index,
            max_input_channels: d.max_input_channels,
            max_output_channels: 0,
        });
        self.engine.start(info.as_ref())?;
        Ok(())
    }

    /// Read the next chunk, or None when not recording
    fn capture_chunk<'py>(&mut self, py: Python<'py>) -> PyResult<Option<&'py PyArray1<i16>>> {
        Ok(self
            .engine
            .capture_chunk()?
            .map(|chunk| PyArray1::from_vec(py, chunk)))
    }

    /// Stop and save; returns the written path
    fn stop(&mut self) -> PyResult<Option<String>> {
        Ok(self
            .engine
            .stop()?
            .map(|path| path.to_string_lossy().into_owned()))
    }

    fn close(&mut self) {
        self.engine.close();
    }

    fn is_recording(&self) -> bool {
        self.engine.state() == RecordingState::Recording
    }

    /// Drain pending notifications
    ///
    /// Returns:
    ///     List of ("chunk", sample_count) or ("finished", path) tuples
    fn poll_events(&self, py: Python<'_>) -> Vec<(&'static str, PyObject)> {
        self.engine
            .events()
            .try_iter()
            .map(|event| match event {
                RecordingEvent::ChunkCaptured(chunk) => ("chunk", chunk.len().into_py(py)),
                RecordingEvent::Finished(path) => ("finished", path.to_string_lossy().into_owned().into_py(py)),
            })
            .collect()
    }
}
