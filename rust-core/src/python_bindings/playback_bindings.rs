//! Python bindings for playback

use std::time::Duration;

use pyo3::prelude::*;

use crate::audio::{PlaybackConfig, PlaybackEngine, PlaybackEvent, PlaybackState};
use crate::signal;

/// Playback transport exposed to Python
#[pyclass(name = "Player")]
pub struct PyPlayer {
    engine: PlaybackEngine,
}

#[pymethods]
impl PyPlayer {
    /// Args:
    ///     chunk_size: Samples per streamed chunk
    ///     poll_interval_ms: Pause polling period
    #[new]
    #[pyo3(signature = (chunk_size=1024, poll_interval_ms=100))]
    fn new(chunk_size: usize, poll_interval_ms: u64) -> PyResult<Self> {
        let config = PlaybackConfig {
            chunk_size,
            poll_interval: Duration::from_millis(poll_interval_ms),
        };
        config.validate()?;

        Ok(Self {
            engine: PlaybackEngine::new(config),
        })
    }

    /// Load `path` and start playing it on the default output device
    fn play(&mut self, path: &str) -> PyResult<()> {
        let buffer = signal::load(path)?;
        self.engine.start(&buffer)?;
        Ok(())
    }

    fn pause(&self) {
        self.engine.pause();
    }

    fn resume(&self) {
        self.engine.resume();
    }

    #[pyo3(signature = (seconds=2.0))]
    fn seek_forward(&self, seconds: f64) {
        self.engine.seek_forward(seconds);
    }

    #[pyo3(signature = (seconds=2.0))]
    fn seek_backward(&self, seconds: f64) {
        self.engine.seek_backward(seconds);
    }

    fn reset(&self) {
        self.engine.reset();
    }

    /// Stop streaming and release the output device
    fn close(&mut self) {
        self.engine.close();
    }

    /// Cursor position in seconds
    fn position(&self) -> f64 {
        self.engine.position_secs()
    }

    /// One of "idle", "playing", "paused", "finished"
    fn state(&self) -> &'static str {
        match self.engine.state() {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Finished => "finished",
        }
    }

    /// Drain pending notifications
    ///
    /// Returns:
    ///     List of (kind, position_seconds) tuples; position is None except
    ///     for "position" events
    fn poll_events(&self) -> Vec<(&'static str, Option<f64>)> {
        self.engine
            .events()
            .try_iter()
            .map(|event| match event {
                PlaybackEvent::Paused => ("paused", None),
                PlaybackEvent::Resumed => ("resumed", None),
                PlaybackEvent::Finished => ("finished", None),
                PlaybackEvent::Position(secs) => ("position", Some(secs)),
            })
            .collect()
    }
}
