//! Spectral Studio - audio filtering and transport core
//!
//! Frequency-domain filtering of recorded or loaded audio, chunked playback
//! with pause and seek, and microphone capture sessions. Python bindings
//! are available behind the `python` feature.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audio;
pub mod error;
pub mod filters;
pub mod signal;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use audio::{PlaybackEngine, RecordingEngine};
pub use error::{AudioError, Result};
pub use filters::{FilterSpec, SpectralFilter};
pub use signal::SampleBuffer;
pub use spectrum::ChunkAnalyzer;
