//! Error type shared by the signal, filter and audio layers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Signal has zero magnitude, cannot normalize")]
    EmptySignal,

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to open audio stream: {0}")]
    StreamOpenFailure(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("FFT failed: {0}")]
    Transform(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;
