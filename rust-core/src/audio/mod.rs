//! Audio input/output management with cpal

pub mod buffer;
pub mod device;
pub mod input;
pub mod output;
pub mod playback;
pub mod recording;

pub use buffer::AudioRingBuffer;
pub use device::{list_input_devices, AudioDeviceInfo};
pub use input::{AudioSource, CpalSource};
pub use output::{AudioSink, CpalSink};
pub use playback::{PlaybackConfig, PlaybackEngine, PlaybackEvent, PlaybackState};
pub use recording::{RecordingConfig, RecordingEngine, RecordingEvent, RecordingFormat, RecordingState};
