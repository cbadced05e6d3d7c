//! Sample buffers, decoding and persistence

pub mod buffer;
pub mod decode;
pub mod persist;

pub use buffer::{first_channel, DecodeQuirk, SampleBuffer, Samples, SourceFormat};
pub use decode::{load, load_raw};
pub use persist::write_wav;
