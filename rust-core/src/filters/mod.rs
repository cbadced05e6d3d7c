//! Frequency-domain filtering of whole buffers

pub mod spec;
pub mod spectral;

pub use spec::FilterSpec;
pub use spectral::{FilterReport, SpectralFilter, SpectrumPair};
