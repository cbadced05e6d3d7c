//! Mono PCM sample buffer
//!
//! Holds one channel of audio plus its sample rate and remembers which
//! decoder produced it, so format-specific corrections can be applied later.

use std::collections::BTreeSet;

use crate::error::{AudioError, Result};

/// Raw sample storage, kept in the format the source delivered it in
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Signed 16-bit integer PCM
    Int16(Vec<i16>),

    /// Floating point samples, nominally in [-1.0, 1.0]
    Float(Vec<f32>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Int16(s) => s.len(),
            Samples::Float(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples widened to f64 without rescaling
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Samples::Int16(s) => s.iter().map(|&x| x as f64).collect(),
            Samples::Float(s) => s.iter().map(|&x| x as f64).collect(),
        }
    }

    /// Samples as 16-bit PCM, float input is clipped to [-1, 1] first
    pub fn to_i16(&self) -> Vec<i16> {
        match self {
            Samples::Int16(s) => s.clone(),
            Samples::Float(s) => s
                .iter()
                .map(|&x| (x.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .collect(),
        }
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f64 {
        match self {
            Samples::Int16(s) => s.iter().map(|&x| (x as f64).abs()).fold(0.0, f64::max),
            Samples::Float(s) => s.iter().map(|&x| (x as f64).abs()).fold(0.0, f64::max),
        }
    }

    fn truncate(&mut self, len: usize) {
        match self {
            Samples::Int16(s) => s.truncate(len),
            Samples::Float(s) => s.truncate(len),
        }
    }
}

/// Container family a buffer was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Uncompressed WAV container
    Wav,
    /// Compressed container (mp3, flac, ogg, aac) decoded by symphonia
    Compressed,
    /// Headerless little-endian i16 stream, as written by recording sessions
    RawPcm,
    /// Built in memory (capture, tests, filter output)
    Memory,
}

/// Known artifacts a decoder left in the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecodeQuirk {
    /// Decoded stream is twice the container's declared length; only the
    /// first half carries the signal
    DuplicatedLength,
}

/// In-memory mono signal with sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Samples,
    sample_rate: u32,
    source: SourceFormat,
    quirks: BTreeSet<DecodeQuirk>,
}

impl SampleBuffer {
    /// Create buffer from samples and rate
    ///
    /// Fails if `sample_rate` is zero.
    pub fn new(samples: Samples, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AudioError::UnsupportedFormat(
                "sample rate must be positive".to_string(),
            ));
        }

        Ok(Self {
            samples,
            sample_rate,
            source: SourceFormat::Memory,
            quirks: BTreeSet::new(),
        })
    }

    pub fn from_i16(samples: Vec<i16>, sample_rate: u32) -> Result<Self> {
        Self::new(Samples::Int16(samples), sample_rate)
    }

    pub fn from_f32(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(Samples::Float(samples), sample_rate)
    }

    /// Tag the buffer with the decoder that produced it
    pub fn with_source(mut self, source: SourceFormat, quirks: BTreeSet<DecodeQuirk>) -> Self {
        self.source = source;
        self.quirks = quirks;
        self
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn source(&self) -> SourceFormat {
        self.source
    }

    pub fn quirks(&self) -> &BTreeSet<DecodeQuirk> {
        &self.quirks
    }

    pub fn has_quirk(&self, quirk: DecodeQuirk) -> bool {
        self.quirks.contains(&quirk)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Samples scaled into [-1.0, 1.0] by the buffer's peak magnitude
    ///
    /// Returns `EmptySignal` for an empty or all-zero buffer.
    pub fn normalized(&self) -> Result<Vec<f64>> {
        let peak = self.samples.peak();
        if self.is_empty() || peak == 0.0 {
            return Err(AudioError::EmptySignal);
        }

        Ok(self.samples.to_f64().into_iter().map(|x| x / peak).collect())
    }

    /// Time in seconds for every sample, evenly spaced from 0 to the duration
    pub fn time_axis(&self) -> Vec<f64> {
        let n = self.len();
        match n {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => {
                let step = self.duration_secs() / (n - 1) as f64;
                (0..n).map(|i| i as f64 * step).collect()
            }
        }
    }

    /// Copy keeping only the first `len` samples
    pub fn truncated(&self, len: usize) -> Self {
        let mut out = self.clone();
        out.samples.truncate(len);
        out
    }

    /// Samples as 16-bit PCM for playback or persistence
    pub fn to_i16(&self) -> Vec<i16> {
        self.samples.to_i16()
    }
}

/// Keep the first channel of an interleaved frame sequence
pub fn first_channel<T: Copy>(interleaved: &[T], channels: usize) -> Vec<T> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved.iter().step_by(channels).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_rejected() {
        assert!(matches!(
            SampleBuffer::from_i16(vec![1, 2, 3], 0),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_normalize_range() {
        let buffer = SampleBuffer::from_i16(vec![100, -400, 200, 0], 8000).unwrap();
        let norm = buffer.normalized().unwrap();

        assert_eq!(norm, vec![0.25, -1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_normalize_all_zero_is_empty_signal() {
        let buffer = SampleBuffer::from_i16(vec![0; 512], 44100).unwrap();
        assert!(matches!(buffer.normalized(), Err(AudioError::EmptySignal)));

        let empty = SampleBuffer::from_f32(Vec::new(), 44100).unwrap();
        assert!(matches!(empty.normalized(), Err(AudioError::EmptySignal)));
    }

    #[test]
    fn test_first_channel_of_stereo() {
        let interleaved = vec![1, -1, 2, -2, 3, -3];
        assert_eq!(first_channel(&interleaved, 2), vec![1, 2, 3]);
        assert_eq!(first_channel(&interleaved, 1), interleaved);
    }

    #[test]
    fn test_float_to_i16_clips() {
        let buffer = SampleBuffer::from_f32(vec![0.0, 1.0, -1.0, 2.0], 8000).unwrap();
        assert_eq!(buffer.to_i16(), vec![0, 32767, -32767, 32767]);
    }

    #[test]
    fn test_time_axis_spans_duration() {
        let buffer = SampleBuffer::from_i16(vec![1; 44100], 44100).unwrap();
        let t = buffer.time_axis();

        assert_eq!(t.len(), 44100);
        assert_eq!(t[0], 0.0);
        assert!((t[44099] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncated_keeps_metadata() {
        let mut quirks = BTreeSet::new();
        quirks.insert(DecodeQuirk::DuplicatedLength);
        let buffer = SampleBuffer::from_f32(vec![0.5; 10], 22050)
            .unwrap()
            .with_source(SourceFormat::Compressed, quirks);

        let half = buffer.truncated(5);
        assert_eq!(half.len(), 5);
        assert_eq!(half.sample_rate(), 22050);
        assert!(half.has_quirk(DecodeQuirk::DuplicatedLength));
    }
}
