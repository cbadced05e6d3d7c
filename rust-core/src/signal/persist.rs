//! Writing sample buffers to disk

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::buffer::SampleBuffer;
use crate::error::Result;

/// Write a buffer as mono 16-bit WAV
///
/// A failed write removes whatever was created at `path`.
pub fn write_wav(path: impl AsRef<Path>, buffer: &SampleBuffer) -> Result<()> {
    let path = path.as_ref();
    let result = write_wav_inner(path, buffer);
    if result.is_err() {
        let _ = std::fs::remove_file(path);
    }
    result
}

fn write_wav_inner(path: &Path, buffer: &SampleBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in buffer.to_i16() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write headerless little-endian i16 samples into an already created file
pub fn write_raw(file: File, samples: &[i16]) -> Result<()> {
    let mut out = BufWriter::new(file);
    for sample in samples {
        out.write_all(&sample.to_le_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Write mono 16-bit WAV into an already created file
pub fn write_wav_file(file: File, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::new(BufWriter::new(file), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
