//! Per-format decoders producing mono sample buffers
//!
//! WAV files go through hound, compressed containers through symphonia and
//! headerless recordings are read as little-endian i16. Every decoder keeps
//! only the first channel and reports the quirks it knows it introduced.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::{first_channel, DecodeQuirk, SampleBuffer, Samples, SourceFormat};
use crate::error::{AudioError, Result};

/// Rate assumed for headerless recordings when the caller does not know it
pub const DEFAULT_RAW_SAMPLE_RATE: u32 = 44100;

const COMPRESSED_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "oga", "m4a", "aac", "mp4"];

/// Container family implied by a path's extension
pub fn source_format_for(path: &Path) -> Result<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| AudioError::UnsupportedFormat(path.display().to_string()))?;

    match ext.as_str() {
        "wav" | "wave" => Ok(SourceFormat::Wav),
        "raw" | "pcm" => Ok(SourceFormat::RawPcm),
        e if COMPRESSED_EXTENSIONS.contains(&e) => Ok(SourceFormat::Compressed),
        other => Err(AudioError::UnsupportedFormat(format!(".{}", other))),
    }
}

/// Load any supported file into a mono buffer
pub fn load(path: impl AsRef<Path>) -> Result<SampleBuffer> {
    let path = path.as_ref();
    match source_format_for(path)? {
        SourceFormat::Wav => decode_wav(path),
        SourceFormat::Compressed => decode_compressed(path),
        SourceFormat::RawPcm => load_raw(path, DEFAULT_RAW_SAMPLE_RATE),
        SourceFormat::Memory => Err(AudioError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Decode a WAV container, keeping the first channel
pub fn decode_wav(path: &Path) -> Result<SampleBuffer> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => {
            let data = reader
                .into_samples::<i16>()
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Samples::Int16(first_channel(&data, channels))
        }
        (hound::SampleFormat::Int, bits) if (8..=32).contains(&bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            let data = reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Samples::Float(first_channel(&data, channels))
        }
        (hound::SampleFormat::Float, 32) => {
            let data = reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Samples::Float(first_channel(&data, channels))
        }
        (format, bits) => {
            return Err(AudioError::UnsupportedFormat(format!(
                "{:?} WAV with {} bits per sample",
                format, bits
            )))
        }
    };

    log::debug!(
        "Decoded WAV {}: {} samples, {} Hz, {} channel(s)",
        path.display(),
        samples.len(),
        spec.sample_rate,
        channels
    );

    Ok(SampleBuffer::new(samples, spec.sample_rate)?.with_source(SourceFormat::Wav, BTreeSet::new()))
}

/// Decode a compressed container with symphonia, keeping the first channel
///
/// Reports `DecodeQuirk::DuplicatedLength` when the decoded stream is exactly
/// twice as long as the frame count the container declares.
pub fn decode_compressed(path: &Path) -> Result<SampleBuffer> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(map_symphonia_error)?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("no audio track found".to_string()))?;

    let track_id = track.id;
    let declared_frames = track.codec_params.n_frames;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(map_symphonia_error)?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(map_symphonia_error(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(map_symphonia_error(e)),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();

        let mut interleaved = InterleavedBuffer::<f32>::new(decoded.capacity() as u64, spec);
        interleaved.copy_interleaved_ref(decoded);
        mono.extend(first_channel(interleaved.samples(), channels));
    }

    let quirks = detect_quirks(mono.len(), declared_frames);

    log::info!(
        "Decoded {}: {} samples, {} Hz, {:.1}s",
        path.display(),
        mono.len(),
        sample_rate,
        mono.len() as f32 / sample_rate as f32
    );

    Ok(SampleBuffer::from_f32(mono, sample_rate)?.with_source(SourceFormat::Compressed, quirks))
}

/// Artifacts implied by the decoded length against the container header
///
/// `DuplicatedLength` is reported only for an exact doubling of a known,
/// non-zero frame count.
fn detect_quirks(decoded: usize, declared: Option<u64>) -> BTreeSet<DecodeQuirk> {
    let mut quirks = BTreeSet::new();
    if let Some(frames) = declared {
        if frames > 0 && decoded as u64 == frames.saturating_mul(2) {
            quirks.insert(DecodeQuirk::DuplicatedLength);
        }
    }
    quirks
}

/// Read a headerless little-endian i16 mono stream
pub fn load_raw(path: impl AsRef<Path>, sample_rate: u32) -> Result<SampleBuffer> {
    let bytes = std::fs::read(path.as_ref())?;
    let samples = bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    Ok(SampleBuffer::from_i16(samples, sample_rate)?.with_source(SourceFormat::RawPcm, BTreeSet::new()))
}

fn map_symphonia_error(err: SymphoniaError) -> AudioError {
    match err {
        SymphoniaError::Unsupported(what) => AudioError::UnsupportedFormat(what.to_string()),
        SymphoniaError::IoError(e) => AudioError::Io(e),
        other => AudioError::Decode(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_extension_dispatch() {
        assert_eq!(source_format_for(Path::new("a.WAV")).unwrap(), SourceFormat::Wav);
        assert_eq!(source_format_for(Path::new("a.mp3")).unwrap(), SourceFormat::Compressed);
        assert_eq!(source_format_for(Path::new("records/recorded_1.raw")).unwrap(), SourceFormat::RawPcm);
        assert!(matches!(
            source_format_for(Path::new("notes.txt")),
            Err(AudioError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            source_format_for(Path::new("no_extension")),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_stereo_wav_keeps_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[10, -10, 20, -20, 30, -30]);

        let buffer = load(&path).unwrap();
        assert_eq!(buffer.samples(), &Samples::Int16(vec![10, 20, 30]));
        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.source(), SourceFormat::Wav);
        assert!(buffer.quirks().is_empty());
    }

    #[test]
    fn test_duplicated_length_needs_exact_double() {
        assert!(detect_quirks(2000, Some(1000)).contains(&DecodeQuirk::DuplicatedLength));

        assert!(detect_quirks(1999, Some(1000)).is_empty());
        assert!(detect_quirks(2001, Some(1000)).is_empty());
        assert!(detect_quirks(1000, Some(1000)).is_empty());
        assert!(detect_quirks(2000, None).is_empty());
        assert!(detect_quirks(0, Some(0)).is_empty());
    }

    #[test]
    fn test_symphonia_decode_keeps_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let left = [0i16, 8192, -8192, 16384, -16384];
        let frames: Vec<i16> = left.iter().flat_map(|&l| [l, 1000]).collect();
        write_wav(&path, 2, &frames);

        let buffer = decode_compressed(&path).unwrap();

        assert_eq!(buffer.source(), SourceFormat::Compressed);
        assert_eq!(buffer.sample_rate(), 44100);
        assert!(buffer.quirks().is_empty());
        assert!(matches!(buffer.samples(), Samples::Float(_)));

        let decoded = buffer.samples().to_f64();
        assert_eq!(decoded.len(), left.len());
        for (got, &want) in decoded.iter().zip(left.iter()) {
            assert!((got * 32768.0 - want as f64).abs() < 1.0, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_raw_pcm_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.raw");
        let bytes: Vec<u8> = [1i16, -2, 300].iter().flat_map(|s| s.to_le_bytes()).collect();
        std::fs::write(&path, bytes).unwrap();

        let buffer = load_raw(&path, 16000).unwrap();
        assert_eq!(buffer.samples(), &Samples::Int16(vec![1, -2, 300]));
        assert_eq!(buffer.sample_rate(), 16000);
        assert_eq!(buffer.source(), SourceFormat::RawPcm);
    }
}
