//! Audio output playback using cpal
//!
//! The playback loop hands 16-bit mono chunks to an `AudioSink`. The cpal
//! sink converts them to the device's layout and queues them on a ring
//! buffer drained by the output callback.

use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use rubato::{FftFixedIn, Resampler};

use super::buffer::{AudioConsumer, AudioProducer, AudioRingBuffer};
use super::device::{default_output_device, select_stream_config};
use crate::error::{AudioError, Result};

/// How long a full ring may refuse data before the stream counts as dead
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Destination for streamed playback chunks
pub trait AudioSink {
    /// Queue one mono chunk, blocking while the device catches up
    fn write_chunk(&mut self, chunk: &[i16]) -> Result<()>;

    /// Block until everything queued has been handed to the device
    fn drain(&mut self) -> Result<()>;
}

/// Fixed-chunk rate converter for devices that reject the file's rate
struct ChunkResampler {
    inner: FftFixedIn<f64>,
    chunk_size: usize,
    input: Vec<Vec<f64>>,
}

impl ChunkResampler {
    fn new(from_rate: u32, to_rate: u32, chunk_size: usize) -> Result<Self> {
        let inner = FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, chunk_size, 2, 1)
            .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))?;

        Ok(Self {
            inner,
            chunk_size,
            input: vec![Vec::with_capacity(chunk_size)],
        })
    }

    /// Resample one chunk, zero padding a short final chunk
    fn process(&mut self, mono: &[f32]) -> Result<Vec<f32>> {
        let mut out = Vec::new();
        for block in mono.chunks(self.chunk_size) {
            let input = &mut self.input[0];
            input.clear();
            input.extend(block.iter().map(|&s| s as f64));
            input.resize(self.chunk_size, 0.0);

            let resampled = self
                .inner
                .process(&self.input, None)
                .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))?;
            out.extend(resampled[0].iter().map(|&s| s as f32));
        }
        Ok(out)
    }
}

/// Output stream on a cpal device
pub struct CpalSink {
    stream: Stream,
    producer: AudioProducer<f32>,
    channels: usize,
    resampler: Option<ChunkResampler>,
    device_name: String,
}

impl CpalSink {
    /// Open the default output device for mono audio at `sample_rate`
    pub fn open_default(sample_rate: u32, chunk_size: usize) -> Result<Self> {
        Self::open(default_output_device()?, sample_rate, chunk_size)
    }

    /// Open `device` for mono audio at `sample_rate`
    ///
    /// Uses a native configuration when the device supports the rate,
    /// otherwise the device default with resampling.
    pub fn open(device: Device, sample_rate: u32, chunk_size: usize) -> Result<Self> {
        let device_name = device
            .name()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        let ranges = device
            .supported_output_configs()
            .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))?;

        let (config, resampler) = match select_stream_config(ranges, sample_rate, 1) {
            Some(config) => (config, None),
            None => {
                let config = device
                    .default_output_config()
                    .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))?;
                log::warn!(
                    "{} cannot play {} Hz, resampling to {} Hz",
                    device_name,
                    sample_rate,
                    config.sample_rate().0
                );
                let resampler = ChunkResampler::new(sample_rate, config.sample_rate().0, chunk_size)?;
                (config, Some(resampler))
            }
        };

        let channels = config.channels() as usize;
        let sample_format = config.sample_format();
        let stream_config: StreamConfig = config.into();

        // Half a second of device audio
        let capacity = (stream_config.sample_rate.0 as usize / 2).max(chunk_size) * channels;
        let (producer, consumer) = AudioRingBuffer::<f32>::new(capacity).split();

        let stream = match sample_format {
            SampleFormat::F32 => build_output::<f32>(&device, &stream_config, consumer, channels),
            SampleFormat::I16 => build_output::<i16>(&device, &stream_config, consumer, channels),
            SampleFormat::U16 => build_output::<u16>(&device, &stream_config, consumer, channels),
            other => Err(AudioError::StreamOpenFailure(format!(
                "unsupported output sample format {:?}",
                other
            ))),
        }?;

        stream
            .play()
            .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))?;

        log::info!(
            "Opened output {} at {} Hz, {} channel(s)",
            device_name,
            stream_config.sample_rate.0,
            channels
        );

        Ok(Self {
            stream,
            producer,
            channels,
            resampler,
            device_name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl AudioSink for CpalSink {
    fn write_chunk(&mut self, chunk: &[i16]) -> Result<()> {
        let mono: Vec<f32> = chunk.iter().map(|&s| s as f32 / 32768.0).collect();
        let mono = match self.resampler.as_mut() {
            Some(resampler) => resampler.process(&mono)?,
            None => mono,
        };

        let frames: Vec<f32> = mono
            .iter()
            .flat_map(|&s| std::iter::repeat(s).take(self.channels))
            .collect();

        let mut offset = 0;
        let mut last_progress = Instant::now();
        while offset < frames.len() {
            let n = self.producer.write(&frames[offset..]);
            offset += n;
            if n > 0 {
                last_progress = Instant::now();
            } else if last_progress.elapsed() > STALL_TIMEOUT {
                return Err(AudioError::DeviceUnavailable(format!(
                    "{} stopped consuming audio",
                    self.device_name
                )));
            } else {
                thread::sleep(Duration::from_millis(1));
            }
        }

        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        let started = Instant::now();
        while !self.producer.is_drained() {
            if started.elapsed() > STALL_TIMEOUT {
                log::warn!("{} did not drain before close", self.device_name);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        self.stream
            .pause()
            .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))
    }
}

fn build_output<T>(
    device: &Device,
    config: &StreamConfig,
    mut consumer: AudioConsumer<f32>,
    channels: usize,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Whole frames only, so channels never shift
                let available = consumer.len() / channels * channels;
                let wanted = available.min(data.len());
                scratch.resize(wanted, 0.0);
                let read = consumer.read(&mut scratch[..wanted]);

                for (i, out) in data.iter_mut().enumerate() {
                    let sample = if i < read { scratch[i] } else { 0.0 };
                    *out = T::from_sample_(sample);
                }
            },
            move |err| {
                log::error!("Audio output error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampler_output_length() {
        let mut resampler = ChunkResampler::new(44100, 48000, 1024).unwrap();

        // Two full chunks plus a short tail padded to a third chunk
        let out = resampler.process(&vec![0.25; 1024 * 2 + 100]).unwrap();
        let expected = 3.0 * 1024.0 * 48000.0 / 44100.0;

        assert!((out.len() as f64 - expected).abs() < 200.0, "{}", out.len());
    }
}
