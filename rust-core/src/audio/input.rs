//! Audio input capture using cpal
//!
//! Captured frames are reduced to their first channel, converted to i16 and
//! queued on a ring buffer. The recorder pulls fixed-size chunks from it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};

use super::buffer::{AudioConsumer, AudioProducer, AudioRingBuffer};
use super::device::select_stream_config;
use crate::error::{AudioError, Result};

/// How long a chunk read may wait before the device counts as gone
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Source of captured mono audio
pub trait AudioSource {
    /// Block until `frames` samples are available and return them
    fn read_chunk(&mut self, frames: usize) -> Result<Vec<i16>>;

    /// Stop capturing and release the device
    fn close(&mut self);
}

/// Audio input stream
pub struct CpalSource {
    stream: Option<Stream>,
    consumer: AudioConsumer<i16>,
    dropped: Arc<AtomicUsize>,
    device_name: String,
}

impl CpalSource {
    /// Open `device` for mono capture at `sample_rate`
    ///
    /// # Arguments
    /// * `ring_capacity` - Samples buffered between the callback and readers;
    ///   anything beyond it is dropped rather than reported
    pub fn open(device: Device, sample_rate: u32, ring_capacity: usize) -> Result<Self> {
        let device_name = device
            .name()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        let ranges = device
            .supported_input_configs()
            .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))?;

        let config = select_stream_config(ranges, sample_rate, 1).ok_or_else(|| {
            AudioError::StreamOpenFailure(format!(
                "{} cannot capture at {} Hz",
                device_name, sample_rate
            ))
        })?;

        let channels = config.channels() as usize;
        let sample_format = config.sample_format();
        let stream_config: StreamConfig = config.into();

        let (producer, consumer) = AudioRingBuffer::<i16>::new(ring_capacity).split();
        let dropped = Arc::new(AtomicUsize::new(0));

        let stream = match sample_format {
            SampleFormat::F32 => build_input::<f32>(&device, &stream_config, producer, channels, &dropped),
            SampleFormat::I16 => build_input::<i16>(&device, &stream_config, producer, channels, &dropped),
            SampleFormat::U16 => build_input::<u16>(&device, &stream_config, producer, channels, &dropped),
            other => Err(AudioError::StreamOpenFailure(format!(
                "unsupported input sample format {:?}",
                other
            ))),
        }?;

        stream
            .play()
            .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))?;

        log::info!(
            "Capturing from {} at {} Hz ({} channel(s), keeping the first)",
            device_name,
            sample_rate,
            channels
        );

        Ok(Self {
            stream: Some(stream),
            consumer,
            dropped,
            device_name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Samples lost to ring overflow so far
    pub fn dropped_samples(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AudioSource for CpalSource {
    fn read_chunk(&mut self, frames: usize) -> Result<Vec<i16>> {
        let started = Instant::now();
        while self.consumer.len() < frames {
            if self.stream.is_none() {
                return Err(AudioError::DeviceUnavailable(format!("{} is closed", self.device_name)));
            }
            if started.elapsed() > STALL_TIMEOUT {
                return Err(AudioError::DeviceUnavailable(format!(
                    "{} stopped delivering audio",
                    self.device_name
                )));
            }
            thread::sleep(Duration::from_millis(1));
        }

        let mut chunk = vec![0; frames];
        let read = self.consumer.read(&mut chunk);
        chunk.truncate(read);
        Ok(chunk)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
            let dropped = self.dropped_samples();
            if dropped > 0 {
                log::debug!("{} overflowed, {} samples dropped", self.device_name, dropped);
            }
        }
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_input<T>(
    device: &Device,
    config: &StreamConfig,
    mut producer: AudioProducer<i16>,
    channels: usize,
    dropped: &Arc<AtomicUsize>,
) -> Result<Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let dropped = Arc::clone(dropped);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono: Vec<i16> = data
                    .iter()
                    .step_by(channels)
                    .map(|&s| i16::from_sample_(s))
                    .collect();

                let written = producer.write(&mono);
                if written < mono.len() {
                    dropped.fetch_add(mono.len() - written, Ordering::Relaxed);
                }
            },
            move |err| {
                log::error!("Audio input error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailure(e.to_string()))
}
