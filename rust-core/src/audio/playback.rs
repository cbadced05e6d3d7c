//! Playback transport
//!
//! Streams a buffer to an output sink in fixed-size chunks on its own
//! thread. Pause, resume and seek are plain atomics read by the loop once
//! per chunk, and notifications travel back over a channel the UI drains
//! on its own schedule.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::output::{AudioSink, CpalSink};
use crate::error::{AudioError, Result};
use crate::signal::SampleBuffer;

/// Transport state of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Finished,
}

impl PlaybackState {
    fn as_u8(self) -> u8 {
        match self {
            PlaybackState::Idle => 0,
            PlaybackState::Playing => 1,
            PlaybackState::Paused => 2,
            PlaybackState::Finished => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Paused,
            3 => PlaybackState::Finished,
            _ => PlaybackState::Idle,
        }
    }
}

/// Notifications emitted by the streaming loop
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Paused,
    Resumed,
    Finished,
    /// Cursor position in seconds after a chunk was queued
    Position(f64),
}

/// Playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Samples handed to the sink per iteration
    pub chunk_size: usize,

    /// How often a paused loop checks whether it was resumed
    pub poll_interval: Duration,
}

impl PlaybackConfig {
    /// Reject settings the streaming loop cannot make progress with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(AudioError::InvalidConfig(
                "playback chunk size must be at least one sample".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// State shared between the engine and its streaming thread
struct Transport {
    paused: AtomicBool,
    shutdown: AtomicBool,
    cursor: AtomicUsize,
    state: AtomicU8,
}

impl Transport {
    fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            cursor: AtomicUsize::new(0),
            state: AtomicU8::new(PlaybackState::Idle.as_u8()),
        }
    }

    fn set_state(&self, state: PlaybackState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// Loaded buffer as the streaming thread sees it
struct Track {
    samples: Arc<Vec<i16>>,
    sample_rate: u32,
}

/// Chunked playback with pause, resume, seek and reset
pub struct PlaybackEngine {
    config: PlaybackConfig,
    transport: Arc<Transport>,
    track: Option<Track>,
    thread: Option<JoinHandle<()>>,
    event_tx: Sender<PlaybackEvent>,
    event_rx: Receiver<PlaybackEvent>,
}

impl PlaybackEngine {
    pub fn new(config: PlaybackConfig) -> Self {
        let (event_tx, event_rx) = unbounded();

        Self {
            config,
            transport: Arc::new(Transport::new()),
            track: None,
            thread: None,
            event_tx,
            event_rx,
        }
    }

    /// Make `buffer` the active track without starting playback
    ///
    /// Ends any running session. The cursor returns to 0 and the state to
    /// `Idle`.
    pub fn load(&mut self, buffer: &SampleBuffer) {
        self.close();

        self.track = Some(Track {
            samples: Arc::new(buffer.to_i16()),
            sample_rate: buffer.sample_rate(),
        });
        self.transport.cursor.store(0, Ordering::SeqCst);
        self.transport.set_state(PlaybackState::Idle);
    }

    /// Play `buffer` on the default output device
    ///
    /// Returns once the stream is open; a device that cannot be opened is
    /// reported here and nothing is left running.
    pub fn start(&mut self, buffer: &SampleBuffer) -> Result<()> {
        self.config.validate()?;
        let sample_rate = buffer.sample_rate();
        let chunk_size = self.config.chunk_size;

        self.start_with(buffer, move || {
            let sink = CpalSink::open_default(sample_rate, chunk_size)?;
            Ok(Box::new(sink) as Box<dyn AudioSink>)
        })
    }

    /// Play `buffer` on the sink returned by `open_sink`
    ///
    /// `open_sink` runs on the streaming thread, which owns the sink for the
    /// rest of the session.
    pub fn start_with<F>(&mut self, buffer: &SampleBuffer, open_sink: F) -> Result<()>
    where
        F: FnOnce() -> Result<Box<dyn AudioSink>> + Send + 'static,
    {
        self.config.validate()?;
        self.load(buffer);

        let (samples, sample_rate) = match self.track.as_ref() {
            Some(track) => (Arc::clone(&track.samples), track.sample_rate),
            None => return Err(AudioError::EmptySignal),
        };

        let transport = Arc::clone(&self.transport);
        let events = self.event_tx.clone();
        let config = self.config.clone();
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        let handle = thread::Builder::new()
            .name("playback".to_string())
            .spawn(move || {
                let mut sink = match open_sink() {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                transport.set_state(PlaybackState::Playing);
                let _ = ready_tx.send(Ok(()));

                stream_chunks(sink.as_mut(), &samples, sample_rate, &transport, &events, &config);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::debug!("Playback started: {} samples at {} Hz", buffer.len(), sample_rate);
                self.thread = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::StreamOpenFailure(
                    "playback thread exited before opening the stream".to_string(),
                ))
            }
        }
    }

    /// Ask the streaming loop to hold its position
    pub fn pause(&self) {
        self.transport.paused.store(true, Ordering::SeqCst);
    }

    /// Let a paused loop continue from the cursor
    pub fn resume(&self) {
        self.transport.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.transport.paused.load(Ordering::SeqCst)
    }

    fn seconds_to_samples(&self, seconds: f64) -> usize {
        match self.track.as_ref() {
            Some(track) => (seconds.max(0.0) * track.sample_rate as f64) as usize,
            None => 0,
        }
    }

    fn track_len(&self) -> usize {
        self.track.as_ref().map_or(0, |t| t.samples.len())
    }

    /// Move the cursor back, stopping at the start
    pub fn seek_backward(&self, seconds: f64) {
        let delta = self.seconds_to_samples(seconds);
        let _ = self
            .transport
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some(c.saturating_sub(delta)));
    }

    /// Move the cursor forward, stopping at the end; no-op without a track
    pub fn seek_forward(&self, seconds: f64) {
        if self.track.is_none() {
            return;
        }

        let delta = self.seconds_to_samples(seconds);
        let len = self.track_len();
        let _ = self
            .transport
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some(c.saturating_add(delta).min(len)));
    }

    /// Place the cursor at a sample index, clamped to the track length
    pub fn set_cursor(&self, sample: usize) {
        self.transport
            .cursor
            .store(sample.min(self.track_len()), Ordering::SeqCst);
    }

    /// Rewind to the start without touching play/pause state
    pub fn reset(&self) {
        self.transport.cursor.store(0, Ordering::SeqCst);
    }

    /// Current read position as a sample index
    pub fn cursor(&self) -> usize {
        self.transport.cursor.load(Ordering::SeqCst)
    }

    /// Current read position in seconds
    pub fn position_secs(&self) -> f64 {
        match self.track.as_ref() {
            Some(track) => self.cursor() as f64 / track.sample_rate as f64,
            None => 0.0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.transport.state()
    }

    /// Receiver for transport notifications
    pub fn events(&self) -> Receiver<PlaybackEvent> {
        self.event_rx.clone()
    }

    /// Tear the session down and release the output stream
    ///
    /// The cursor and loaded track are kept; no `Finished` is emitted.
    pub fn close(&mut self) {
        if let Some(handle) = self.thread.take() {
            self.transport.shutdown.store(true, Ordering::SeqCst);
            if handle.join().is_err() {
                log::error!("Playback thread panicked");
            }
        }

        self.transport.shutdown.store(false, Ordering::SeqCst);
        self.transport.paused.store(false, Ordering::SeqCst);
        if self.transport.state() != PlaybackState::Finished {
            self.transport.set_state(PlaybackState::Idle);
        }
    }
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.close();
    }
}

/// Streaming loop run on the playback thread
fn stream_chunks(
    sink: &mut dyn AudioSink,
    samples: &[i16],
    sample_rate: u32,
    transport: &Transport,
    events: &Sender<PlaybackEvent>,
    config: &PlaybackConfig,
) {
    let len = samples.len();

    loop {
        if transport.shutdown.load(Ordering::SeqCst) {
            return;
        }

        if transport.paused.load(Ordering::SeqCst) {
            transport.set_state(PlaybackState::Paused);
            let _ = events.send(PlaybackEvent::Paused);

            while transport.paused.load(Ordering::SeqCst) {
                if transport.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                thread::sleep(config.poll_interval);
            }

            transport.set_state(PlaybackState::Playing);
            let _ = events.send(PlaybackEvent::Resumed);
            continue;
        }

        let cursor = transport.cursor.load(Ordering::SeqCst);
        if cursor >= len {
            break;
        }

        let end = (cursor + config.chunk_size).min(len);
        if let Err(e) = sink.write_chunk(&samples[cursor..end]) {
            log::error!("Playback stream failed: {}", e);
            transport.set_state(PlaybackState::Idle);
            return;
        }

        // A seek issued while the chunk was being written takes precedence
        let _ = transport
            .cursor
            .compare_exchange(cursor, end, Ordering::SeqCst, Ordering::SeqCst);

        let position = transport.cursor.load(Ordering::SeqCst) as f64 / sample_rate as f64;
        let _ = events.send(PlaybackEvent::Position(position));
    }

    if let Err(e) = sink.drain() {
        log::warn!("Failed to flush playback stream: {}", e);
    }

    transport.set_state(PlaybackState::Finished);
    let _ = events.send(PlaybackEvent::Finished);
    log::debug!("Playback finished");
}
