//! Microphone capture sessions
//!
//! A session accumulates fixed-size chunks pulled from an `AudioSource` and
//! persists them as one file when it stops.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::device::{device_by_index, AudioDeviceInfo};
use super::input::{AudioSource, CpalSource};
use crate::error::{AudioError, Result};
use crate::signal::persist::{write_raw, write_wav_file};
use crate::signal::SampleBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

/// On-disk layout of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingFormat {
    /// Headerless little-endian i16
    Raw,
    /// Mono 16-bit WAV
    Wav,
}

impl RecordingFormat {
    fn extension(self) -> &'static str {
        match self {
            RecordingFormat::Raw => "raw",
            RecordingFormat::Wav => "wav",
        }
    }
}

/// Notifications emitted while recording
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingEvent {
    ChunkCaptured(Vec<i16>),
    Finished(PathBuf),
}

/// Recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    pub sample_rate: u32,

    /// Samples returned by each `capture_chunk`
    pub chunk_size: usize,

    /// Directory receiving `recorded_{n}` files, created on demand
    pub output_dir: PathBuf,

    pub format: RecordingFormat,

    /// Samples buffered between the device callback and `capture_chunk`
    pub ring_capacity: usize,
}

impl RecordingConfig {
    /// Reject settings a capture session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidConfig("recording sample rate must be positive".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(AudioError::InvalidConfig(
                "recording chunk size must be at least one sample".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            chunk_size: 1024,
            output_dir: PathBuf::from("records"),
            format: RecordingFormat::Raw,
            ring_capacity: 44100,
        }
    }
}

/// Create the next free `recorded_{n}.{ext}` in `dir`
///
/// Numbering starts after the number of entries already in the directory
/// and moves past any name that is taken.
fn create_session_file(dir: &Path, extension: &str) -> Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;

    let mut index = fs::read_dir(dir)?.count() + 1;
    loop {
        let path = dir.join(format!("recorded_{}.{}", index, extension));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => index += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Capture state machine: `Idle -> Recording -> Idle`
pub struct RecordingEngine {
    config: RecordingConfig,
    state: RecordingState,
    source: Option<Box<dyn AudioSource>>,
    chunks: Vec<Vec<i16>>,
    event_tx: Sender<RecordingEvent>,
    event_rx: Receiver<RecordingEvent>,
}

impl RecordingEngine {
    pub fn new(config: RecordingConfig) -> Self {
        let (event_tx, event_rx) = unbounded();

        Self {
            config,
            state: RecordingState::Idle,
            source: None,
            chunks: Vec::new(),
            event_tx,
            event_rx,
        }
    }

    /// Start capturing from `device`
    ///
    /// `None` leaves the engine idle without opening anything.
    pub fn start(&mut self, device: Option<&AudioDeviceInfo>) -> Result<()> {
        let Some(info) = device else {
            log::debug!("No input device selected, recording not started");
            return Ok(());
        };

        self.config.validate()?;
        let device = device_by_index(info.index)?;
        let source = CpalSource::open(device, self.config.sample_rate, self.config.ring_capacity)?;
        self.start_with_source(Box::new(source))
    }

    /// Start capturing from an already opened source
    ///
    /// An invalid configuration closes `source` and leaves the engine idle.
    pub fn start_with_source(&mut self, mut source: Box<dyn AudioSource>) -> Result<()> {
        if let Err(e) = self.config.validate() {
            source.close();
            return Err(e);
        }

        if let Some(mut previous) = self.source.take() {
            previous.close();
        }

        self.chunks.clear();
        self.source = Some(source);
        self.state = RecordingState::Recording;
        log::info!("Recording started at {} Hz", self.config.sample_rate);
        Ok(())
    }

    /// Read one chunk and append it to the session
    ///
    /// Returns `None` when not recording.
    pub fn capture_chunk(&mut self) -> Result<Option<Vec<i16>>> {
        if self.state != RecordingState::Recording {
            return Ok(None);
        }

        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        let chunk = source.read_chunk(self.config.chunk_size)?;
        self.chunks.push(chunk.clone());
        let _ = self.event_tx.send(RecordingEvent::ChunkCaptured(chunk.clone()));
        Ok(Some(chunk))
    }

    /// End the session and write everything captured to a new file
    ///
    /// Returns the written path, or `None` if no session was running.
    pub fn stop(&mut self) -> Result<Option<PathBuf>> {
        if self.state != RecordingState::Recording {
            return Ok(None);
        }

        if let Some(mut source) = self.source.take() {
            source.close();
        }
        self.state = RecordingState::Idle;

        let samples: Vec<i16> = self.chunks.concat();
        let (path, file) = create_session_file(&self.config.output_dir, self.config.format.extension())?;

        let written = match self.config.format {
            RecordingFormat::Raw => write_raw(file, &samples),
            RecordingFormat::Wav => write_wav_file(file, &samples, self.config.sample_rate),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        log::info!(
            "Saved {} samples ({} chunks) to {}",
            samples.len(),
            self.chunks.len(),
            path.display()
        );
        let _ = self.event_tx.send(RecordingEvent::Finished(path.clone()));
        Ok(Some(path))
    }

    /// Release the input device regardless of state
    ///
    /// Captured chunks are discarded without being written.
    pub fn close(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        self.state = RecordingState::Idle;
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    /// Receiver for capture notifications
    pub fn events(&self) -> Receiver<RecordingEvent> {
        self.event_rx.clone()
    }

    /// Everything captured in the current or last session
    pub fn captured(&self) -> Result<SampleBuffer> {
        SampleBuffer::from_i16(self.chunks.concat(), self.config.sample_rate)
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new(RecordingConfig::default())
    }
}

impl Drop for RecordingEngine {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Source producing a counting sequence
    struct MockSource {
        next: i16,
        closed: Arc<AtomicBool>,
    }

    impl AudioSource for MockSource {
        fn read_chunk(&mut self, frames: usize) -> Result<Vec<i16>> {
            let chunk = (0..frames)
                .map(|_| {
                    self.next = self.next.wrapping_add(1);
                    self.next
                })
                .collect();
            Ok(chunk)
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn mock() -> (Box<dyn AudioSource>, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let source = MockSource {
            next: 0,
            closed: Arc::clone(&closed),
        };
        (Box::new(source), closed)
    }

    fn engine_in(dir: &Path, format: RecordingFormat) -> RecordingEngine {
        RecordingEngine::new(RecordingConfig {
            chunk_size: 4,
            output_dir: dir.join("records"),
            format,
            ..RecordingConfig::default()
        })
    }

    #[test]
    fn test_start_without_device_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), RecordingFormat::Raw);

        engine.start(None).unwrap();

        assert_eq!(engine.state(), RecordingState::Idle);
        assert_eq!(engine.capture_chunk().unwrap(), None);
        assert_eq!(engine.stop().unwrap(), None);
        assert!(!dir.path().join("records").exists());
    }

    #[test]
    fn test_capture_and_stop_writes_raw() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), RecordingFormat::Raw);
        let events = engine.events();
        let (source, closed) = mock();

        engine.start_with_source(source).unwrap();
        assert_eq!(engine.state(), RecordingState::Recording);

        assert_eq!(engine.capture_chunk().unwrap(), Some(vec![1, 2, 3, 4]));
        assert_eq!(engine.capture_chunk().unwrap(), Some(vec![5, 6, 7, 8]));

        let path = engine.stop().unwrap().unwrap();
        assert_eq!(path, dir.path().join("records").join("recorded_1.raw"));
        assert_eq!(engine.state(), RecordingState::Idle);
        assert!(closed.load(Ordering::SeqCst));

        let expected: Vec<u8> = (1..=8i16).flat_map(|s| s.to_le_bytes()).collect();
        assert_eq!(fs::read(&path).unwrap(), expected);

        let seen: Vec<RecordingEvent> = events.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                RecordingEvent::ChunkCaptured(vec![1, 2, 3, 4]),
                RecordingEvent::ChunkCaptured(vec![5, 6, 7, 8]),
                RecordingEvent::Finished(path),
            ]
        );
    }

    #[test]
    fn test_sessions_number_sequentially() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), RecordingFormat::Raw);

        let (source, _) = mock();
        engine.start_with_source(source).unwrap();
        engine.capture_chunk().unwrap();
        let first = engine.stop().unwrap().unwrap();

        // A new session starts from an empty accumulator
        let (source, _) = mock();
        engine.start_with_source(source).unwrap();
        engine.capture_chunk().unwrap();
        let second = engine.stop().unwrap().unwrap();

        assert!(first.ends_with("recorded_1.raw"));
        assert!(second.ends_with("recorded_2.raw"));
        assert_eq!(fs::read(&second).unwrap().len(), 8);
    }

    #[test]
    fn test_existing_file_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let records = dir.path().join("records");
        fs::create_dir_all(&records).unwrap();
        fs::write(records.join("recorded_2.raw"), b"keep").unwrap();

        let mut engine = engine_in(dir.path(), RecordingFormat::Raw);
        let (source, _) = mock();
        engine.start_with_source(source).unwrap();
        engine.capture_chunk().unwrap();
        let path = engine.stop().unwrap().unwrap();

        assert!(path.ends_with("recorded_3.raw"));
        assert_eq!(fs::read(records.join("recorded_2.raw")).unwrap(), b"keep");
    }

    #[test]
    fn test_wav_session_readable() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), RecordingFormat::Wav);
        let (source, _) = mock();

        engine.start_with_source(source).unwrap();
        engine.capture_chunk().unwrap();
        let path = engine.stop().unwrap().unwrap();
        assert!(path.ends_with("recorded_1.wav"));

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 44100);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = RecordingEngine::new(RecordingConfig {
            chunk_size: 0,
            output_dir: dir.path().join("records"),
            ..RecordingConfig::default()
        });
        let (source, closed) = mock();

        let result = engine.start_with_source(source);

        assert!(matches!(result, Err(AudioError::InvalidConfig(_))));
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(engine.state(), RecordingState::Idle);
        assert_eq!(engine.capture_chunk().unwrap(), None);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let config = RecordingConfig {
            sample_rate: 0,
            ..RecordingConfig::default()
        };
        assert!(matches!(config.validate(), Err(AudioError::InvalidConfig(_))));
        assert!(RecordingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_close_releases_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), RecordingFormat::Raw);
        let (source, closed) = mock();

        engine.start_with_source(source).unwrap();
        engine.capture_chunk().unwrap();
        engine.close();

        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(engine.state(), RecordingState::Idle);
        assert_eq!(engine.stop().unwrap(), None);
        assert_eq!(engine.captured().unwrap().len(), 4);

        // Safe to repeat
        engine.close();
    }
}
