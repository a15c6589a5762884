use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

pub use crate::audio::{SampleBuffer, StreamCell};
use crate::pipeline::SourceId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamInfo {
    pub duration_secs: f64,
    pub channels: u16,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no stream loaded for {0}")]
    NoStream(SourceId),
    #[error("audio command queue is full")]
    QueueFull,
    #[error("too many open streams")]
    TooManyStreams,
    #[error("could not load {path}: {reason}")]
    Load { path: String, reason: String },
}

/// What the logic layer needs from whatever is actually making sound.
/// Every call reports failure instead of panicking; callers treat an error
/// as "try again next tick".
pub trait PlaybackEngine {
    fn create_stream(&mut self, source: SourceId, path: &Path) -> Result<StreamInfo, EngineError>;
    fn release_stream(&mut self, source: SourceId) -> Result<(), EngineError>;
    fn seek(&mut self, source: SourceId, seconds: f64) -> Result<(), EngineError>;
    fn start(&mut self, source: SourceId) -> Result<(), EngineError>;
    fn stop(&mut self, source: SourceId, immediate: bool) -> Result<(), EngineError>;
    fn position(&self, source: SourceId) -> Result<f64, EngineError>;
    fn set_gain(&mut self, source: SourceId, gain: f32) -> Result<(), EngineError>;

    /// Stop, seek and start as one step, landing at `gain`. Backends that can
    /// deliver it together should override this.
    fn restart_at(&mut self, source: SourceId, seconds: f64, gain: f32) -> Result<(), EngineError> {
        self.stop(source, true)?;
        self.seek(source, seconds)?;
        self.set_gain(source, gain)?;
        self.start(source)
    }
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The engine can't load files (interrupts thread), so the buffer is
    // decoded up front and handed over together with its position cell
    RegisterStream {
        source: SourceId,
        buffer: Arc<SampleBuffer>,
        cell: Arc<StreamCell>,
    },
    ReleaseStream(SourceId),

    Seek { source: SourceId, frame: usize, epoch: u64 },
    Start(SourceId),
    Stop { source: SourceId, immediate: bool },
    SetGain { source: SourceId, gain: f32 },

    // loop wrap, applied in one go so no block ever hears half of it
    Restart { source: SourceId, frame: usize, epoch: u64, gain: f32 },
}
