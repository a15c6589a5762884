// Purely for testing: an engine that records what it was asked to do, and
// a helper that puts a playable source into a store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::audio_api::{EngineError, PlaybackEngine, StreamInfo};

use super::region_state::SourceId;
use super::store::RegionStore;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineCall {
    Create(SourceId),
    Release(SourceId),
    Seek(SourceId, f64),
    Start(SourceId),
    Stop(SourceId, bool),
    SetGain(SourceId, f32),
}

#[derive(Default)]
pub struct MockEngine {
    pub calls: Vec<EngineCall>,
    pub positions: HashMap<SourceId, f64>,
    pub files: HashMap<PathBuf, f64>, // path -> duration; anything else fails to load
    pub offline: bool,
    pub refuse_seeks: bool, // seeks fail, everything else still answers
}

impl MockEngine {
    pub fn with_stream(mut self, source: SourceId) -> Self {
        self.positions.insert(source, 0.0);
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, duration: f64) -> Self {
        self.files.insert(path.into(), duration);
        self
    }

    pub fn set_position(&mut self, source: SourceId, seconds: f64) {
        self.positions.insert(source, seconds);
    }

    pub fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }

    fn online(&self, source: SourceId) -> Result<(), EngineError> {
        if self.offline {
            return Err(EngineError::QueueFull);
        }
        if !self.positions.contains_key(&source) {
            return Err(EngineError::NoStream(source));
        }
        Ok(())
    }
}

impl PlaybackEngine for MockEngine {
    fn create_stream(&mut self, source: SourceId, path: &Path) -> Result<StreamInfo, EngineError> {
        if self.offline {
            return Err(EngineError::QueueFull);
        }
        let duration = *self.files.get(path).ok_or_else(|| EngineError::Load {
            path: path.display().to_string(),
            reason: "not in mock".into(),
        })?;
        self.positions.insert(source, 0.0);
        self.calls.push(EngineCall::Create(source));
        Ok(StreamInfo { duration_secs: duration, channels: 2 })
    }

    fn release_stream(&mut self, source: SourceId) -> Result<(), EngineError> {
        self.online(source)?;
        self.positions.remove(&source);
        self.calls.push(EngineCall::Release(source));
        Ok(())
    }

    fn seek(&mut self, source: SourceId, seconds: f64) -> Result<(), EngineError> {
        self.online(source)?;
        if self.refuse_seeks {
            return Err(EngineError::QueueFull);
        }
        self.positions.insert(source, seconds);
        self.calls.push(EngineCall::Seek(source, seconds));
        Ok(())
    }

    fn start(&mut self, source: SourceId) -> Result<(), EngineError> {
        self.online(source)?;
        self.calls.push(EngineCall::Start(source));
        Ok(())
    }

    fn stop(&mut self, source: SourceId, immediate: bool) -> Result<(), EngineError> {
        self.online(source)?;
        self.calls.push(EngineCall::Stop(source, immediate));
        Ok(())
    }

    fn position(&self, source: SourceId) -> Result<f64, EngineError> {
        self.online(source)?;
        Ok(self.positions[&source])
    }

    fn set_gain(&mut self, source: SourceId, gain: f32) -> Result<(), EngineError> {
        self.online(source)?;
        self.calls.push(EngineCall::SetGain(source, gain));
        Ok(())
    }
}

/// Registers a source that looks like the engine already reported `duration`.
pub fn ready_source(store: &mut RegionStore, duration: f64) -> SourceId {
    let id = store.create_source();
    store
        .update(id, |s| {
            s.file_path = format!("{id}.wav");
            s.is_assigned = true;
            s.total_duration = duration;
        })
        .unwrap();
    id
}
