// Owns every SourceRegionState. Nothing else holds a record; callers keep a
// SourceId and ask again whenever they need the current values.
//
// Notifications go out over crossbeam channels. A subscriber only ever sees
// events after the update that produced them has finished, so a handler can
// never re-enter update() in the middle of a mutation.

use std::collections::BTreeMap;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::audio_api::EngineError;
use super::region_state::{Point, SourceId, SourceRegionState};

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("source {0} is not registered")]
    UnregisteredSource(SourceId),
    #[error("source {0} has no audio assigned")]
    Unassigned(SourceId),
    #[error("source {0} has no duration yet")]
    NotReady(SourceId),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Clone, Debug, PartialEq)]
pub enum RegionEvent {
    PositionChanged(SourceId, f64),
    DurationChanged(SourceId, f64),
    PlaybackStateChanged(SourceId, bool),
    TrimChanged(SourceId, f64, f64),
    FadeChanged(SourceId, Point, Point),
    LoopChanged(SourceId, bool),
    StateChanged(SourceId, Box<SourceRegionState>),
    SourceRemoved(SourceId),
}

impl RegionEvent {
    pub fn source(&self) -> SourceId {
        match self {
            RegionEvent::PositionChanged(id, _)
            | RegionEvent::DurationChanged(id, _)
            | RegionEvent::PlaybackStateChanged(id, _)
            | RegionEvent::TrimChanged(id, _, _)
            | RegionEvent::FadeChanged(id, _, _)
            | RegionEvent::LoopChanged(id, _)
            | RegionEvent::StateChanged(id, _)
            | RegionEvent::SourceRemoved(id) => *id,
        }
    }
}

/// Playable region of every handle pair, normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedPositions {
    pub leading: (f64, f64),  // (trim_in, fade_in.x)
    pub trailing: (f64, f64), // (trim_out, fade_out.x)
}

#[derive(Default)]
pub struct RegionStore {
    records: BTreeMap<SourceId, SourceRegionState>,
    active: Option<SourceId>,
    next_id: u64,
    subscribers: Vec<Sender<RegionEvent>>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<RegionEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Hands out an id that has never been used by this store and registers it.
    pub fn create_source(&mut self) -> SourceId {
        let id = SourceId(self.next_id);
        self.register(id);
        id
    }

    pub fn register(&mut self, id: SourceId) {
        self.next_id = self.next_id.max(id.0 + 1);
        if self.records.contains_key(&id) {
            return;
        }
        log::info!("registered {id}");
        self.records.insert(id, SourceRegionState::new(id));
    }

    /// Puts back a record loaded from disk. Runtime flags start cleared.
    pub fn restore(&mut self, mut saved: SourceRegionState) -> SourceId {
        let id = saved.source_id;
        self.register(id);
        saved.is_active = self.active == Some(id);
        saved.is_playing = false;
        saved.is_assigned = false;
        saved.total_duration = 0.0;
        if saved.normalize() {
            log::warn!("{id}: saved region was out of range, corrected on load");
        }
        self.records.insert(id, saved);
        id
    }

    pub fn deregister(&mut self, id: SourceId) -> Result<SourceRegionState, RegionError> {
        let removed = self
            .records
            .remove(&id)
            .ok_or(RegionError::UnregisteredSource(id))?;
        if self.active == Some(id) {
            self.active = None;
        }
        log::info!("deregistered {id}");
        self.emit(RegionEvent::SourceRemoved(id));
        Ok(removed)
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceRegionState> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.records.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &SourceRegionState> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn active(&self) -> Option<SourceId> {
        self.active
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Makes sure ids below `next_id` are never handed out by create_source().
    pub fn reserve_ids(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    pub fn playing_sources(&self) -> Vec<SourceId> {
        self.records
            .values()
            .filter(|s| s.is_playing)
            .map(|s| s.source_id)
            .collect()
    }

    /// Runs `mutate` on the record, fixes up anything it broke, then sends one
    /// event per field group that actually changed plus a StateChanged.
    pub fn update<F>(&mut self, id: SourceId, mutate: F) -> Result<(), RegionError>
    where
        F: FnOnce(&mut SourceRegionState),
    {
        let is_active = self.active == Some(id);
        let record = match self.records.get_mut(&id) {
            Some(r) => r,
            None => {
                log::warn!("update on unregistered {id} ignored");
                return Err(RegionError::UnregisteredSource(id));
            }
        };
        let before = record.clone();
        mutate(record);
        record.source_id = id;
        // only set_active moves the marker
        record.is_active = is_active;
        if record.normalize() {
            log::warn!(
                "{id}: region corrected to trim [{:.4}, {:.4}] fade [{:.4}, {:.4}]",
                record.trim_in,
                record.trim_out,
                record.fade_in_point.x,
                record.fade_out_point.x
            );
        }
        let after = record.clone();

        let mut events = Vec::with_capacity(4);
        if before.playback_position != after.playback_position {
            events.push(RegionEvent::PositionChanged(id, after.playback_position));
        }
        if before.total_duration != after.total_duration {
            events.push(RegionEvent::DurationChanged(id, after.total_duration));
        }
        if before.is_playing != after.is_playing {
            events.push(RegionEvent::PlaybackStateChanged(id, after.is_playing));
        }
        if before.trim_in != after.trim_in || before.trim_out != after.trim_out {
            events.push(RegionEvent::TrimChanged(id, after.trim_in, after.trim_out));
        }
        if before.fade_in_point != after.fade_in_point || before.fade_out_point != after.fade_out_point {
            events.push(RegionEvent::FadeChanged(id, after.fade_in_point, after.fade_out_point));
        }
        if before.is_looping != after.is_looping {
            events.push(RegionEvent::LoopChanged(id, after.is_looping));
        }
        events.push(RegionEvent::StateChanged(id, Box::new(after)));

        for event in events {
            self.emit(event);
        }
        Ok(())
    }

    /// Moves the active marker. The old source is cleared before the new one
    /// is set, so two sources are never active at once.
    pub fn set_active(&mut self, id: SourceId) -> Result<(), RegionError> {
        if !self.records.contains_key(&id) {
            log::warn!("set_active on unregistered {id} ignored");
            return Err(RegionError::UnregisteredSource(id));
        }
        if self.active == Some(id) {
            return Ok(());
        }
        if let Some(prev) = self.active.take() {
            self.update(prev, |_| {})?;
        }
        self.active = Some(id);
        self.update(id, |_| {})
    }

    pub fn effective_playback_range(&self, id: SourceId) -> Option<(f64, f64)> {
        self.get(id).map(|s| (s.trim_in_secs(), s.trim_out_secs()))
    }

    pub fn normalized_positions(&self, id: SourceId) -> Option<NormalizedPositions> {
        self.get(id).map(|s| NormalizedPositions {
            leading: (s.trim_in, s.fade_in_point.x),
            trailing: (s.trim_out, s.fade_out_point.x),
        })
    }

    fn emit(&mut self, event: RegionEvent) {
        log::trace!("{event:?}");
        // drop subscribers whose receiver went away
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
