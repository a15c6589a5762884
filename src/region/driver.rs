// Runs once per tick for every playing source: reads where the engine is,
// sets the fade gain, and handles the end of the region (wrap or stop).

use crate::audio_api::PlaybackEngine;
use crate::pipeline::{RegionError, RegionStore, SourceId};

use super::envelope::FadeEnvelope;

pub const DEFAULT_GUARD_BUFFER_SECS: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Not playing, unknown, or not ready; nothing was sent.
    Idle,
    Advanced { position: f64, gain: f32 },
    /// Inside the guard zone before the end of a one-shot; waiting for the end.
    Holding { position: f64 },
    Looped { restart_at: f64 },
    Stopped { position: f64 },
    EngineUnavailable,
}

pub struct PlaybackDriver {
    guard_buffer: f64,
}

impl Default for PlaybackDriver {
    fn default() -> Self {
        Self::new(DEFAULT_GUARD_BUFFER_SECS)
    }
}

impl PlaybackDriver {
    pub fn new(guard_buffer: f64) -> Self {
        Self { guard_buffer: guard_buffer.max(0.0) }
    }

    /// Starts from the trim-in point, never from zero.
    pub fn start<E>(&mut self, store: &mut RegionStore, engine: &mut E, source: SourceId) -> Result<(), RegionError>
    where
        E: PlaybackEngine + ?Sized,
    {
        let state = store.get(source).ok_or(RegionError::UnregisteredSource(source))?;
        if !state.is_assigned {
            return Err(RegionError::Unassigned(source));
        }
        if state.total_duration <= 0.0 {
            return Err(RegionError::NotReady(source));
        }
        let from = state.trim_in_secs();
        let gain = FadeEnvelope::from_state(state).gain_at(from);

        engine.seek(source, from)?;
        engine.set_gain(source, gain)?;
        engine.start(source)?;
        store.update(source, |s| {
            s.is_playing = true;
            s.playback_position = from;
        })?;
        log::info!("{source}: playing from {from:.3}s");
        Ok(())
    }

    /// Stops on request. The record is marked stopped even if the engine
    /// refuses, so the UI doesn't stay stuck in "playing".
    pub fn stop<E>(&mut self, store: &mut RegionStore, engine: &mut E, source: SourceId) -> Result<(), RegionError>
    where
        E: PlaybackEngine + ?Sized,
    {
        if !store.contains(source) {
            return Err(RegionError::UnregisteredSource(source));
        }
        if let Err(e) = engine.stop(source, false) {
            log::warn!("{source}: engine stop failed: {e}");
        }
        let position = engine.position(source).ok();
        store.update(source, |s| {
            s.is_playing = false;
            if let Some(p) = position {
                s.playback_position = p;
            }
        })?;
        log::info!("{source}: stopped");
        Ok(())
    }

    pub fn tick<E>(&mut self, store: &mut RegionStore, engine: &mut E, source: SourceId) -> TickOutcome
    where
        E: PlaybackEngine + ?Sized,
    {
        let Some(state) = store.get(source) else {
            return TickOutcome::Idle;
        };
        if !state.is_playing || !state.is_ready() {
            return TickOutcome::Idle;
        }

        let position = match engine.position(source) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("{source}: no position this tick: {e}");
                return TickOutcome::EngineUnavailable;
            }
        };

        let envelope = FadeEnvelope::from_state(state);
        let gain = envelope.gain_at(position);
        let looping = state.is_looping;
        let is_active = state.is_active;
        let restart_at = state.trim_in_secs();

        if let Err(e) = engine.set_gain(source, gain) {
            log::debug!("{source}: gain not applied: {e}");
            return TickOutcome::EngineUnavailable;
        }

        // past this point the position is not written back, it may be beyond the region
        if position >= envelope.fade_out_end - self.guard_buffer {
            if looping {
                if let Err(e) = engine.restart_at(source, restart_at, envelope.gain_at(restart_at)) {
                    log::debug!("{source}: loop restart deferred: {e}");
                    return TickOutcome::EngineUnavailable;
                }
                if let Err(e) = store.update(source, |s| s.playback_position = restart_at) {
                    log::warn!("{source}: loop position not recorded: {e}");
                }
                log::debug!("{source}: looped at {position:.3}s back to {restart_at:.3}s");
                return TickOutcome::Looped { restart_at };
            }
            if position >= envelope.fade_out_end {
                if let Err(e) = engine.stop(source, true) {
                    log::debug!("{source}: stop deferred: {e}");
                    return TickOutcome::EngineUnavailable;
                }
                if let Err(e) = store.update(source, |s| s.is_playing = false) {
                    log::warn!("{source}: stop not recorded: {e}");
                }
                log::info!("{source}: reached end of region at {position:.3}s");
                return TickOutcome::Stopped { position };
            }
            return TickOutcome::Holding { position };
        }

        // background sources keep playing but don't flood subscribers
        if is_active {
            if let Err(e) = store.update(source, |s| s.playback_position = position) {
                log::warn!("{source}: position not recorded: {e}");
            }
        }
        TickOutcome::Advanced { position, gain }
    }
}
