// Glue between the handle pairs and the store. Drags flow handle -> store;
// source switches flow store -> handle, silently.

use crate::pipeline::{RegionError, RegionStore, SourceId};

use super::handle::{HandleController, PositionsChanged, Side};
use super::mapper;

const VERIFY_TOLERANCE: f64 = 1e-6;

/// Highlighted span between the trims, in panel space. Hidden unless looping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoopOverlay {
    pub visible: bool,
    pub start_x: f64,
    pub end_x: f64,
}

#[derive(Default)]
pub struct RegionSync {
    overlay: LoopOverlay,
}

impl RegionSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(&self) -> LoopOverlay {
        self.overlay
    }

    /// Writes one pair's drag into the store as a single update.
    pub fn apply(
        &mut self,
        store: &mut RegionStore,
        source: SourceId,
        change: PositionsChanged,
        panel_width: f64,
    ) -> Result<(), RegionError> {
        store.update(source, |s| {
            match change.side {
                Side::Leading => {
                    s.trim_in = change.trim;
                    s.fade_in_point.x = change.fade;
                }
                Side::Trailing => {
                    s.trim_out = change.trim;
                    s.fade_out_point.x = change.fade;
                }
            }
            s.recompute_fade_durations();
        })?;
        self.refresh_overlay(store, source, panel_width);
        Ok(())
    }

    pub fn set_looping(
        &mut self,
        store: &mut RegionStore,
        source: SourceId,
        looping: bool,
        panel_width: f64,
    ) -> Result<(), RegionError> {
        store.update(source, |s| s.is_looping = looping)?;
        log::info!("{source}: looping {}", if looping { "on" } else { "off" });
        self.refresh_overlay(store, source, panel_width);
        Ok(())
    }

    pub fn refresh_overlay(&mut self, store: &RegionStore, source: SourceId, panel_width: f64) {
        self.overlay = match store.get(source) {
            Some(s) if s.is_looping => LoopOverlay {
                visible: true,
                start_x: mapper::normalized_to_panel(s.trim_in, panel_width),
                end_x: mapper::normalized_to_panel(s.trim_out, panel_width),
            },
            _ => LoopOverlay::default(),
        };
    }

    /// Loads a source's stored region onto both pairs. Nothing is reported
    /// back to the store, so this can't echo into another update.
    pub fn restore_handles(
        &mut self,
        store: &RegionStore,
        source: SourceId,
        leading: &mut HandleController,
        trailing: &mut HandleController,
    ) -> Result<(), RegionError> {
        let s = store.get(source).ok_or(RegionError::UnregisteredSource(source))?;
        leading.restore(s.trim_in, s.fade_in_point.x);
        trailing.restore(s.trim_out, s.fade_out_point.x);
        self.refresh_overlay(store, source, leading.panel_width());
        self.verify(store, source, leading, trailing);
        Ok(())
    }

    /// Compares the handles with the stored record and logs any difference.
    pub fn verify(
        &self,
        store: &RegionStore,
        source: SourceId,
        leading: &HandleController,
        trailing: &HandleController,
    ) -> bool {
        let Some(stored) = store.normalized_positions(source) else {
            return false;
        };
        let close = |a: (f64, f64), b: (f64, f64)| {
            (a.0 - b.0).abs() < VERIFY_TOLERANCE && (a.1 - b.1).abs() < VERIFY_TOLERANCE
        };
        let ok = close(stored.leading, leading.normalized()) && close(stored.trailing, trailing.normalized());
        if ok {
            log::debug!("{source}: handles match stored region");
        } else {
            log::warn!(
                "{source}: handles {:?}/{:?} differ from stored {:?}/{:?}",
                leading.normalized(),
                trailing.normalized(),
                stored.leading,
                stored.trailing
            );
        }
        ok
    }
}
