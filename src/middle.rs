// The logic layer. The TUI hands it input events and a tick; it owns the
// store, both handle pairs, the synchronizer and the playback driver, and
// talks to whatever PlaybackEngine it is given. The TUI only ever reads the
// DisplayState it produces.

use std::path::{Path, PathBuf};

use crossbeam_channel::Receiver;

use crate::audio_api::PlaybackEngine;
use crate::config::Settings;
use crate::pipeline::{NormalizedPositions, ProjectState, RegionError, RegionEvent, RegionStore, SourceId};
use crate::region::{
    DragMode, FadeEnvelope, HandleController, Lane, PlaybackDriver, PositionsChanged, RegionSync, Side,
    TickOutcome, linked_pair, mapper,
};
use crate::shared::{DisplayState, InputEvent, SourceRow, TimelineView};

const DEFAULT_PANEL_WIDTH: f64 = 80.0;

pub struct Middle {
    store: RegionStore,
    leading: HandleController,
    trailing: HandleController,
    sync: RegionSync,
    driver: PlaybackDriver,
    events: Receiver<RegionEvent>,
    panel_width: f64,
    gain: f32,
    status: String,
}

impl Middle {
    pub fn new(settings: &Settings) -> Self {
        let mut store = RegionStore::new();
        let events = store.subscribe();
        let (leading, trailing) = linked_pair(DEFAULT_PANEL_WIDTH, settings.handle_config());
        Self {
            store,
            leading,
            trailing,
            sync: RegionSync::new(),
            driver: PlaybackDriver::new(settings.guard_buffer_secs),
            events,
            panel_width: DEFAULT_PANEL_WIDTH,
            gain: 1.0,
            status: String::new(),
        }
    }

    pub fn store(&self) -> &RegionStore {
        &self.store
    }

    pub fn active(&self) -> Option<SourceId> {
        self.store.active()
    }

    /// Restores saved sources, adds any WAVs the project doesn't know yet,
    /// and selects the previously active source (or the first one).
    pub fn open_project<E>(&mut self, project: Option<ProjectState>, wav_paths: &[PathBuf], engine: &mut E)
    where
        E: PlaybackEngine + ?Sized,
    {
        let mut preferred = None;
        if let Some(project) = project {
            preferred = project.active;
            for id in project.restore_into(&mut self.store) {
                let path = self.store.get(id).map(|s| s.file_path.clone()).unwrap_or_default();
                if path.is_empty() {
                    continue;
                }
                if let Err(e) = self.assign_file(id, Path::new(&path), engine) {
                    log::warn!("{id}: {e}");
                }
            }
        }

        for path in wav_paths {
            let known = self.store.records().any(|s| Path::new(&s.file_path) == path.as_path());
            if known {
                continue;
            }
            let id = self.store.create_source();
            if let Err(e) = self.assign_file(id, path, engine) {
                log::warn!("{id}: {e}");
            }
        }

        let first = preferred
            .filter(|id| self.store.contains(*id))
            .or_else(|| self.store.ids().next());
        if let Some(id) = first {
            if let Err(e) = self.select_source(id, engine) {
                log::warn!("could not select {id}: {e}");
            }
        }
    }

    pub fn assign_file<E>(&mut self, source: SourceId, path: &Path, engine: &mut E) -> Result<(), RegionError>
    where
        E: PlaybackEngine + ?Sized,
    {
        if !self.store.contains(source) {
            return Err(RegionError::UnregisteredSource(source));
        }
        let path_text = path.to_string_lossy().into_owned();
        match engine.create_stream(source, path) {
            Ok(info) => {
                self.store.update(source, |s| {
                    s.file_path = path_text;
                    s.is_assigned = true;
                    s.total_duration = info.duration_secs;
                    s.playback_position = s.playback_position.min(info.duration_secs);
                })?;
                log::info!(
                    "{source}: assigned {} ({:.2}s, {} ch)",
                    path.display(),
                    info.duration_secs,
                    info.channels
                );
                Ok(())
            }
            Err(e) => {
                self.store.update(source, |s| {
                    s.file_path = path_text;
                    s.is_assigned = false;
                    s.total_duration = 0.0;
                })?;
                Err(e.into())
            }
        }
    }

    /// Switches the selected source. Order matters: the outgoing source's
    /// live position is saved into its own record first, then the incoming
    /// region is pushed onto the handles, and only then does the incoming
    /// source become active.
    pub fn select_source<E>(&mut self, incoming: SourceId, engine: &mut E) -> Result<(), RegionError>
    where
        E: PlaybackEngine + ?Sized,
    {
        if !self.store.contains(incoming) {
            log::warn!("select of unregistered {incoming} ignored");
            return Err(RegionError::UnregisteredSource(incoming));
        }
        let outgoing = self.store.active();
        if outgoing == Some(incoming) {
            return Ok(());
        }

        if let Some(out) = outgoing {
            self.end_drag();
            self.persist_live_position(out, engine);
        }
        self.sync
            .restore_handles(&self.store, incoming, &mut self.leading, &mut self.trailing)?;
        self.store.set_active(incoming)?;
        self.gain = self
            .store
            .get(incoming)
            .map(|s| FadeEnvelope::from_state(s).gain_at(s.playback_position))
            .unwrap_or(1.0);
        log::info!("selected {incoming}");
        Ok(())
    }

    pub fn set_panel_width(&mut self, width: f64) {
        if width <= 0.0 || width == self.panel_width {
            return;
        }
        self.panel_width = width;
        self.leading.set_panel_width(width);
        self.trailing.set_panel_width(width);
        if let Some(id) = self.store.active() {
            self.sync.refresh_overlay(&self.store, id, width);
        }
    }

    pub fn handle_input<E>(&mut self, event: InputEvent, engine: &mut E)
    where
        E: PlaybackEngine + ?Sized,
    {
        match event {
            InputEvent::PointerDown { x, lane } => self.pointer_down(x, lane),
            InputEvent::PointerDrag { x } => {
                let change = match self.dragging() {
                    Some(Side::Leading) => self.leading.pointer_drag(x),
                    Some(Side::Trailing) => self.trailing.pointer_drag(x),
                    None => None,
                };
                if let Some(change) = change {
                    self.apply_change(change);
                }
            }
            InputEvent::PointerUp => self.end_drag(),
            InputEvent::PlayPress => self.toggle_play(engine),
            InputEvent::ToggleLoop => self.toggle_loop(),
            InputEvent::SelectNext => self.select_relative(1, engine),
            InputEvent::SelectPrev => self.select_relative(-1, engine),
            InputEvent::SelectSource(id) => {
                if let Err(e) = self.select_source(id, engine) {
                    self.status = e.to_string();
                }
            }
            InputEvent::RemoveSource => self.remove_active(engine),
            InputEvent::Quit => {}
        }
        self.drain_events();
    }

    /// One host frame: keep the handles valid, ease them, run the driver for
    /// every playing source, then fold notifications into the status line.
    pub fn tick<E>(&mut self, dt: f64, engine: &mut E)
    where
        E: PlaybackEngine + ?Sized,
    {
        self.leading.validate();
        self.trailing.validate();
        self.leading.advance(dt);
        self.trailing.advance(dt);

        let active = self.store.active();
        for id in self.store.playing_sources() {
            match self.driver.tick(&mut self.store, engine, id) {
                TickOutcome::Advanced { gain, .. } if Some(id) == active => self.gain = gain,
                TickOutcome::Looped { restart_at } if Some(id) == active => {
                    self.status = format!("{id} looped to {restart_at:.2}s");
                }
                _ => {}
            }
        }
        self.drain_events();
    }

    /// Saves the active source's live position and returns everything worth keeping.
    pub fn save_point<E>(&mut self, engine: &mut E) -> ProjectState
    where
        E: PlaybackEngine + ?Sized,
    {
        if let Some(id) = self.store.active() {
            self.persist_live_position(id, engine);
        }
        ProjectState::capture(&self.store)
    }

    /// Where the handles currently are, normalized. Matches the stored
    /// region of the active source outside of a drag.
    pub fn handle_positions(&self) -> NormalizedPositions {
        NormalizedPositions {
            leading: self.leading.normalized(),
            trailing: self.trailing.normalized(),
        }
    }

    pub fn display_state(&self) -> DisplayState {
        let active = self.store.active();
        let sources = self
            .store
            .records()
            .map(|s| SourceRow {
                id: s.source_id,
                label: source_label(&s.file_path),
                assigned: s.is_assigned,
                active: s.is_active,
                playing: s.is_playing,
                looping: s.is_looping,
            })
            .collect();

        let state = active.and_then(|id| self.store.get(id));
        let overlay = self.sync.overlay();
        let lead = self.leading.rendered();
        let trail = self.trailing.rendered();
        let timeline = TimelineView {
            panel_width: self.panel_width,
            leading_trim: lead.trim_x,
            leading_fade: lead.fade_x,
            trailing_trim: trail.trim_x,
            trailing_fade: trail.fade_x,
            fades_moved: (self.leading.fade_modified(), self.trailing.fade_modified()),
            loop_span: overlay.visible.then_some((overlay.start_x, overlay.end_x)),
            playhead: state.filter(|s| s.is_ready()).map(|s| {
                mapper::normalized_to_panel(s.playback_position / s.total_duration, self.panel_width)
            }),
            editable: self.editable(),
        };

        let range = active.and_then(|id| self.store.effective_playback_range(id));
        let (position_text, range_text) = match (state, range) {
            (Some(s), Some((start, end))) if s.is_ready() => (
                format!("{:.2} / {:.2} s", s.playback_position, s.total_duration),
                format!("{start:.2} - {end:.2} s"),
            ),
            (Some(_), _) => ("no audio".to_string(), String::new()),
            (None, _) => ("no source".to_string(), String::new()),
        };

        DisplayState {
            sources,
            timeline,
            position_text,
            range_text,
            gain: self.gain,
            status: self.status.clone(),
        }
    }

    fn editable(&self) -> bool {
        self.store
            .active()
            .and_then(|id| self.store.get(id))
            .is_some_and(|s| s.is_ready())
    }

    fn pointer_down(&mut self, x: f64, lane: Lane) {
        if !self.editable() {
            log::trace!("pointer down ignored, nothing to edit");
            return;
        }
        self.end_drag();
        let lead = self.leading.hit_distance(x, lane);
        let trail = self.trailing.hit_distance(x, lane);
        let side = match (lead, trail) {
            (Some(a), Some(b)) if a < b => Side::Leading,
            (Some(a), Some(b)) if b < a => Side::Trailing,
            (Some(_), Some(_)) => {
                if x <= self.leading.targets().trim_x {
                    Side::Leading
                } else {
                    Side::Trailing
                }
            }
            (Some(_), None) => Side::Leading,
            (None, Some(_)) => Side::Trailing,
            (None, None) => return,
        };
        let grabbed = match side {
            Side::Leading => self.leading.pointer_down(x, lane),
            Side::Trailing => self.trailing.pointer_down(x, lane),
        };
        log::trace!("pointer down at {x:.2} grabbed {side:?}: {grabbed}");
    }

    fn dragging(&self) -> Option<Side> {
        if self.leading.mode() != DragMode::Idle {
            Some(Side::Leading)
        } else if self.trailing.mode() != DragMode::Idle {
            Some(Side::Trailing)
        } else {
            None
        }
    }

    fn end_drag(&mut self) {
        let change = match self.dragging() {
            Some(Side::Leading) => self.leading.pointer_up(),
            Some(Side::Trailing) => self.trailing.pointer_up(),
            None => None,
        };
        if let Some(change) = change {
            self.apply_change(change);
        }
    }

    fn apply_change(&mut self, change: PositionsChanged) {
        let Some(id) = self.store.active() else {
            return;
        };
        if let Err(e) = self.sync.apply(&mut self.store, id, change, self.panel_width) {
            log::warn!("drag dropped: {e}");
        }
    }

    fn persist_live_position<E>(&mut self, source: SourceId, engine: &mut E)
    where
        E: PlaybackEngine + ?Sized,
    {
        let assigned = self.store.get(source).is_some_and(|s| s.is_assigned);
        if !assigned {
            return;
        }
        match engine.position(source) {
            Ok(p) => {
                if let Err(e) = self.store.update(source, |s| s.playback_position = p) {
                    log::warn!("{source}: live position not saved: {e}");
                }
            }
            Err(e) => log::debug!("{source}: keeping last known position: {e}"),
        }
    }

    fn toggle_play<E>(&mut self, engine: &mut E)
    where
        E: PlaybackEngine + ?Sized,
    {
        let Some(id) = self.store.active() else {
            return;
        };
        let playing = self.store.get(id).is_some_and(|s| s.is_playing);
        let result = if playing {
            self.driver.stop(&mut self.store, engine, id)
        } else {
            self.driver.start(&mut self.store, engine, id)
        };
        if let Err(e) = result {
            log::warn!("{e}");
            self.status = e.to_string();
        }
    }

    fn toggle_loop(&mut self) {
        let Some(id) = self.store.active() else {
            return;
        };
        let looping = self.store.get(id).is_some_and(|s| s.is_looping);
        if let Err(e) = self.sync.set_looping(&mut self.store, id, !looping, self.panel_width) {
            log::warn!("{e}");
        }
    }

    fn select_relative<E>(&mut self, step: isize, engine: &mut E)
    where
        E: PlaybackEngine + ?Sized,
    {
        let ids: Vec<SourceId> = self.store.ids().collect();
        if ids.is_empty() {
            return;
        }
        let current = self
            .store
            .active()
            .and_then(|a| ids.iter().position(|id| *id == a))
            .unwrap_or(0);
        let next = (current as isize + step).rem_euclid(ids.len() as isize) as usize;
        if let Err(e) = self.select_source(ids[next], engine) {
            self.status = e.to_string();
        }
    }

    fn remove_active<E>(&mut self, engine: &mut E)
    where
        E: PlaybackEngine + ?Sized,
    {
        let Some(id) = self.store.active() else {
            return;
        };
        // the drag belonged to the source going away
        let _ = self.leading.pointer_up();
        let _ = self.trailing.pointer_up();

        if self.store.get(id).is_some_and(|s| s.is_playing) {
            if let Err(e) = engine.stop(id, true) {
                log::debug!("{id}: stop before release: {e}");
            }
        }
        if let Err(e) = engine.release_stream(id) {
            log::debug!("{id}: {e}");
        }

        let ids: Vec<SourceId> = self.store.ids().collect();
        let idx = ids.iter().position(|x| *x == id).unwrap_or(0);
        let neighbour = ids.get(idx + 1).or_else(|| idx.checked_sub(1).and_then(|i| ids.get(i))).copied();
        if let Err(e) = self.store.deregister(id) {
            log::warn!("{e}");
            return;
        }

        match neighbour {
            Some(n) => {
                if let Err(e) = self.select_source(n, engine) {
                    log::warn!("could not select {n} after removing {id}: {e}");
                    self.status = format!("could not select {n}");
                }
            }
            None => {
                self.leading.restore(0.0, 0.0);
                self.trailing.restore(1.0, 1.0);
                self.sync = RegionSync::new();
                self.gain = 1.0;
            }
        }
    }

    // background sources only get a say when they stop or go away
    fn drain_events(&mut self) {
        let active = self.store.active();
        for event in self.events.try_iter() {
            let line = match &event {
                RegionEvent::SourceRemoved(id) => format!("{id} removed"),
                RegionEvent::PlaybackStateChanged(id, false) => format!("{id} stopped"),
                _ if Some(event.source()) != active => continue,
                RegionEvent::PlaybackStateChanged(id, true) => format!("{id} playing"),
                RegionEvent::LoopChanged(id, on) => {
                    format!("{id} loop {}", if *on { "on" } else { "off" })
                }
                RegionEvent::DurationChanged(id, d) => format!("{id} loaded, {d:.2}s"),
                _ => continue,
            };
            self.status = line;
        }
    }
}

fn source_label(path: &str) -> String {
    if path.is_empty() {
        return "(empty)".to_string();
    }
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_fixture::{EngineCall, MockEngine};

    const W: f64 = 100.0;

    fn middle_with(files: &[(&str, f64)]) -> (Middle, MockEngine) {
        let mut engine = MockEngine::default();
        for (path, dur) in files {
            engine = engine.with_file(*path, *dur);
        }
        let mut middle = Middle::new(&Settings::default());
        middle.set_panel_width(W);
        let paths: Vec<PathBuf> = files.iter().map(|(p, _)| PathBuf::from(p)).collect();
        middle.open_project(None, &paths, &mut engine);
        (middle, engine)
    }

    fn drag(m: &mut Middle, e: &mut MockEngine, lane: Lane, from: f64, to: f64) {
        m.handle_input(InputEvent::PointerDown { x: from, lane }, e);
        m.handle_input(InputEvent::PointerDrag { x: to }, e);
        m.handle_input(InputEvent::PointerUp, e);
    }

    #[test]
    fn fresh_source_has_full_region_and_unit_gain() {
        let (m, _e) = middle_with(&[("a.wav", 10.0)]);
        let id = m.active().unwrap();
        let s = m.store().get(id).unwrap();
        assert_eq!((s.trim_in, s.trim_out), (0.0, 1.0));
        assert_eq!((s.fade_in_duration, s.fade_out_duration), (0.0, 0.0));
        let env = FadeEnvelope::from_state(s);
        for p in [0.0, 2.5, 5.0, 9.99] {
            assert_eq!(env.gain_at(p), 1.0);
        }
    }

    #[test]
    fn trim_then_fade_drag_sets_fade_in_duration() {
        let (mut m, mut e) = middle_with(&[("a.wav", 10.0)]);
        let id = m.active().unwrap();

        drag(&mut m, &mut e, Lane::Trim, -50.0, -30.0);
        let s = m.store().get(id).unwrap();
        assert!((s.trim_in - 0.2).abs() < 1e-12);
        assert!((s.fade_in_point.x - 0.2).abs() < 1e-12);
        assert_eq!(s.fade_in_duration, 0.0);

        drag(&mut m, &mut e, Lane::Fade, -30.0, -20.0);
        let s = m.store().get(id).unwrap();
        assert!((s.fade_in_duration - 1.0).abs() < 1e-9);

        let env = FadeEnvelope::from_state(s);
        assert!(env.gain_at(2.0).abs() < 1e-6);
        assert!((env.gain_at(2.5) - 0.5).abs() < 1e-5);
        assert!((env.gain_at(3.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn pointer_up_reports_sub_epsilon_finish() {
        let (mut m, mut e) = middle_with(&[("a.wav", 10.0)]);
        let id = m.active().unwrap();
        m.handle_input(InputEvent::PointerDown { x: 50.0, lane: Lane::Trim }, &mut e);
        m.handle_input(InputEvent::PointerDrag { x: 10.0 }, &mut e);
        m.handle_input(InputEvent::PointerDrag { x: 10.0 + 1e-5 }, &mut e);
        m.handle_input(InputEvent::PointerUp, &mut e);
        assert_eq!(m.store().get(id).unwrap().trim_out, 0.6);
        assert_eq!(m.handle_positions().trailing, (0.6, 0.6));
    }

    #[test]
    fn collapsed_region_picks_pair_by_pointer_side() {
        let (mut m, mut e) = middle_with(&[("a.wav", 10.0)]);
        let id = m.active().unwrap();
        drag(&mut m, &mut e, Lane::Trim, 50.0, 0.0);
        drag(&mut m, &mut e, Lane::Trim, -50.0, 0.0);
        // both trims sit on 0; grabbing just right of them moves the trailing one
        drag(&mut m, &mut e, Lane::Trim, 0.5, 20.0);
        let s = m.store().get(id).unwrap();
        assert_eq!((s.trim_in, s.trim_out), (0.5, 0.7));
    }

    #[test]
    fn unassigned_source_is_inert() {
        let mut engine = MockEngine::default();
        let mut m = Middle::new(&Settings::default());
        m.set_panel_width(W);
        m.open_project(None, &[PathBuf::from("missing.wav")], &mut engine);
        let id = m.active().unwrap();
        let before = m.store().get(id).cloned();
        assert!(!before.as_ref().unwrap().is_assigned);

        drag(&mut m, &mut engine, Lane::Trim, -50.0, 0.0);
        m.handle_input(InputEvent::PlayPress, &mut engine);
        assert_eq!(m.store().get(id).cloned(), before);
        assert!(!m.display_state().timeline.editable);
        assert!(engine.take_calls().is_empty());
    }

    #[test]
    fn switching_saves_outgoing_before_loading_incoming() {
        let (mut m, mut e) = middle_with(&[("a.wav", 10.0), ("b.wav", 20.0)]);
        let a = m.active().unwrap();
        let b = m.store().ids().find(|id| *id != a).unwrap();

        drag(&mut m, &mut e, Lane::Trim, -50.0, -30.0);
        m.handle_input(InputEvent::PlayPress, &mut e);
        e.set_position(a, 3.3);
        m.handle_input(InputEvent::SelectSource(b), &mut e);
        m.handle_input(InputEvent::SelectSource(a), &mut e);
        m.handle_input(InputEvent::SelectSource(b), &mut e);
        let a_before = m.store().get(a).cloned().unwrap();

        // edit b, then come back to a
        drag(&mut m, &mut e, Lane::Trim, 50.0, 0.0);
        let a_after = m.store().get(a).cloned().unwrap();
        assert_eq!(a_before, a_after);
        assert_eq!(a_after.playback_position, 3.3);
        assert!((a_after.trim_in - 0.2).abs() < 1e-12);
        assert_eq!(a_after.trim_out, 1.0);
        assert_eq!(m.store().get(b).unwrap().trim_out, 0.5);

        m.handle_input(InputEvent::SelectSource(a), &mut e);
        assert_eq!(m.active(), Some(a));
        let pos = m.handle_positions();
        assert!((pos.leading.0 - 0.2).abs() < 1e-12);
        assert_eq!(pos.trailing, (1.0, 1.0));
        assert!(!m.store().get(b).unwrap().is_active);
    }

    #[test]
    fn background_source_keeps_playing_without_position_traffic() {
        let (mut m, mut e) = middle_with(&[("a.wav", 10.0), ("b.wav", 10.0)]);
        let a = m.active().unwrap();
        m.handle_input(InputEvent::PlayPress, &mut e);
        m.handle_input(InputEvent::SelectNext, &mut e);
        assert_ne!(m.active(), Some(a));

        e.set_position(a, 4.0);
        m.tick(0.016, &mut e);
        let s = m.store().get(a).unwrap();
        assert!(s.is_playing);
        assert_eq!(s.playback_position, 0.0);
    }

    #[test]
    fn play_loops_through_the_tick() {
        let (mut m, mut e) = middle_with(&[("a.wav", 10.0)]);
        let id = m.active().unwrap();
        drag(&mut m, &mut e, Lane::Trim, -50.0, -40.0);
        m.handle_input(InputEvent::ToggleLoop, &mut e);
        assert!(m.display_state().timeline.loop_span.is_some());
        e.take_calls();
        m.handle_input(InputEvent::PlayPress, &mut e);
        assert_eq!(e.take_calls()[0], EngineCall::Seek(id, 1.0));

        e.set_position(id, 9.97);
        m.tick(0.016, &mut e);
        assert_eq!(m.store().get(id).unwrap().playback_position, 1.0);
        assert!(m.display_state().status.contains("looped"));

        m.handle_input(InputEvent::ToggleLoop, &mut e);
        assert!(m.display_state().timeline.loop_span.is_none());
    }

    #[test]
    fn remove_selects_neighbour_and_releases_stream() {
        let (mut m, mut e) = middle_with(&[("a.wav", 1.0), ("b.wav", 2.0), ("c.wav", 3.0)]);
        let ids: Vec<_> = m.store().ids().collect();
        m.handle_input(InputEvent::SelectSource(ids[1]), &mut e);
        e.take_calls();
        m.handle_input(InputEvent::RemoveSource, &mut e);
        assert!(e.take_calls().contains(&EngineCall::Release(ids[1])));
        assert_eq!(m.active(), Some(ids[2]));
        assert!(!m.store().contains(ids[1]));

        m.handle_input(InputEvent::RemoveSource, &mut e);
        m.handle_input(InputEvent::RemoveSource, &mut e);
        assert_eq!(m.active(), None);
        assert_eq!(m.store().len(), 0);
        assert_eq!(m.display_state().position_text, "no source");
    }

    #[test]
    fn reopened_project_keeps_regions_and_selection() {
        let (mut m, mut e) = middle_with(&[("a.wav", 10.0), ("b.wav", 10.0)]);
        m.handle_input(InputEvent::SelectNext, &mut e);
        let b = m.active().unwrap();
        drag(&mut m, &mut e, Lane::Trim, 50.0, 30.0);
        let project = m.save_point(&mut e);

        let mut engine = MockEngine::default().with_file("a.wav", 10.0).with_file("b.wav", 10.0);
        let mut reopened = Middle::new(&Settings::default());
        reopened.set_panel_width(W);
        let paths = [PathBuf::from("a.wav"), PathBuf::from("b.wav")];
        reopened.open_project(Some(project), &paths, &mut engine);

        assert_eq!(reopened.store().len(), 2);
        assert_eq!(reopened.active(), Some(b));
        assert_eq!(reopened.store().get(b).unwrap().trim_out, 0.8);
        let (trim, fade) = reopened.handle_positions().trailing;
        assert!((trim - 0.8).abs() < 1e-12 && (fade - 0.8).abs() < 1e-12);
    }

    #[test]
    fn display_lists_sources_and_range() {
        let (mut m, mut e) = middle_with(&[("dir/a.wav", 10.0)]);
        drag(&mut m, &mut e, Lane::Trim, 50.0, 30.0);
        m.tick(10.0, &mut e);
        let ds = m.display_state();
        assert_eq!(ds.sources.len(), 1);
        assert_eq!(ds.sources[0].label, "a.wav");
        assert!(ds.sources[0].active);
        assert_eq!(ds.range_text, "0.00 - 8.00 s");
        assert_eq!(ds.timeline.trailing_trim, 30.0);
    }
}
