// A trim handle and its fade handle, one pair per end of the region.
//
// Positions are kept in panel space. Each handle has a target (where the
// logic says it is) and a rendered position that eases toward the target
// every tick. Everything downstream reads targets only.
//
// The two pairs bound each other: the leading trim can never pass the
// trailing trim and vice versa. Rather than pointing at each other, each
// pair publishes its targets into a shared cell and reads the other side
// through a weak probe. A dead probe just means "use the panel edges".

use std::cell::Cell;
use std::rc::{Rc, Weak};

use super::mapper;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Leading,
    Trailing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lane {
    Trim,
    Fade,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    Idle,
    DraggingTrim,
    DraggingFade,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleTargets {
    pub trim_x: f64,
    pub fade_x: f64,
}

/// Normalized trim and fade of one pair after an accepted drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionsChanged {
    pub side: Side,
    pub trim: f64,
    pub fade: f64,
}

pub trait Counterpart {
    fn targets(&self) -> Option<HandleTargets>;
}

#[derive(Clone, Debug)]
pub struct CounterpartProbe(Weak<Cell<HandleTargets>>);

impl Counterpart for CounterpartProbe {
    fn targets(&self) -> Option<HandleTargets> {
        self.0.upgrade().map(|cell| cell.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleConfig {
    pub align_tolerance_px: f64,
    pub hit_radius_px: f64,
    pub drag_epsilon_px: f64,
    pub smoothing_rate: f64, // per second
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            align_tolerance_px: 0.5,
            hit_radius_px: 1.5,
            drag_epsilon_px: 0.001,
            smoothing_rate: 18.0,
        }
    }
}

// below this the rendered position just jumps to the target
const SNAP_PX: f64 = 1e-3;

#[derive(Clone, Copy, Debug)]
struct Smoothed {
    target: f64,
    rendered: f64,
}

impl Smoothed {
    fn at(x: f64) -> Self {
        Self { target: x, rendered: x }
    }

    fn advance(&mut self, dt: f64, rate: f64) {
        let k = if rate <= 0.0 { 1.0 } else { 1.0 - (-rate * dt.max(0.0)).exp() };
        self.rendered += (self.target - self.rendered) * k;
        if (self.target - self.rendered).abs() < SNAP_PX {
            self.rendered = self.target;
        }
    }
}

pub struct HandleController {
    side: Side,
    mode: DragMode,
    fade_modified: bool,
    trim: Smoothed,
    fade: Smoothed,
    panel_width: f64,
    config: HandleConfig,
    published: Rc<Cell<HandleTargets>>,
    counterpart: Option<Box<dyn Counterpart>>,
    stale_reported: bool,
}

/// Builds both pairs already wired to bound each other.
pub fn linked_pair(panel_width: f64, config: HandleConfig) -> (HandleController, HandleController) {
    let mut leading = HandleController::new(Side::Leading, panel_width, config);
    let mut trailing = HandleController::new(Side::Trailing, panel_width, config);
    leading.set_counterpart(trailing.probe());
    trailing.set_counterpart(leading.probe());
    (leading, trailing)
}

impl HandleController {
    pub fn new(side: Side, panel_width: f64, config: HandleConfig) -> Self {
        let panel_width = panel_width.max(0.0);
        let (left, right) = mapper::panel_edges(panel_width);
        let x = match side {
            Side::Leading => left,
            Side::Trailing => right,
        };
        Self {
            side,
            mode: DragMode::Idle,
            fade_modified: false,
            trim: Smoothed::at(x),
            fade: Smoothed::at(x),
            panel_width,
            config,
            published: Rc::new(Cell::new(HandleTargets { trim_x: x, fade_x: x })),
            counterpart: None,
            stale_reported: false,
        }
    }

    pub fn probe(&self) -> CounterpartProbe {
        CounterpartProbe(Rc::downgrade(&self.published))
    }

    pub fn set_counterpart(&mut self, counterpart: impl Counterpart + 'static) {
        self.counterpart = Some(Box::new(counterpart));
        self.stale_reported = false;
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn fade_modified(&self) -> bool {
        self.fade_modified
    }

    pub fn panel_width(&self) -> f64 {
        self.panel_width
    }

    pub fn targets(&self) -> HandleTargets {
        HandleTargets { trim_x: self.trim.target, fade_x: self.fade.target }
    }

    pub fn rendered(&self) -> HandleTargets {
        HandleTargets { trim_x: self.trim.rendered, fade_x: self.fade.rendered }
    }

    /// (trim, fade) in normalized space, from targets.
    pub fn normalized(&self) -> (f64, f64) {
        (
            mapper::panel_to_normalized(self.trim.target, self.panel_width),
            mapper::panel_to_normalized(self.fade.target, self.panel_width),
        )
    }

    /// Distance from `x` to the handle in `lane`, if it is close enough to grab.
    pub fn hit_distance(&self, x: f64, lane: Lane) -> Option<f64> {
        let handle_x = match lane {
            Lane::Trim => self.trim.target,
            Lane::Fade => self.fade.target,
        };
        let d = (x - handle_x).abs();
        (d <= self.config.hit_radius_px).then_some(d)
    }

    pub fn pointer_down(&mut self, x: f64, lane: Lane) -> bool {
        if self.hit_distance(x, lane).is_none() {
            return false;
        }
        self.begin_drag(lane);
        true
    }

    pub fn begin_drag(&mut self, lane: Lane) {
        self.mode = match lane {
            Lane::Trim => DragMode::DraggingTrim,
            Lane::Fade => DragMode::DraggingFade,
        };
    }

    pub fn pointer_drag(&mut self, x: f64) -> Option<PositionsChanged> {
        match self.mode {
            DragMode::Idle => None,
            DragMode::DraggingTrim => {
                let old = self.trim.target;
                let new = self.clamp_trim(x);
                if (new - old).abs() < self.config.drag_epsilon_px {
                    return None;
                }
                self.trim.target = new;
                let aligned = (self.fade.target - old).abs() <= self.config.align_tolerance_px;
                if !self.fade_modified || aligned {
                    self.fade.target = new;
                    self.fade_modified = false;
                }
                self.validate();
                self.publish();
                Some(self.positions_changed())
            }
            DragMode::DraggingFade => {
                let old = self.fade.target;
                let new = self.clamp_fade(x);
                if (new - old).abs() < self.config.drag_epsilon_px {
                    return None;
                }
                self.fade.target = new;
                self.fade_modified = true;
                self.publish();
                Some(self.positions_changed())
            }
        }
    }

    /// Ends the drag. Always reports where the pair ended up, even if the
    /// last movement was too small to be reported on its own.
    pub fn pointer_up(&mut self) -> Option<PositionsChanged> {
        if self.mode == DragMode::Idle {
            return None;
        }
        self.mode = DragMode::Idle;
        Some(self.positions_changed())
    }

    /// Keeps the fade on the inside of its trim. Returns true if the fade moved.
    pub fn validate(&mut self) -> bool {
        let trim = self.trim.target;
        let counterpart = self.counterpart_targets();
        let mut fade = self.fade.target;
        let mut snapped = false;

        match self.side {
            Side::Leading => {
                if fade < trim {
                    fade = trim;
                    snapped = true;
                } else if let Some(c) = counterpart {
                    if fade > c.trim_x && c.trim_x >= trim {
                        fade = c.trim_x;
                    }
                }
            }
            Side::Trailing => {
                if fade > trim {
                    fade = trim;
                    snapped = true;
                } else if let Some(c) = counterpart {
                    if fade < c.trim_x && c.trim_x <= trim {
                        fade = c.trim_x;
                    }
                }
            }
        }

        if fade == self.fade.target {
            return false;
        }
        self.fade.target = fade;
        if snapped {
            self.fade_modified = false;
        }
        self.publish();
        true
    }

    pub fn advance(&mut self, dt: f64) {
        self.trim.advance(dt, self.config.smoothing_rate);
        self.fade.advance(dt, self.config.smoothing_rate);
    }

    /// Puts the pair at stored normalized positions without reporting it.
    pub fn restore(&mut self, trim: f64, fade: f64) {
        let t = mapper::normalized_to_panel(trim, self.panel_width);
        let f = mapper::normalized_to_panel(fade, self.panel_width);
        self.trim = Smoothed::at(t);
        self.fade = Smoothed::at(f);
        self.fade_modified = (f - t).abs() > self.config.align_tolerance_px;
        self.mode = DragMode::Idle;
        self.publish();
    }

    /// Rescales the panel. Normalized positions stay where they were.
    pub fn set_panel_width(&mut self, width: f64) {
        if width <= 0.0 || width == self.panel_width {
            return;
        }
        let old = self.panel_width;
        let rescale = |x: f64| mapper::normalized_to_panel(mapper::panel_to_normalized(x, old), width);
        self.trim.target = rescale(self.trim.target);
        self.trim.rendered = rescale(self.trim.rendered);
        self.fade.target = rescale(self.fade.target);
        self.fade.rendered = rescale(self.fade.rendered);
        self.panel_width = width;
        self.publish();
    }

    fn positions_changed(&self) -> PositionsChanged {
        let (trim, fade) = self.normalized();
        PositionsChanged { side: self.side, trim, fade }
    }

    fn publish(&self) {
        self.published.set(self.targets());
    }

    fn counterpart_targets(&mut self) -> Option<HandleTargets> {
        let targets = self.counterpart.as_ref().and_then(|c| c.targets());
        if targets.is_none() && !self.stale_reported {
            log::warn!("{:?} handle has no counterpart, bounding by panel edges", self.side);
            self.stale_reported = true;
        }
        targets
    }

    fn clamp_trim(&mut self, x: f64) -> f64 {
        let (left, right) = mapper::panel_edges(self.panel_width);
        let counterpart = self.counterpart_targets();
        match self.side {
            Side::Leading => {
                let hi = counterpart.map_or(right, |c| c.trim_x);
                x.max(left).min(hi)
            }
            Side::Trailing => {
                let lo = counterpart.map_or(left, |c| c.trim_x);
                x.min(right).max(lo)
            }
        }
    }

    // own trim always wins if the counterpart bound is on the wrong side of it
    fn clamp_fade(&mut self, x: f64) -> f64 {
        let (left, right) = mapper::panel_edges(self.panel_width);
        let trim = self.trim.target;
        let counterpart = self.counterpart_targets();
        match self.side {
            Side::Leading => {
                let hi = counterpart.map_or(right, |c| c.fade_x);
                x.min(hi).max(trim)
            }
            Side::Trailing => {
                let lo = counterpart.map_or(left, |c| c.fade_x);
                x.max(lo).min(trim)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const W: f64 = 100.0;

    fn pair() -> (HandleController, HandleController) {
        linked_pair(W, HandleConfig::default())
    }

    fn drag(h: &mut HandleController, lane: Lane, x: f64) -> Option<PositionsChanged> {
        h.begin_drag(lane);
        h.pointer_drag(x);
        h.pointer_up()
    }

    #[test]
    fn starts_at_panel_edges() {
        let (l, t) = pair();
        assert_eq!(l.normalized(), (0.0, 0.0));
        assert_eq!(t.normalized(), (1.0, 1.0));
        assert_eq!(l.mode(), DragMode::Idle);
    }

    #[test]
    fn unmodified_fade_follows_trim() {
        let (mut l, _t) = pair();
        l.begin_drag(Lane::Trim);
        let change = l.pointer_drag(-30.0).unwrap();
        assert_eq!(change.side, Side::Leading);
        assert!((change.trim - 0.2).abs() < 1e-12);
        assert!((change.fade - 0.2).abs() < 1e-12);
        assert!(!l.fade_modified());
    }

    #[test]
    fn leading_trim_cannot_pass_trailing_trim() {
        let (mut l, mut t) = pair();
        drag(&mut t, Lane::Trim, 10.0);
        let change = drag(&mut l, Lane::Trim, 40.0).unwrap();
        assert!((change.trim - 0.6).abs() < 1e-12);
        assert_eq!(l.targets().trim_x, t.targets().trim_x);
    }

    #[test]
    fn trailing_trim_cannot_pass_leading_trim() {
        let (mut l, mut t) = pair();
        drag(&mut l, Lane::Trim, -10.0);
        drag(&mut t, Lane::Trim, -45.0);
        assert_eq!(t.targets().trim_x, -10.0);
        assert_eq!(t.targets().fade_x, -10.0);
    }

    #[test]
    fn trims_stop_at_panel_edges() {
        let (mut l, mut t) = pair();
        drag(&mut l, Lane::Trim, 10.0);
        drag(&mut l, Lane::Trim, -500.0);
        assert_eq!(l.targets().trim_x, -50.0);
        drag(&mut t, Lane::Trim, 0.0);
        drag(&mut t, Lane::Trim, 500.0);
        assert_eq!(t.targets().trim_x, 50.0);
    }

    #[test]
    fn moved_fade_stays_put_when_trim_moves() {
        let (mut l, _t) = pair();
        drag(&mut l, Lane::Trim, -30.0);
        drag(&mut l, Lane::Fade, -20.0);
        assert!(l.fade_modified());
        drag(&mut l, Lane::Trim, -40.0);
        assert_eq!(l.targets().trim_x, -40.0);
        assert_eq!(l.targets().fade_x, -20.0);
        assert!(l.fade_modified());
    }

    #[test]
    fn fade_dragged_back_onto_trim_relocks() {
        let (mut l, _t) = pair();
        drag(&mut l, Lane::Trim, -30.0);
        drag(&mut l, Lane::Fade, -20.0);
        drag(&mut l, Lane::Fade, -30.2);
        assert!(l.fade_modified());
        drag(&mut l, Lane::Trim, -35.0);
        assert_eq!(l.targets().fade_x, -35.0);
        assert!(!l.fade_modified());
    }

    #[test]
    fn trim_past_moved_fade_snaps_fade() {
        let (mut l, _t) = pair();
        drag(&mut l, Lane::Trim, -30.0);
        drag(&mut l, Lane::Fade, -20.0);
        let change = drag(&mut l, Lane::Trim, -10.0).unwrap();
        assert_eq!(change.trim, change.fade);
        assert!(!l.fade_modified());
    }

    #[test]
    fn leading_fade_is_bounded_by_trim_and_counterpart_fade() {
        let (mut l, mut t) = pair();
        drag(&mut t, Lane::Trim, 30.0);
        drag(&mut t, Lane::Fade, 10.0);
        drag(&mut l, Lane::Fade, 25.0);
        assert_eq!(l.targets().fade_x, 10.0);
        drag(&mut l, Lane::Trim, -20.0);
        drag(&mut l, Lane::Fade, -40.0);
        assert_eq!(l.targets().fade_x, -20.0);
    }

    #[test]
    fn trailing_fade_mirrors() {
        let (mut l, mut t) = pair();
        drag(&mut l, Lane::Trim, -30.0);
        drag(&mut l, Lane::Fade, -10.0);
        drag(&mut t, Lane::Fade, -25.0);
        assert_eq!(t.targets().fade_x, -10.0);
        drag(&mut t, Lane::Fade, 80.0);
        assert_eq!(t.targets().fade_x, 50.0);
        assert!(t.fade_modified());
    }

    #[test]
    fn validate_snaps_inverted_fade() {
        let (mut l, mut t) = pair();
        l.restore(0.4, 0.3);
        assert!(l.validate());
        assert_eq!(l.targets().fade_x, l.targets().trim_x);
        assert!(!l.fade_modified());
        assert!(!l.validate());

        t.restore(0.6, 0.9);
        assert!(t.validate());
        assert_eq!(t.targets().fade_x, t.targets().trim_x);
    }

    #[test]
    fn validate_keeps_fade_inside_counterpart_trim() {
        let (mut l, mut t) = pair();
        drag(&mut l, Lane::Fade, 20.0);
        drag(&mut t, Lane::Trim, 0.0);
        l.validate();
        assert_eq!(l.targets().fade_x, 0.0);
        assert!(l.fade_modified());
    }

    #[test]
    fn missing_counterpart_falls_back_to_edges() {
        let (mut l, t) = pair();
        drop(t);
        let change = drag(&mut l, Lane::Trim, 80.0).unwrap();
        assert_eq!(change.trim, 1.0);
        let mut lone = HandleController::new(Side::Trailing, W, HandleConfig::default());
        drag(&mut lone, Lane::Trim, -80.0);
        assert_eq!(lone.targets().trim_x, -50.0);
    }

    #[test]
    fn notifications_use_targets_not_rendered() {
        let (mut l, _t) = pair();
        l.begin_drag(Lane::Trim);
        let change = l.pointer_drag(0.0).unwrap();
        assert_eq!(change.trim, 0.5);
        assert_eq!(l.rendered().trim_x, -50.0);

        l.advance(0.016);
        let r = l.rendered().trim_x;
        assert!(r > -50.0 && r < 0.0);
        l.advance(10.0);
        assert_eq!(l.rendered().trim_x, 0.0);
    }

    #[test]
    fn zero_rate_renders_instantly() {
        let cfg = HandleConfig { smoothing_rate: 0.0, ..HandleConfig::default() };
        let (mut l, _t) = linked_pair(W, cfg);
        drag(&mut l, Lane::Trim, -10.0);
        l.advance(0.001);
        assert_eq!(l.rendered().trim_x, -10.0);
    }

    #[test]
    fn tiny_drags_are_dropped_but_release_always_reports() {
        let (mut l, _t) = pair();
        l.begin_drag(Lane::Trim);
        assert!(l.pointer_drag(-50.0 + 1e-6).is_none());
        let last = l.pointer_up().unwrap();
        assert_eq!(last.trim, 0.0);
        assert!(l.pointer_up().is_none());
        assert!(l.pointer_drag(0.0).is_none());
    }

    #[test]
    fn pointer_down_needs_a_hit() {
        let (mut l, _t) = pair();
        assert!(!l.pointer_down(-40.0, Lane::Trim));
        assert_eq!(l.mode(), DragMode::Idle);
        assert!(l.pointer_down(-49.0, Lane::Fade));
        assert_eq!(l.mode(), DragMode::DraggingFade);
    }

    #[test]
    fn restore_is_silent_and_exact() {
        let (mut l, _t) = pair();
        l.begin_drag(Lane::Trim);
        l.restore(0.25, 0.5);
        assert_eq!(l.mode(), DragMode::Idle);
        assert_eq!(l.normalized(), (0.25, 0.5));
        assert_eq!(l.rendered().trim_x, l.targets().trim_x);
        assert!(l.fade_modified());
        assert!(l.pointer_up().is_none());
    }

    #[test]
    fn resize_keeps_normalized_positions() {
        let (mut l, mut t) = pair();
        l.restore(0.2, 0.3);
        t.restore(0.9, 0.7);
        l.set_panel_width(250.0);
        t.set_panel_width(250.0);
        let (lt, lf) = l.normalized();
        assert!((lt - 0.2).abs() < 1e-12 && (lf - 0.3).abs() < 1e-12);
        let (tt, tf) = t.normalized();
        assert!((tt - 0.9).abs() < 1e-12 && (tf - 0.7).abs() < 1e-12);
        assert_eq!(l.panel_width(), 250.0);
    }

    #[test]
    fn random_drags_never_break_ordering() {
        let mut rng = StdRng::seed_from_u64(0x7121_0f4d);
        let (mut l, mut t) = pair();
        for _ in 0..5_000 {
            let lane = if rng.gen_bool(0.5) { Lane::Trim } else { Lane::Fade };
            let h = if rng.gen_bool(0.5) { &mut l } else { &mut t };
            h.begin_drag(lane);
            for _ in 0..rng.gen_range(1..4) {
                h.pointer_drag(rng.gen_range(-80.0..80.0));
            }
            h.pointer_up();
            l.validate();
            t.validate();

            let (lt, lf) = l.normalized();
            let (tt, tf) = t.normalized();
            assert!(lt <= tt, "trim_in {lt} > trim_out {tt}");
            assert!(lf >= lt, "fade_in {lf} < trim_in {lt}");
            assert!(tf <= tt, "fade_out {tf} > trim_out {tt}");
            for v in [lt, lf, tt, tf] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
