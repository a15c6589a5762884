// One record per audio source: what file it plays, where its region is,
// and what the playback engine last told us about it.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

// x is normalized timeline position, y is the fade curve height (unused by the envelope)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRegionState {
    pub source_id: SourceId,
    pub file_path: String,

    // runtime only; rebuilt from the engine on startup
    #[serde(skip)]
    pub is_assigned: bool,
    #[serde(skip)]
    pub is_active: bool,
    #[serde(skip)]
    pub is_playing: bool,
    #[serde(skip)]
    pub total_duration: f64,

    pub is_looping: bool,
    pub playback_position: f64, // seconds

    pub trim_in: f64,
    pub trim_out: f64,
    pub fade_in_point: Point,
    pub fade_out_point: Point,

    // cached from the fade points, see recompute_fade_durations()
    #[serde(skip)]
    pub fade_in_duration: f64,
    #[serde(skip)]
    pub fade_out_duration: f64,
}

impl SourceRegionState {
    pub fn new(source_id: SourceId) -> Self {
        Self {
            source_id,
            file_path: String::new(),
            is_assigned: false,
            is_active: false,
            is_playing: false,
            total_duration: 0.0,
            is_looping: false,
            playback_position: 0.0,
            trim_in: 0.0,
            trim_out: 1.0,
            fade_in_point: Point::new(0.0, 0.0),
            fade_out_point: Point::new(1.0, 0.0),
            fade_in_duration: 0.0,
            fade_out_duration: 0.0,
        }
    }

    /// Normalized values mean nothing until the engine has reported a duration.
    pub fn is_ready(&self) -> bool {
        self.is_assigned && self.total_duration > 0.0
    }

    pub fn recompute_fade_durations(&mut self) {
        self.fade_in_duration = (self.fade_in_point.x - self.trim_in).abs() * self.total_duration;
        self.fade_out_duration = (self.trim_out - self.fade_out_point.x).abs() * self.total_duration;
    }

    pub fn trim_in_secs(&self) -> f64 {
        self.trim_in * self.total_duration
    }

    pub fn trim_out_secs(&self) -> f64 {
        self.trim_out * self.total_duration
    }

    /// Pulls every normalized field back inside its invariants and refreshes
    /// the derived durations. Returns true if anything had to be corrected.
    pub fn normalize(&mut self) -> bool {
        let before = (
            self.trim_in,
            self.trim_out,
            self.fade_in_point.x,
            self.fade_out_point.x,
        );

        self.trim_in = unit(self.trim_in);
        self.trim_out = unit(self.trim_out);
        if self.trim_in > self.trim_out {
            let mid = (self.trim_in + self.trim_out) * 0.5;
            self.trim_in = mid;
            self.trim_out = mid;
        }
        self.fade_in_point.x = unit(self.fade_in_point.x).clamp(self.trim_in, self.trim_out);
        self.fade_out_point.x = unit(self.fade_out_point.x).clamp(self.trim_in, self.trim_out);

        if !self.total_duration.is_finite() || self.total_duration < 0.0 {
            self.total_duration = 0.0;
        }
        if !self.playback_position.is_finite() || self.playback_position < 0.0 {
            self.playback_position = 0.0;
        }
        self.recompute_fade_durations();

        let after = (
            self.trim_in,
            self.trim_out,
            self.fade_in_point.x,
            self.fade_out_point.x,
        );
        before != after
    }
}

// NaN lands on 0 so a bad write can't poison the clamps downstream
fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
