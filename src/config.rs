use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pipeline::persistence::TRIMLOOP_DIR;
use crate::region::HandleConfig;
use crate::region::driver::DEFAULT_GUARD_BUFFER_SECS;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub guard_buffer_secs: f64,     // how early a loop wraps before trim-out
    pub smoothing_rate: f64,        // handle easing, per second
    pub align_tolerance_px: f64,    // fade this close to trim counts as "on" it
    pub hit_radius_px: f64,
    pub drag_epsilon_px: f64,
    pub tick_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let handles = HandleConfig::default();
        Self {
            guard_buffer_secs: DEFAULT_GUARD_BUFFER_SECS,
            smoothing_rate: handles.smoothing_rate,
            align_tolerance_px: handles.align_tolerance_px,
            hit_radius_px: handles.hit_radius_px,
            drag_epsilon_px: handles.drag_epsilon_px,
            tick_ms: 16, // ~60fps
        }
    }
}

impl Settings {
    pub fn handle_config(&self) -> HandleConfig {
        HandleConfig {
            align_tolerance_px: self.align_tolerance_px,
            hit_radius_px: self.hit_radius_px,
            drag_epsilon_px: self.drag_epsilon_px,
            smoothing_rate: self.smoothing_rate,
        }
    }

    fn sanitized(mut self) -> Self {
        for v in [
            &mut self.guard_buffer_secs,
            &mut self.smoothing_rate,
            &mut self.align_tolerance_px,
            &mut self.hit_radius_px,
            &mut self.drag_epsilon_px,
        ] {
            if !v.is_finite() || *v < 0.0 {
                *v = 0.0;
            }
        }
        self.tick_ms = self.tick_ms.max(1);
        self
    }
}

pub fn settings_path(project_dir: &Path) -> PathBuf {
    project_dir.join(TRIMLOOP_DIR).join(SETTINGS_FILE)
}

// missing file is normal; a broken one is worth a warning
pub fn load_settings(project_dir: &Path) -> Settings {
    let path = settings_path(project_dir);
    let data = match std::fs::read_to_string(&path) {
        Ok(d) => d,
        Err(_) => return Settings::default(),
    };
    match serde_json::from_str::<Settings>(&data) {
        Ok(s) => s.sanitized(),
        Err(e) => {
            log::warn!("{}: {e}, using defaults", path.display());
            Settings::default()
        }
    }
}
