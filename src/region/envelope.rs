// Fade envelope: how loud a source should be at a given absolute position.
//
//   gain
//   1 |        ________________
//     |       /                \
//   0 |______/                  \______
//          in_start in_end  out_start out_end

use crate::pipeline::SourceRegionState;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeEnvelope {
    pub fade_in_start: f64,
    pub fade_in_end: f64,
    pub fade_out_start: f64,
    pub fade_out_end: f64,
}

impl FadeEnvelope {
    pub fn from_state(state: &SourceRegionState) -> Self {
        let fade_in_start = state.trim_in * state.total_duration;
        let fade_out_end = state.trim_out * state.total_duration;
        Self {
            fade_in_start,
            fade_in_end: fade_in_start + state.fade_in_duration,
            fade_out_start: fade_out_end - state.fade_out_duration,
            fade_out_end,
        }
    }

    /// Gain in [0, 1] at `position` seconds. A zero-length fade is a hard step
    /// at its boundary. Where the two ramps overlap the quieter one wins.
    pub fn gain_at(&self, position: f64) -> f32 {
        let fade_in = ramp_up(position, self.fade_in_start, self.fade_in_end);
        let fade_out = ramp_down(position, self.fade_out_start, self.fade_out_end);
        fade_in.min(fade_out) as f32
    }
}

fn ramp_up(position: f64, start: f64, end: f64) -> f64 {
    if end <= start {
        return if position >= start { 1.0 } else { 0.0 };
    }
    ((position - start) / (end - start)).clamp(0.0, 1.0)
}

fn ramp_down(position: f64, start: f64, end: f64) -> f64 {
    if end <= start {
        return if position >= end { 0.0 } else { 1.0 };
    }
    ((end - position) / (end - start)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SourceId;

    fn state(dur: f64, trim_in: f64, fade_in: f64, fade_out: f64, trim_out: f64) -> SourceRegionState {
        let mut s = SourceRegionState::new(SourceId(0));
        s.is_assigned = true;
        s.total_duration = dur;
        s.trim_in = trim_in;
        s.trim_out = trim_out;
        s.fade_in_point.x = fade_in;
        s.fade_out_point.x = fade_out;
        s.recompute_fade_durations();
        s
    }

    #[test]
    fn default_region_is_full_volume() {
        let env = FadeEnvelope::from_state(&state(10.0, 0.0, 0.0, 1.0, 1.0));
        for i in 0..100 {
            assert_eq!(env.gain_at(i as f64 * 0.1), 1.0);
        }
    }

    #[test]
    fn linear_fade_in() {
        // trim 0.2, fade 0.3 over 10 s: a one second ramp starting at 2 s
        let env = FadeEnvelope::from_state(&state(10.0, 0.2, 0.3, 1.0, 1.0));
        assert!((env.gain_at(2.0) - 0.0).abs() < 1e-6);
        assert!((env.gain_at(2.25) - 0.25).abs() < 1e-6);
        assert!((env.gain_at(2.5) - 0.5).abs() < 1e-6);
        assert!((env.gain_at(3.0) - 1.0).abs() < 1e-6);
        assert_eq!(env.gain_at(5.0), 1.0);
    }

    #[test]
    fn linear_fade_out() {
        let env = FadeEnvelope::from_state(&state(10.0, 0.0, 0.0, 0.6, 0.8));
        assert_eq!(env.gain_at(5.0), 1.0);
        assert!((env.gain_at(6.0) - 1.0).abs() < 1e-6);
        assert!((env.gain_at(7.0) - 0.5).abs() < 1e-6);
        assert!(env.gain_at(8.0).abs() < 1e-6);
        assert_eq!(env.gain_at(9.0), 0.0);
    }

    #[test]
    fn zero_length_fades_are_steps() {
        let env = FadeEnvelope::from_state(&state(10.0, 0.2, 0.2, 0.8, 0.8));
        assert_eq!(env.gain_at(1.99), 0.0);
        assert_eq!(env.gain_at(2.0), 1.0);
        assert_eq!(env.gain_at(7.99), 1.0);
        assert_eq!(env.gain_at(8.0), 0.0);
    }

    #[test]
    fn overlapping_ramps_take_the_quieter() {
        let env = FadeEnvelope::from_state(&state(10.0, 0.0, 0.6, 0.4, 1.0));
        assert!((env.gain_at(5.0) - 5.0 / 6.0).abs() < 1e-6);
        assert!((env.gain_at(3.0) - 0.5).abs() < 1e-6);
        assert!((env.gain_at(7.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn continuous_at_every_boundary() {
        let configs = [
            (10.0, 0.0, 0.0, 1.0, 1.0),
            (10.0, 0.1, 0.3, 0.7, 0.9),
            (3.5, 0.25, 0.25, 0.5, 0.75),
            (120.0, 0.0, 0.5, 0.5, 1.0),
            (1.0, 0.4, 0.45, 0.55, 0.6),
        ];
        for (dur, ti, fi, fo, to) in configs {
            let env = FadeEnvelope::from_state(&state(dur, ti, fi, fo, to));
            if env.fade_in_end <= env.fade_out_start {
                assert!((env.gain_at(env.fade_in_end) - 1.0).abs() < 1e-6);
                assert!((env.gain_at(env.fade_out_start) - 1.0).abs() < 1e-6);
            }
            assert!(env.gain_at(env.fade_out_end).abs() < 1e-6);
        }
    }
}
