// One stereo frame. Everything inside the engine is stereo; the device
// layout is only dealt with when copying out.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn mono(x: f32) -> Self {
        Self { left: x, right: x }
    }
}

/// Copies stereo frames into an interleaved device buffer with `channels`
/// channels. Mono gets the average; channels past the second stay silent.
pub fn interleave(frames: &[StereoFrame], out: &mut [f32], channels: usize) {
    if channels == 0 {
        return;
    }
    for (frame, slot) in frames.iter().zip(out.chunks_exact_mut(channels)) {
        match slot {
            [m] => *m = 0.5 * (frame.left + frame.right),
            [l, r, rest @ ..] => {
                *l = frame.left;
                *r = frame.right;
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_handles_device_layouts() {
        let frames = [StereoFrame { left: 1.0, right: 0.0 }, StereoFrame::mono(0.5)];

        let mut mono = [9.0; 2];
        interleave(&frames, &mut mono, 1);
        assert_eq!(mono, [0.5, 0.5]);

        let mut quad = [9.0; 8];
        interleave(&frames, &mut quad, 4);
        assert_eq!(quad, [1.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0]);
    }
}
