use std::sync::Arc;

use crate::pipeline::SourceId;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::stream_cell::StreamCell;

#[derive(Clone, Copy, Debug)]
struct Release {
    left: usize,
    total: usize,
}

// One loaded stream on the render thread. Plays straight through its
// buffer at unit rate; everything else (looping, stopping at trim-out) is
// decided on the control side and arrives as commands.
#[derive(Debug)]
pub struct Voice {
    pub source: SourceId,
    buffer: Arc<SampleBuffer>,
    cell: Arc<StreamCell>,
    pos: usize,
    epoch: u64,
    playing: bool,
    gain: f32,
    target_gain: f32,
    release: Option<Release>,
}

impl Voice {
    pub fn new(source: SourceId, buffer: Arc<SampleBuffer>, cell: Arc<StreamCell>) -> Self {
        let epoch = cell.epoch();
        Self {
            source,
            buffer,
            cell,
            pos: 0,
            epoch,
            playing: false,
            gain: 1.0,
            target_gain: 1.0,
            release: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[cfg(test)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, frame: usize, epoch: u64) {
        self.pos = frame.min(self.buffer.data.len());
        self.epoch = epoch;
    }

    pub fn start(&mut self) {
        self.playing = true;
        self.release = None;
    }

    /// `release_frames` is how long a non-immediate stop takes to fade out.
    pub fn stop(&mut self, immediate: bool, release_frames: usize) {
        if immediate || release_frames == 0 {
            self.playing = false;
            self.release = None;
        } else if self.playing && self.release.is_none() {
            self.release = Some(Release { left: release_frames, total: release_frames });
        }
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.target_gain = gain.clamp(0.0, 1.0);
    }

    // the jump is already a discontinuity, so the gain jumps with it
    pub fn restart(&mut self, frame: usize, epoch: u64, gain: f32) {
        self.seek(frame, epoch);
        self.gain = gain.clamp(0.0, 1.0);
        self.target_gain = self.gain;
        self.start();
    }

    // mixes this voice into `out`; gain moves linearly to its target over the block
    pub fn render_into(&mut self, out: &mut [StereoFrame]) {
        if !self.playing || out.is_empty() {
            return;
        }
        let data = &self.buffer.data;
        let step = (self.target_gain - self.gain) / out.len() as f32;

        for frame in out.iter_mut() {
            let Some(s) = data.get(self.pos) else {
                self.playing = false;
                break;
            };
            let mut amp = self.gain;
            if let Some(r) = self.release.as_mut() {
                if r.left == 0 {
                    self.playing = false;
                    break;
                }
                amp *= r.left as f32 / r.total as f32;
                r.left -= 1;
            }
            frame.left += s.left * amp;
            frame.right += s.right * amp;
            self.gain += step;
            self.pos += 1;
        }

        self.gain = self.target_gain;
        if !self.playing {
            self.release = None;
        }
    }

    pub fn publish(&self) {
        self.cell.publish(self.epoch, self.buffer.secs_at(self.pos));
    }
}
