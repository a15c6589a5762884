use crossbeam_channel::Sender;

use crate::audio_api::AudioCommand;
use crate::pipeline::SourceId;

use super::frame::StereoFrame;
use super::voice::Voice;

pub const MAX_STREAMS: usize = 64; // hard cap so we won't malloc in the audio callback
const RELEASE_SECS: f32 = 0.005;

// Lives on the render thread. Only ever touched from inside the output
// callback: drain commands, then render a block.
pub struct Engine {
    voices: Vec<Voice>,
    release_frames: usize,
    retired: Option<Sender<Voice>>,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_STREAMS),
            release_frames: ((sample_rate as f32 * RELEASE_SECS).round() as usize).max(1),
            retired: None,
        }
    }

    /// Voices that go away are sent back here so their buffers are freed
    /// off the render thread.
    pub fn with_retired(mut self, retired: Sender<Voice>) -> Self {
        self.retired = Some(retired);
        self
    }

    #[cfg(test)]
    pub fn stream_count(&self) -> usize {
        self.voices.len()
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterStream { source, buffer, cell } => {
                let voice = Voice::new(source, buffer, cell);
                if let Some(slot) = self.voices.iter_mut().find(|v| v.source == source) {
                    let old = std::mem::replace(slot, voice);
                    self.retire(old);
                } else if self.voices.len() < MAX_STREAMS {
                    self.voices.push(voice);
                }
            }
            AudioCommand::ReleaseStream(source) => {
                if let Some(i) = self.voices.iter().position(|v| v.source == source) {
                    let old = self.voices.swap_remove(i);
                    self.retire(old);
                }
            }
            AudioCommand::Seek { source, frame, epoch } => {
                if let Some(v) = self.voice(source) {
                    v.seek(frame, epoch);
                }
            }
            AudioCommand::Start(source) => {
                if let Some(v) = self.voice(source) {
                    v.start();
                }
            }
            AudioCommand::Stop { source, immediate } => {
                let release = self.release_frames;
                if let Some(v) = self.voice(source) {
                    v.stop(immediate, release);
                }
            }
            AudioCommand::SetGain { source, gain } => {
                if let Some(v) = self.voice(source) {
                    v.set_gain(gain);
                }
            }
            AudioCommand::Restart { source, frame, epoch, gain } => {
                if let Some(v) = self.voice(source) {
                    v.restart(frame, epoch, gain);
                }
            }
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        for v in &mut self.voices {
            // a stopped voice has nothing new to say; seeks publish themselves
            let was_playing = v.is_playing();
            v.render_into(out);
            if was_playing {
                v.publish();
            }
        }
    }

    // a full channel means the control side is behind; dropping here is the fallback
    fn retire(&self, voice: Voice) {
        if let Some(tx) = &self.retired {
            let _ = tx.try_send(voice);
        }
    }

    fn voice(&mut self, source: SourceId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.source == source)
    }
}
