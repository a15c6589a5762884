use std::path::Path;

use super::frame::StereoFrame;

#[derive(Clone, Debug)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>, // already at the output rate
    pub sample_rate: u32,
    pub source_channels: u16, // what the file had, before folding to stereo
}

impl SampleBuffer {
    pub fn from_frames(data: Vec<StereoFrame>, sample_rate: u32, source_channels: u16) -> Self {
        Self { data, sample_rate: sample_rate.max(1), source_channels }
    }

    // Load a WAV file and bring it to `target_rate`, stereo
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let file_rate = spec.sample_rate;
        let file_channels = spec.channels;
        if file_channels == 0 {
            anyhow::bail!("{} has no channels", path.display());
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        // mono duplicates, anything wider keeps its first two channels
        let frames: Vec<StereoFrame> = samples
            .chunks_exact(file_channels as usize)
            .map(|c| match c {
                [x] => StereoFrame::mono(*x),
                [l, r, ..] => StereoFrame { left: *l, right: *r },
                [] => StereoFrame::zero(),
            })
            .collect();

        let frames = resample_linear(&frames, file_rate, target_rate);
        Ok(Self::from_frames(frames, target_rate, file_channels))
    }

    pub fn duration_secs(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate as f64
    }

    pub fn secs_at(&self, frame: usize) -> f64 {
        frame as f64 / self.sample_rate as f64
    }

    /// Nearest frame for `seconds`, clamped to the buffer.
    pub fn frame_at(&self, seconds: f64) -> usize {
        let f = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        f.min(self.data.len())
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || source_rate == 0 {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;
        if idx >= frames.len().saturating_sub(1) {
            out.push(*frames.last().unwrap_or(&StereoFrame::zero()));
        } else {
            let a = frames[idx];
            let b = frames[idx + 1];
            out.push(StereoFrame {
                left: a.left * (1.0 - frac) + b.left * frac,
                right: a.right * (1.0 - frac) + b.right * frac,
            });
        }
    }
    out
}
