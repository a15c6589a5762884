use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::{AudioCommand, EngineError, PlaybackEngine, StreamInfo};
use crate::loader::sample_loader;
use crate::pipeline::SourceId;

mod engine;
mod frame;
mod sample_buffer;
mod stream_cell;
mod voice;

pub use sample_buffer::SampleBuffer;
pub use stream_cell::StreamCell;

use engine::{Engine, MAX_STREAMS};
use frame::StereoFrame;
use voice::Voice;

const COMMAND_QUEUE: usize = 1024;
const MAX_BLOCK_FRAMES: usize = 4096; // device blocks bigger than this are rendered in pieces

struct StreamEntry {
    cell: Arc<StreamCell>,
    buffer: Arc<SampleBuffer>,
}

impl StreamEntry {
    // The cell only moves once the command is queued. A refused seek leaves
    // the voice's epoch and its published position alone, so the next tick
    // still sees where the stream really is.
    fn queue_seek(
        &self,
        tx: &Sender<AudioCommand>,
        source: SourceId,
        seconds: f64,
        restart_gain: Option<f32>,
    ) -> Result<(), EngineError> {
        let frame = self.buffer.frame_at(seconds);
        let epoch = self.cell.next_epoch();
        let cmd = match restart_gain {
            Some(gain) => AudioCommand::Restart { source, frame, epoch, gain },
            None => AudioCommand::Seek { source, frame, epoch },
        };
        tx.try_send(cmd).map_err(|_| EngineError::QueueFull)?;
        self.cell.begin_seek(epoch, self.buffer.secs_at(frame));
        Ok(())
    }
}

// Control-side end of the audio thread. Sends commands, reads positions
// back from each stream's cell.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    retired: Receiver<Voice>, // released voices, dropped here instead of in the callback
    sample_rate: u32,
    streams: HashMap<SourceId, StreamEntry>,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    fn send(&self, cmd: AudioCommand) -> Result<(), EngineError> {
        self.reap();
        self.tx.try_send(cmd).map_err(|_| EngineError::QueueFull)
    }

    fn reap(&self) {
        for voice in self.retired.try_iter() {
            log::trace!("freed {}", voice.source);
        }
    }

    fn entry(&self, source: SourceId) -> Result<&StreamEntry, EngineError> {
        self.streams.get(&source).ok_or(EngineError::NoStream(source))
    }
}

impl PlaybackEngine for AudioHandle {
    fn create_stream(&mut self, source: SourceId, path: &Path) -> Result<StreamInfo, EngineError> {
        if !self.streams.contains_key(&source) && self.streams.len() >= MAX_STREAMS {
            return Err(EngineError::TooManyStreams);
        }
        let buffer = sample_loader::load(path, self.sample_rate).map_err(|e| EngineError::Load {
            path: path.display().to_string(),
            reason: format!("{e:#}"),
        })?;
        let buffer = Arc::new(buffer);
        let cell = Arc::new(StreamCell::new());
        self.send(AudioCommand::RegisterStream {
            source,
            buffer: buffer.clone(),
            cell: cell.clone(),
        })?;
        let info = StreamInfo {
            duration_secs: buffer.duration_secs(),
            channels: buffer.source_channels,
        };
        self.streams.insert(source, StreamEntry { cell, buffer });
        Ok(info)
    }

    fn release_stream(&mut self, source: SourceId) -> Result<(), EngineError> {
        self.entry(source)?;
        self.send(AudioCommand::ReleaseStream(source))?;
        self.streams.remove(&source);
        Ok(())
    }

    fn seek(&mut self, source: SourceId, seconds: f64) -> Result<(), EngineError> {
        self.reap();
        self.entry(source)?.queue_seek(&self.tx, source, seconds, None)
    }

    fn start(&mut self, source: SourceId) -> Result<(), EngineError> {
        self.entry(source)?;
        self.send(AudioCommand::Start(source))
    }

    fn stop(&mut self, source: SourceId, immediate: bool) -> Result<(), EngineError> {
        self.entry(source)?;
        self.send(AudioCommand::Stop { source, immediate })
    }

    fn position(&self, source: SourceId) -> Result<f64, EngineError> {
        Ok(self.entry(source)?.cell.position())
    }

    fn set_gain(&mut self, source: SourceId, gain: f32) -> Result<(), EngineError> {
        self.entry(source)?;
        self.send(AudioCommand::SetGain { source, gain })
    }

    // one command, so the render thread never plays a block between stop and start
    fn restart_at(&mut self, source: SourceId, seconds: f64, gain: f32) -> Result<(), EngineError> {
        self.reap();
        self.entry(source)?.queue_seek(&self.tx, source, seconds, Some(gain))
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);
    let (retired_tx, retired_rx) = crossbeam_channel::bounded::<Voice>(MAX_STREAMS);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, retired_tx, sample_rate, channels)?;
            output_stream.play().context("failed to play output stream")?;
            log::info!("audio output running at {sample_rate} Hz, {channels} channels");

            Ok(AudioHandle {
                tx,
                retired: retired_rx,
                sample_rate,
                streams: HashMap::new(),
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    retired: Sender<Voice>,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate).with_retired(retired);
    let mut scratch = vec![StereoFrame::zero(); MAX_BLOCK_FRAMES];
    let channels = channels.max(1);

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }
            for chunk in data.chunks_mut(MAX_BLOCK_FRAMES * channels) {
                let n_frames = chunk.len() / channels;
                let block = &mut scratch[..n_frames];
                engine.render_block(block);
                frame::interleave(block, chunk, channels);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(frames: usize) -> StreamEntry {
        let buffer = SampleBuffer::from_frames(vec![StereoFrame::mono(1.0); frames], 1_000, 1);
        StreamEntry {
            cell: Arc::new(StreamCell::new()),
            buffer: Arc::new(buffer),
        }
    }

    #[test]
    fn refused_seek_leaves_the_position_live() {
        let entry = entry(10_000);
        let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1);
        tx.try_send(AudioCommand::Start(SourceId(0))).unwrap();
        assert!(entry.cell.publish(0, 7.96));

        let refused = entry.queue_seek(&tx, SourceId(0), 1.0, Some(1.0));
        assert!(matches!(refused, Err(EngineError::QueueFull)));
        // the voice never heard about it and keeps reporting where it is
        assert!(entry.cell.publish(0, 7.976));
        assert_eq!(entry.cell.position(), 7.976);

        rx.try_recv().unwrap();
        entry.queue_seek(&tx, SourceId(0), 1.0, Some(1.0)).unwrap();
        assert_eq!(entry.cell.position(), 1.0);
        assert!(!entry.cell.publish(0, 7.992));
        match rx.try_recv().unwrap() {
            AudioCommand::Restart { frame, epoch, gain, .. } => {
                assert_eq!(frame, 1_000);
                assert_eq!(epoch, 1);
                assert_eq!(gain, 1.0);
                assert!(entry.cell.publish(epoch, 1.016));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
