use std::sync::atomic::{AtomicU64, Ordering};

use atomic_float::AtomicF64;

// Where a stream is, shared between the render thread (writer) and the
// control thread (reader). Every seek bumps the epoch; the render thread
// tags what it publishes with the epoch of the last seek it applied, so a
// block rendered before the seek landed can't overwrite the seek target.
#[derive(Debug, Default)]
pub struct StreamCell {
    position: AtomicF64, // seconds
    epoch: AtomicU64,
}

impl StreamCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> f64 {
        self.position.load(Ordering::Acquire)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// The epoch the next seek command should carry.
    pub fn next_epoch(&self) -> u64 {
        self.epoch() + 1
    }

    /// Control side, once the seek command carrying `epoch` is queued. Reads
    /// see `seconds` straight away, even before the render thread has picked
    /// the command up. Never call it for a command that wasn't sent: the
    /// voice would keep its old epoch and every publish would be refused.
    pub fn begin_seek(&self, epoch: u64, seconds: f64) {
        self.epoch.store(epoch, Ordering::Release);
        self.position.store(seconds, Ordering::Release);
    }

    /// Render side. Ignored unless `epoch` is the latest seek.
    pub fn publish(&self, epoch: u64, seconds: f64) -> bool {
        if self.epoch.load(Ordering::Acquire) != epoch {
            return false;
        }
        self.position.store(seconds, Ordering::Release);
        true
    }
}
