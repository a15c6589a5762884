use std::path::{Path, PathBuf};

use crate::audio::SampleBuffer;

// Load a WAV from disk, ready to hand to the engine
pub fn load(path: &Path, target_rate: u32) -> anyhow::Result<SampleBuffer> {
    let buffer = SampleBuffer::load_wav(path, target_rate)?;
    log::debug!(
        "loaded {} ({} frames at {} Hz)",
        path.display(),
        buffer.data.len(),
        buffer.sample_rate
    );
    Ok(buffer)
}

/// Every .wav directly inside `dir`, sorted by path.
pub fn index_wav_in_dir(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
