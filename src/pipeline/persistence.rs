// Called on startup and quit; keeps source regions between sessions.
use std::path::{Path, PathBuf};

use crate::pipeline::project::ProjectState;

pub const TRIMLOOP_DIR: &str = ".trimloop";
const PROJECT_FILE: &str = "project.json";

// <project_dir>/.trimloop/project.json
fn project_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(TRIMLOOP_DIR).join(PROJECT_FILE)
}

pub fn load_project(project_dir: &Path) -> Option<ProjectState> {
    let path = project_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(state) => Some(state),
        Err(e) => {
            log::warn!("ignoring unreadable {}: {e}", path.display());
            None
        }
    }
}

// Save the project state to disk, making the files if they don't exist already
pub fn save_project(project_dir: &Path, state: &ProjectState) -> anyhow::Result<()> {
    let path = project_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create .trimloop/ if needed
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(&path, json)?;
    log::info!("saved {} sources to {}", state.sources.len(), path.display());
    Ok(())
}
