mod audio;
mod audio_api;
mod config;
mod loader;
mod middle;
mod pipeline;
mod region;
mod shared;
mod tui;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

use middle::Middle;
use pipeline::persistence;
use shared::InputEvent;

const LOG_FILE: &str = "trimloop.log";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    // saved paths are compared against freshly indexed ones
    let project_dir = std::fs::canonicalize(&project_dir).unwrap_or(project_dir);

    init_logging(&project_dir)?;
    log::info!("opening {}", project_dir.display());

    let settings = config::load_settings(&project_dir);
    let project = persistence::load_project(&project_dir);
    let wav_paths = loader::sample_loader::index_wav_in_dir(&project_dir).unwrap_or_else(|e| {
        log::warn!("could not list {}: {e}", project_dir.display());
        Vec::new()
    });

    let mut audio = audio::start_audio()?;
    let mut middle = Middle::new(&settings);
    middle.open_project(project, &wav_paths, &mut audio);
    if middle.active().is_none() {
        log::info!("no sources yet; put some .wav files in {}", project_dir.display());
    } else {
        log::info!("{} sources ready", middle.store().len());
    }

    terminal::enable_raw_mode()?;
    // Keyboard enhancement gives real press/release kinds; ignored where unsupported.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        ),
        EnableMouseCapture
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(settings.tick_ms);
    let mut last_tick = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let ds = middle.display_state();
        let mut timeline = Rect::default();
        term.draw(|frame| {
            timeline = tui::view::render(frame, frame.area(), &ds);
        })?;
        tui_state.timeline = timeline;
        middle.set_panel_width(timeline.width as f64);

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                let state = middle.save_point(&mut audio);
                if let Err(e) = persistence::save_project(&project_dir, &state) {
                    log::error!("could not save project: {e:#}");
                }
                log::info!("bye");
                return Ok(());
            }
            middle.handle_input(event, &mut audio);
        }

        let elapsed = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        middle.tick(elapsed, &mut audio);
    }
}

// The terminal belongs to the TUI, so the log goes to a file in the project.
fn init_logging(project_dir: &Path) -> anyhow::Result<()> {
    let dir = project_dir.join(persistence::TRIMLOOP_DIR);
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
        .context("opening log file")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            DisableMouseCapture,
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
