use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use super::mode::TuiState;
use crate::region::{Lane, mapper};
use crate::shared::InputEvent;

// poll for input, then drain whatever else is already queued so a fast
// drag doesn't fall behind the pointer
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }
    let mut events = Vec::new();
    loop {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => events.extend(handle_key(key.code)),
            Event::Mouse(m) => events.extend(handle_mouse(m, ts)),
            _ => {}
        }
        if !event::poll(Duration::ZERO)? {
            break;
        }
    }
    Ok(events)
}

fn handle_key(code: KeyCode) -> Option<InputEvent> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => Some(InputEvent::Quit),
        KeyCode::Char(' ') => Some(InputEvent::PlayPress),
        KeyCode::Char('l') => Some(InputEvent::ToggleLoop),
        KeyCode::Up | KeyCode::Char('k') => Some(InputEvent::SelectPrev),
        KeyCode::Down | KeyCode::Char('j') => Some(InputEvent::SelectNext),
        KeyCode::Delete | KeyCode::Char('d') => Some(InputEvent::RemoveSource),
        _ => None,
    }
}

fn handle_mouse(m: MouseEvent, ts: &mut TuiState) -> Option<InputEvent> {
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let (x, lane) = pointer_from_cell(m.column, m.row, ts.timeline)?;
            ts.dragging = true;
            Some(InputEvent::PointerDown { x, lane })
        }
        // once grabbed, the handle follows the pointer even outside the panel
        MouseEventKind::Drag(MouseButton::Left) if ts.dragging => Some(InputEvent::PointerDrag {
            x: column_to_panel(m.column, ts.timeline),
        }),
        MouseEventKind::Up(MouseButton::Left) if ts.dragging => {
            ts.dragging = false;
            Some(InputEvent::PointerUp)
        }
        _ => None,
    }
}

/// Panel position and lane under a terminal cell, if it is on the timeline.
/// The upper half of the panel is the fade lane, the lower half the trim lane.
pub fn pointer_from_cell(column: u16, row: u16, area: Rect) -> Option<(f64, Lane)> {
    if area.width == 0 || area.height == 0 || !area.contains(Position { x: column, y: row }) {
        return None;
    }
    let lane = if row - area.y < area.height / 2 { Lane::Fade } else { Lane::Trim };
    Some((column_to_panel(column, area), lane))
}

fn column_to_panel(column: u16, area: Rect) -> f64 {
    mapper::cell_to_panel(column.saturating_sub(area.x), area.width)
}
