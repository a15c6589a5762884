use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, Paragraph};

use super::timeline::Timeline;
use crate::shared::{DisplayState, SourceRow};

const HELP: &str = "space play/stop  l loop  ↑↓ select  d remove  q quit";

// Draws one frame. Returns the timeline's inner rect so input can map
// mouse cells onto it.
pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) -> Rect {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // timeline
            Constraint::Length(3), // transport
            Constraint::Min(3),    // sources
            Constraint::Length(1), // status
        ])
        .split(area);

    let timeline = draw_timeline(frame, sections[0], state);
    draw_transport(frame, sections[1], state);
    draw_sources(frame, sections[2], state);
    draw_status(frame, sections[3], state);
    timeline
}

fn draw_timeline(frame: &mut Frame, area: Rect, state: &DisplayState) -> Rect {
    let title = if state.timeline.editable { " region " } else { " region (no audio) " };
    let block = Block::bordered().title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Timeline::new(&state.timeline), inner);
    inner
}

fn draw_transport(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let looping = state.timeline.loop_span.is_some();
    let line = Line::from(vec![
        Span::raw(format!(" {}  ", state.position_text)),
        Span::styled(format!("[{}]  ", state.range_text), Style::default().fg(Color::Yellow)),
        Span::raw(format!("gain {:>4.2}  ", state.gain)),
        Span::styled(
            if looping { "LOOP" } else { "one-shot" },
            Style::default().fg(if looping { Color::Cyan } else { Color::DarkGray }),
        ),
    ]);
    frame.render_widget(Paragraph::new(line).block(Block::bordered()), area);
}

fn draw_sources(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let items: Vec<ListItem> = state.sources.iter().map(source_item).collect();
    let list = List::new(items).block(Block::bordered().title(" sources "));
    frame.render_widget(list, area);
}

fn source_item(row: &SourceRow) -> ListItem<'static> {
    let marker = if row.active { "▶ " } else { "  " };
    let mut style = if row.assigned { Style::default() } else { Style::default().fg(Color::DarkGray) };
    if row.active {
        style = style.add_modifier(Modifier::BOLD);
    }
    let mut flags = String::new();
    if row.playing {
        flags.push_str(" ♪");
    }
    if row.looping {
        flags.push_str(" ↻");
    }
    if !row.assigned {
        flags.push_str(" (missing)");
    }
    ListItem::new(Line::from(vec![
        Span::styled(format!("{marker}{} {}", row.id, row.label), style),
        Span::styled(flags, Style::default().fg(Color::LightMagenta)),
    ]))
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let text = if state.status.is_empty() { HELP.to_string() } else { format!("{}  |  {HELP}", state.status) };
    frame.render_widget(Paragraph::new(text).style(Style::default().fg(Color::DarkGray)), area);
}
