// The region editor: fade lane on top, trim lane underneath.
//
//   fade  |      ▂▄▆███████████▆▄▂       |
//   trim  |░░░░[━━━━━━━━━━━━━━━━━━━━━]░░░|

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;

use crate::region::mapper;
use crate::shared::TimelineView;

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub struct Timeline<'a> {
    view: &'a TimelineView,
}

impl<'a> Timeline<'a> {
    pub fn new(view: &'a TimelineView) -> Self {
        Self { view }
    }

    fn column(&self, x: f64, area: Rect) -> u16 {
        area.x + mapper::panel_to_cell(x, area.width)
    }

    // envelope shape from the handle positions, 0..1
    fn shape_at(&self, x: f64) -> f64 {
        let v = self.view;
        if x < v.leading_trim || x > v.trailing_trim {
            return 0.0;
        }
        let up = if v.leading_fade > v.leading_trim {
            (x - v.leading_trim) / (v.leading_fade - v.leading_trim)
        } else {
            1.0
        };
        let down = if v.trailing_trim > v.trailing_fade {
            (v.trailing_trim - x) / (v.trailing_trim - v.trailing_fade)
        } else {
            1.0
        };
        up.min(down).clamp(0.0, 1.0)
    }
}

impl Widget for Timeline<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let v = self.view;
        let fade_rows = area.height / 2;
        let trim_top = area.y + fade_rows;
        let dim = !v.editable;
        let base = if dim { Style::default().fg(Color::DarkGray) } else { Style::default() };

        let loop_cols = v
            .loop_span
            .map(|(start, end)| (self.column(start, area), self.column(end, area)));
        let lead_col = self.column(v.leading_trim, area);
        let trail_col = self.column(v.trailing_trim, area);

        for col in area.x..area.right() {
            let x = mapper::cell_to_panel(col - area.x, area.width);
            let in_loop = loop_cols.is_some_and(|(a, b)| col >= a && col <= b);
            let bg = if in_loop { Style::default().bg(Color::Rgb(40, 40, 70)) } else { Style::default() };

            // fade lane, filled bottom-up to the envelope height
            let level = self.shape_at(x) * fade_rows as f64;
            for r in 0..fade_rows {
                let y = trim_top - 1 - r;
                let fill = (level - r as f64).clamp(0.0, 1.0);
                let ch = if fill <= 0.0 {
                    ' '
                } else {
                    LEVELS[((fill * 8.0).ceil() as usize).clamp(1, 8) - 1]
                };
                put(buf, col, y, ch, base.patch(bg).fg(if dim { Color::DarkGray } else { Color::Green }));
            }

            // trim lane
            let inside = col >= lead_col && col <= trail_col;
            let (ch, style) = if inside {
                ('━', base.patch(bg))
            } else {
                ('░', Style::default().fg(Color::DarkGray))
            };
            for y in trim_top..area.bottom() {
                put(buf, col, y, ch, style);
            }
        }

        if let Some(x) = v.playhead {
            let col = self.column(x, area);
            let style = Style::default().fg(Color::LightMagenta);
            for y in area.y..area.bottom() {
                put(buf, col, y, '│', style);
            }
        }

        let handle = |color: Color| {
            let s = Style::default().fg(color).add_modifier(Modifier::BOLD);
            if dim { s.fg(Color::DarkGray) } else { s }
        };
        for y in trim_top..area.bottom() {
            put(buf, lead_col, y, '[', handle(Color::Yellow));
            put(buf, trail_col, y, ']', handle(Color::Yellow));
        }
        if fade_rows > 0 {
            let glyph = |moved: bool| if moved { '◆' } else { '◇' };
            let (lead_moved, trail_moved) = v.fades_moved;
            put(buf, self.column(v.leading_fade, area), area.y, glyph(lead_moved), handle(Color::Cyan));
            put(buf, self.column(v.trailing_fade, area), area.y, glyph(trail_moved), handle(Color::Cyan));
        }
    }
}

fn put(buf: &mut Buffer, x: u16, y: u16, ch: char, style: Style) {
    if let Some(cell) = buf.cell_mut(Position { x, y }) {
        cell.set_char(ch).set_style(style);
    }
}
