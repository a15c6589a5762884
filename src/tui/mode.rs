use ratatui::layout::Rect;

// state local to the tui; the timeline rect is refreshed after every draw
// so mouse cells can be turned into panel positions
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub timeline: Rect,
    pub dragging: bool, // left button went down inside the timeline
}
