// Types passed between the TUI and the middle layer.
//
// Controls:
//   mouse on the timeline  //  drag the trim (lower lane) or fade (upper lane) handles
//   Space                  //  PlayPress, play/stop the selected source
//   l                      //  ToggleLoop
//   Up/Down, k/j           //  SelectPrev / SelectNext
//   d, Delete              //  RemoveSource
//   Esc, q                 //  Quit
//
// The TUI never interprets state; each frame it asks the middle layer for a
// DisplayState and draws exactly that.

use crate::pipeline::SourceId;
use crate::region::Lane;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // pointer, x already in panel space
    PointerDown { x: f64, lane: Lane },
    PointerDrag { x: f64 },
    PointerUp,

    PlayPress,
    ToggleLoop,
    SelectNext,
    SelectPrev,
    SelectSource(SourceId),
    RemoveSource,

    Quit,
}

#[derive(Clone, Debug)]
pub struct SourceRow {
    pub id: SourceId,
    pub label: String,
    pub assigned: bool,
    pub active: bool,
    pub playing: bool,
    pub looping: bool,
}

/// Everything the timeline needs, in panel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimelineView {
    pub panel_width: f64,
    pub leading_trim: f64,
    pub leading_fade: f64,
    pub trailing_trim: f64,
    pub trailing_fade: f64,
    pub fades_moved: (bool, bool), // (leading, trailing) fade no longer sits on its trim
    pub loop_span: Option<(f64, f64)>,
    pub playhead: Option<f64>,
    pub editable: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    pub sources: Vec<SourceRow>,
    pub timeline: TimelineView,
    pub position_text: String, // "1.25 / 10.00 s"
    pub range_text: String,    // "2.00 - 8.00 s"
    pub gain: f32,
    pub status: String,        // last thing that happened
}
