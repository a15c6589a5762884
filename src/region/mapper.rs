// Every conversion between timeline spaces lives here.
//
//   normalized: 0.0 = start of file, 1.0 = end of file
//   panel:      pixels relative to the panel centre, [-W/2, W/2]
//   cell:       terminal column offset inside the panel, 0..W

pub fn normalized_to_panel(n: f64, width: f64) -> f64 {
    n * width - width / 2.0
}

pub fn panel_to_normalized(x: f64, width: f64) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (x + width / 2.0) / width
}

pub fn panel_edges(width: f64) -> (f64, f64) {
    (-width / 2.0, width / 2.0)
}

/// Column 0 lands on the left edge and the last column on the right edge,
/// so both ends of the file can be reached with the pointer.
pub fn cell_to_panel(column: u16, width: u16) -> f64 {
    let w = width as f64;
    if width <= 1 {
        return normalized_to_panel(0.0, w);
    }
    let n = column.min(width - 1) as f64 / (w - 1.0);
    normalized_to_panel(n, w)
}

pub fn panel_to_cell(x: f64, width: u16) -> u16 {
    if width <= 1 {
        return 0;
    }
    let n = panel_to_normalized(x, width as f64).clamp(0.0, 1.0);
    (n * (width - 1) as f64).round() as u16
}

pub fn normalized_to_cell(n: f64, width: u16) -> u16 {
    panel_to_cell(normalized_to_panel(n, width as f64), width)
}
