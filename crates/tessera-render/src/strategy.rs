//! Full, differential, and smart cell-buffer diff strategies. Each produces
//! an ordered list of ANSI byte operations plus stats; the same `(front,
//! back)` pair always produces byte-identical ops in the same order.

use tessera_cell::{CellAttrs, ScreenBuffer};
use tessera_color::{Color, Encoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Full,
    Differential,
    Smart,
}

/// Fraction of changed cells at or above which `Strategy::Smart` escalates
/// to a full redraw instead of a differential one.
pub const FULL_REDRAW_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub changed_cells: usize,
    pub sequences: usize,
    pub is_full_render: bool,
    pub strategy_name: &'static str,
}

/// An ordered list of byte blocks (cursor moves, style changes, text runs)
/// ready to be written to the terminal in batches.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    pub ops: Vec<Vec<u8>>,
    pub stats: RenderStats,
}

pub fn compute_patch(strategy: Strategy, front: &ScreenBuffer, back: &ScreenBuffer, encoder: &Encoder) -> Patch {
    match strategy {
        Strategy::Full => full_patch(back, encoder),
        Strategy::Differential => differential_patch(front, back, encoder),
        Strategy::Smart => {
            let dims_changed = front.width() != back.width() || front.height() != back.height();
            let total = (back.width() as usize * back.height() as usize).max(1);
            let changed = front.diff_iter(back).len();
            let mut patch = if dims_changed || changed as f32 / total as f32 >= FULL_REDRAW_THRESHOLD {
                full_patch(back, encoder)
            } else {
                differential_patch(front, back, encoder)
            };
            patch.stats.strategy_name = "smart";
            patch
        }
    }
}

fn full_patch(back: &ScreenBuffer, encoder: &Encoder) -> Patch {
    let mut run = RunBuilder::new();
    run.ops.push(b"\x1b[2J".to_vec());
    let mut changed_cells = 0usize;
    for y in 0..back.height() {
        run.move_to(x_origin(), y);
        for x in 0..back.width() {
            let Some(cell) = back.get(x, y) else { continue };
            if cell.width == 0 {
                continue;
            }
            changed_cells += 1;
            run.push_cell(encoder, cell.fg, cell.bg, cell.attrs, &cell.ch);
        }
    }
    let ops = run.finish();
    let sequences = ops.len();
    Patch {
        ops,
        stats: RenderStats {
            changed_cells,
            sequences,
            is_full_render: true,
            strategy_name: "full",
        },
    }
}

fn differential_patch(front: &ScreenBuffer, back: &ScreenBuffer, encoder: &Encoder) -> Patch {
    let diffs = front.diff_iter(back);
    let mut run = RunBuilder::new();
    let mut changed_cells = 0usize;
    let mut current_row: Option<u16> = None;
    let mut expected_x: u16 = 0;

    for (x, y, cell) in diffs {
        changed_cells += 1;
        let contiguous = current_row == Some(y) && x == expected_x;
        if !contiguous {
            run.move_to(x, y);
            current_row = Some(y);
        }
        run.push_cell(encoder, cell.fg, cell.bg, cell.attrs, &cell.ch);
        expected_x = x + cell.width.max(1) as u16;
    }

    let ops = run.finish();
    let sequences = ops.len();
    Patch {
        ops,
        stats: RenderStats {
            changed_cells,
            sequences,
            is_full_render: false,
            strategy_name: "differential",
        },
    }
}

const fn x_origin() -> u16 {
    0
}

fn move_to_bytes(x: u16, y: u16) -> Vec<u8> {
    format!("\x1b[{};{}H", y + 1, x + 1).into_bytes()
}

fn style_escape(encoder: &Encoder, fg: Color, bg: Color, attrs: CellAttrs) -> Vec<u8> {
    let mut out = encoder.reset();
    out.extend(attrs_escape(attrs));
    out.extend(encoder.fg(fg));
    out.extend(encoder.bg(bg));
    out
}

fn attrs_escape(attrs: CellAttrs) -> Vec<u8> {
    let mut codes: Vec<&str> = Vec::new();
    if attrs.contains(CellAttrs::BOLD) {
        codes.push("1");
    }
    if attrs.contains(CellAttrs::DIM) {
        codes.push("2");
    }
    if attrs.contains(CellAttrs::ITALIC) {
        codes.push("3");
    }
    if attrs.contains(CellAttrs::UNDERLINE) {
        codes.push("4");
    }
    if attrs.contains(CellAttrs::BLINK) {
        codes.push("5");
    }
    if attrs.contains(CellAttrs::REVERSE) {
        codes.push("7");
    }
    if attrs.contains(CellAttrs::STRIKE) {
        codes.push("9");
    }
    if codes.is_empty() {
        return Vec::new();
    }
    format!("\x1b[{}m", codes.join(";")).into_bytes()
}

/// Accumulates a run of same-style text, flushing it as its own op whenever
/// the cursor jumps or the style changes so a batched write can split on op
/// boundaries without splitting an escape sequence.
struct RunBuilder {
    ops: Vec<Vec<u8>>,
    pending_text: String,
    last_style: Option<(Color, Color, CellAttrs)>,
}

impl RunBuilder {
    fn new() -> Self {
        Self {
            ops: Vec::new(),
            pending_text: String::new(),
            last_style: None,
        }
    }

    fn move_to(&mut self, x: u16, y: u16) {
        self.flush_text();
        self.ops.push(move_to_bytes(x, y));
    }

    fn push_cell(&mut self, encoder: &Encoder, fg: Color, bg: Color, attrs: CellAttrs, ch: &str) {
        let style = (fg, bg, attrs);
        if self.last_style != Some(style) {
            self.flush_text();
            self.ops.push(style_escape(encoder, fg, bg, attrs));
            self.last_style = Some(style);
        }
        self.pending_text.push_str(ch);
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            self.ops.push(std::mem::take(&mut self.pending_text).into_bytes());
        }
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        self.flush_text();
        self.ops
    }
}
