//! Cell, `ScreenBuffer` and `DoubleBuffer`: the grid model the renderer
//! paints into and diffs against.
//!
//! Continuation cells (the second column of a wide grapheme) carry
//! `width == 0` and an empty `ch`; every other invariant described on
//! [`Cell`] flows from that one marker.

pub mod width;

use bitflags::bitflags;
use thiserror::Error;
use tessera_color::Color;
use width::cluster_width;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellAttrs: u8 {
        const BOLD      = 0b0000_0001;
        const DIM       = 0b0000_0010;
        const ITALIC    = 0b0000_0100;
        const UNDERLINE = 0b0000_1000;
        const BLINK     = 0b0001_0000;
        const REVERSE   = 0b0010_0000;
        const STRIKE    = 0b0100_0000;
    }
}

/// One grid position. `dirty` is a scratch flag widgets/paint code may set;
/// it plays no part in `diff_iter` equality, which compares only the
/// visible content (`ch`, `fg`, `bg`, `attrs`, `width`).
#[derive(Debug, Clone)]
pub struct Cell {
    pub ch: String,
    pub fg: Color,
    pub bg: Color,
    pub attrs: CellAttrs,
    pub width: u8,
    pub dirty: bool,
}

impl Cell {
    pub fn new(ch: &str, fg: Color, bg: Color, attrs: CellAttrs) -> Self {
        let width = cluster_width(ch).max(1).min(2) as u8;
        Self {
            ch: ch.to_string(),
            fg,
            bg,
            attrs,
            width,
            dirty: false,
        }
    }

    fn continuation() -> Self {
        Self {
            ch: String::new(),
            fg: Color::Default,
            bg: Color::Default,
            attrs: CellAttrs::empty(),
            width: 0,
            dirty: false,
        }
    }

    pub fn is_leader(&self) -> bool {
        self.width > 0
    }

    fn visible_eq(&self, other: &Cell) -> bool {
        self.ch == other.ch
            && self.fg == other.fg
            && self.bg == other.bg
            && self.attrs == other.attrs
            && self.width == other.width
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::new(" ", Color::Default, Color::Default, CellAttrs::empty())
    }
}

/// Inclusive-exclusive rectangular region within a `ScreenBuffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Region {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub x: u16,
    pub y: u16,
    pub visible: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            visible: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CellError {
    #[error("dimension mismatch: expected {expected_w}x{expected_h}, got {actual_w}x{actual_h}")]
    DimensionMismatch {
        expected_w: u16,
        expected_h: u16,
        actual_w: u16,
        actual_h: u16,
    },
}

/// Row-major grid of `Cell`s plus an explicit terminal cursor.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    pub cursor: Cursor,
}

impl ScreenBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec_of_default(width, height),
            cursor: Cursor::default(),
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Place `cell` at `(x, y)`. Wide cells additionally occupy `(x+1, y)`
    /// with a continuation sentinel; out-of-range coordinates are a no-op,
    /// and a wide cell clipped by the right edge is truncated to width 1.
    pub fn set(&mut self, x: u16, y: u16, mut cell: Cell) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        if cell.width == 2 && x + 1 >= self.width {
            cell.width = 1;
        }
        let width = cell.width;
        self.cells[idx] = cell;
        if width == 2 {
            if let Some(cont_idx) = self.index(x + 1, y) {
                self.cells[cont_idx] = Cell::continuation();
            }
        }
    }

    pub fn clear(&mut self, region: Option<Region>) {
        self.fill(region, Cell::default());
    }

    pub fn fill(&mut self, region: Option<Region>, cell: Cell) {
        let region = region.unwrap_or(Region::new(0, 0, self.width, self.height));
        for dy in 0..region.height {
            let y = region.y.saturating_add(dy);
            if y >= self.height {
                break;
            }
            for dx in 0..region.width {
                let x = region.x.saturating_add(dx);
                if x >= self.width {
                    break;
                }
                self.set(x, y, cell.clone());
            }
        }
    }

    /// Copy every cell from `other`. Requires equal dimensions.
    pub fn copy_from(&mut self, other: &ScreenBuffer) -> Result<(), CellError> {
        if self.width != other.width || self.height != other.height {
            return Err(CellError::DimensionMismatch {
                expected_w: self.width,
                expected_h: self.height,
                actual_w: other.width,
                actual_h: other.height,
            });
        }
        self.cells.clone_from(&other.cells);
        self.cursor = other.cursor;
        Ok(())
    }

    /// Resize in place, preserving the overlapping top-left region and
    /// filling new area with empty cells.
    pub fn resize(&mut self, width: u16, height: u16) {
        let mut next = vec_of_default(width, height);
        let copy_w = self.width.min(width);
        let copy_h = self.height.min(height);
        for y in 0..copy_h {
            for x in 0..copy_w {
                if let Some(src) = self.index(x, y) {
                    let dst = y as usize * width as usize + x as usize;
                    next[dst] = self.cells[src].clone();
                }
            }
        }
        self.width = width;
        self.height = height;
        self.cells = next;
        self.cursor.x = self.cursor.x.min(width.saturating_sub(1));
        self.cursor.y = self.cursor.y.min(height.saturating_sub(1));
    }

    /// Every position whose visible content differs between `self` and
    /// `other`. Dimension mismatch yields no entries (callers should force a
    /// full render instead).
    pub fn diff_iter<'a>(&'a self, other: &'a ScreenBuffer) -> Vec<(u16, u16, &'a Cell)> {
        if self.width != other.width || self.height != other.height {
            return Vec::new();
        }
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let a = &self.cells[y as usize * self.width as usize + x as usize];
                let b = &other.cells[y as usize * self.width as usize + x as usize];
                if !a.visible_eq(b) {
                    out.push((x, y, a));
                }
            }
        }
        out
    }
}

fn vec_of_default(width: u16, height: u16) -> Vec<Cell> {
    vec![Cell::default(); width as usize * height as usize]
}

/// Owns the currently-displayed (`front`) and under-construction (`back`)
/// buffers. `swap` is an ownership exchange, never a copy.
#[derive(Debug)]
pub struct DoubleBuffer {
    pub front: ScreenBuffer,
    pub back: ScreenBuffer,
}

impl DoubleBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            front: ScreenBuffer::new(width, height),
            back: ScreenBuffer::new(width, height),
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.front.resize(width, height);
        self.back.resize(width, height);
    }
}
