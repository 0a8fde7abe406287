//! Per-node style inputs to the flex algorithm.

use crate::dimension::Dimension;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    RowReverse,
    Column,
    ColumnReverse,
}

impl Direction {
    pub fn is_row(self) -> bool {
        matches!(self, Direction::Row | Direction::RowReverse)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, Direction::RowReverse | Direction::ColumnReverse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub direction: Direction,
    pub wrap: Wrap,
    pub justify_content: Justify,
    pub align_items: Align,
    pub align_content: Align,
    pub gap: f32,
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Option<f32>,
    pub visible: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            direction: Direction::Row,
            wrap: Wrap::NoWrap,
            justify_content: Justify::Start,
            align_items: Align::Stretch,
            align_content: Align::Start,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: 0.0,
            max_width: f32::MAX,
            min_height: 0.0,
            max_height: f32::MAX,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: None,
            visible: true,
        }
    }
}
