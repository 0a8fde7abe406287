//! The layout tree: one [`LayoutNode`] per box, holding style input and the
//! most recently computed box.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::style::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

fn next_node_id() -> NodeId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
}

/// A computed box, in terminal cell units, matching the coordinate system
/// the renderer and cell buffers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub(crate) fn from_f32(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x: x.round().clamp(0.0, u16::MAX as f32) as u16,
            y: y.round().clamp(0.0, u16::MAX as f32) as u16,
            width: width.round().clamp(0.0, u16::MAX as f32) as u16,
            height: height.round().clamp(0.0, u16::MAX as f32) as u16,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: NodeId,
    pub style: Style,
    /// Content-derived size used to resolve `Dimension::Auto`; `(0.0, 0.0)`
    /// means "no intrinsic preference, fall back to container size".
    pub intrinsic: (f32, f32),
    pub children: Vec<LayoutNode>,
    pub computed: Rect,
    /// `false` for hidden nodes and anything skipped by the depth cap.
    pub valid: bool,
}

impl LayoutNode {
    pub fn new(style: Style) -> Self {
        Self {
            id: next_node_id(),
            style,
            intrinsic: (0.0, 0.0),
            children: Vec::new(),
            computed: Rect::default(),
            valid: false,
        }
    }

    pub fn with_children(style: Style, children: Vec<LayoutNode>) -> Self {
        let mut node = Self::new(style);
        node.children = children;
        node
    }
}
