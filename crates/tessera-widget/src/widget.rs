//! The widget contract: a stable id, a layout node, paint, and event
//! handling, wired through an invalidation flag the renderer consults
//! before deciding whether a subtree needs repainting.

use std::sync::atomic::{AtomicU64, Ordering};

use tessera_events::Event;
use tessera_layout::LayoutNode;

use crate::context::RenderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(pub u64);

pub fn next_widget_id() -> WidgetId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    WidgetId(NEXT.fetch_add(1, Ordering::Relaxed))
}

/// What a renderer needs from every widget it hosts. `paint` may not touch
/// anything outside the bounds it's given; a widget that panics inside
/// `paint` is caught by the caller, logged, and skipped for that frame.
pub trait Widget {
    fn id(&self) -> WidgetId;

    fn layout_node(&self) -> &LayoutNode;

    fn layout_node_mut(&mut self) -> &mut LayoutNode;

    fn paint(&mut self, ctx: &mut RenderContext<'_>);

    /// Returns whether the event was consumed; an unconsumed event keeps
    /// bubbling to the widget's parent in the host's dispatch tree.
    fn handle_event(&mut self, event: &mut Event) -> bool;

    fn is_focusable(&self) -> bool {
        false
    }

    fn tab_index(&self) -> i32 {
        0
    }

    fn mount(&mut self) {}

    fn unmount(&mut self) {}

    fn is_invalid(&self) -> bool;

    fn invalidate(&mut self);

    fn clear_invalid(&mut self);
}

/// Minimal bookkeeping every concrete widget embeds: id, dirty flag, and
/// mount state, so a widget author only writes `paint`/`handle_event`.
pub struct WidgetState {
    pub id: WidgetId,
    pub node: LayoutNode,
    invalid: bool,
    mounted: bool,
}

impl WidgetState {
    pub fn new(node: LayoutNode) -> Self {
        Self {
            id: next_widget_id(),
            node,
            invalid: true,
            mounted: false,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn invalidate(&mut self) {
        self.invalid = true;
    }

    pub fn clear_invalid(&mut self) {
        self.invalid = false;
    }

    pub fn mount(&mut self) {
        self.mounted = true;
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_ids_are_unique_and_increasing() {
        let a = next_widget_id();
        let b = next_widget_id();
        assert!(b.0 > a.0);
    }

    #[test]
    fn new_state_starts_invalid_and_unmounted() {
        let state = WidgetState::new(LayoutNode::new(tessera_layout::Style::default()));
        assert!(state.is_invalid());
        assert!(!state.is_mounted());
    }

    #[test]
    fn clear_invalid_resets_the_dirty_flag() {
        let mut state = WidgetState::new(LayoutNode::new(tessera_layout::Style::default()));
        state.clear_invalid();
        assert!(!state.is_invalid());
        state.invalidate();
        assert!(state.is_invalid());
    }
}
