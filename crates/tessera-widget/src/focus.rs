//! Owns the focus chain for one widget root: tab-order traversal plus
//! explicit focus-by-id, emitting `FocusGained`/`FocusLost` events through
//! the same `Custom` event channel every other widget notification uses.

use tessera_events::{CustomPayload, Event, EventKind, Priority};

use crate::widget::WidgetId;

pub const FOCUS_GAINED: &str = "widget.focus.gained";
pub const FOCUS_LOST: &str = "widget.focus.lost";

struct Entry {
    id: WidgetId,
    tab_index: i32,
}

/// Tab order is `tab_index` ascending, ties broken by registration order
/// (a stable sort over the registration-order vector achieves this).
pub struct FocusManager {
    chain: Vec<Entry>,
    current: Option<usize>,
}

impl Default for FocusManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusManager {
    pub fn new() -> Self {
        Self {
            chain: Vec::new(),
            current: None,
        }
    }

    pub fn register(&mut self, id: WidgetId, tab_index: i32) {
        self.chain.push(Entry { id, tab_index });
        self.chain.sort_by_key(|e| e.tab_index);
    }

    pub fn unregister(&mut self, id: WidgetId) {
        let Some(pos) = self.chain.iter().position(|e| e.id == id) else {
            return;
        };
        self.chain.remove(pos);
        self.current = match self.current {
            Some(c) if c == pos => None,
            Some(c) if c > pos => Some(c - 1),
            other => other,
        };
    }

    pub fn current(&self) -> Option<WidgetId> {
        self.current.and_then(|i| self.chain.get(i)).map(|e| e.id)
    }

    pub fn focus_next(&mut self, now_ms: u64) -> Vec<Event> {
        if self.chain.is_empty() {
            return Vec::new();
        }
        let next = match self.current {
            Some(i) => (i + 1) % self.chain.len(),
            None => 0,
        };
        self.transition(next, now_ms)
    }

    pub fn focus_prev(&mut self, now_ms: u64) -> Vec<Event> {
        if self.chain.is_empty() {
            return Vec::new();
        }
        let next = match self.current {
            Some(0) | None => self.chain.len() - 1,
            Some(i) => i - 1,
        };
        self.transition(next, now_ms)
    }

    /// No-op (returns no events) if `id` isn't a registered focusable.
    pub fn focus_by_id(&mut self, id: WidgetId, now_ms: u64) -> Vec<Event> {
        let Some(next) = self.chain.iter().position(|e| e.id == id) else {
            return Vec::new();
        };
        self.transition(next, now_ms)
    }

    pub fn blur(&mut self, now_ms: u64) -> Vec<Event> {
        let Some(current) = self.current.take() else {
            return Vec::new();
        };
        vec![focus_event(self.chain[current].id, false, now_ms)]
    }

    fn transition(&mut self, next: usize, now_ms: u64) -> Vec<Event> {
        if self.current == Some(next) {
            return Vec::new();
        }
        let mut events = Vec::new();
        if let Some(prev) = self.current {
            events.push(focus_event(self.chain[prev].id, false, now_ms));
        }
        self.current = Some(next);
        events.push(focus_event(self.chain[next].id, true, now_ms));
        events
    }
}

fn focus_event(id: WidgetId, gained: bool, timestamp: u64) -> Event {
    let name = if gained { FOCUS_GAINED } else { FOCUS_LOST };
    Event::new(
        EventKind::Custom {
            name: name.to_string(),
            payload: CustomPayload::Text(id.0.to_string()),
        },
        Priority::Normal,
        timestamp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::next_widget_id;

    #[test]
    fn focus_next_on_empty_chain_emits_nothing() {
        let mut fm = FocusManager::new();
        assert!(fm.focus_next(0).is_empty());
    }

    #[test]
    fn focus_next_wraps_around_to_the_first_entry() {
        let mut fm = FocusManager::new();
        let a = next_widget_id();
        let b = next_widget_id();
        fm.register(a, 0);
        fm.register(b, 1);
        fm.focus_next(0);
        assert_eq!(fm.current(), Some(a));
        fm.focus_next(0);
        assert_eq!(fm.current(), Some(b));
        fm.focus_next(0);
        assert_eq!(fm.current(), Some(a));
    }

    #[test]
    fn first_transition_emits_only_a_gained_event() {
        let mut fm = FocusManager::new();
        let a = next_widget_id();
        fm.register(a, 0);
        let events = fm.focus_next(0);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0].kind, EventKind::Custom { name, .. } if name == FOCUS_GAINED));
    }

    #[test]
    fn subsequent_transition_emits_lost_then_gained() {
        let mut fm = FocusManager::new();
        let a = next_widget_id();
        let b = next_widget_id();
        fm.register(a, 0);
        fm.register(b, 1);
        fm.focus_next(0);
        let events = fm.focus_next(0);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0].kind, EventKind::Custom { name, .. } if name == FOCUS_LOST));
        assert!(matches!(&events[1].kind, EventKind::Custom { name, .. } if name == FOCUS_GAINED));
    }

    #[test]
    fn tab_order_honors_tab_index_over_registration_order() {
        let mut fm = FocusManager::new();
        let a = next_widget_id();
        let b = next_widget_id();
        fm.register(a, 5);
        fm.register(b, 1);
        fm.focus_next(0);
        assert_eq!(fm.current(), Some(b));
    }

    #[test]
    fn unregistering_the_focused_widget_clears_current() {
        let mut fm = FocusManager::new();
        let a = next_widget_id();
        fm.register(a, 0);
        fm.focus_next(0);
        fm.unregister(a);
        assert_eq!(fm.current(), None);
    }

    #[test]
    fn focus_by_id_targets_an_unordered_entry_directly() {
        let mut fm = FocusManager::new();
        let a = next_widget_id();
        let b = next_widget_id();
        let c = next_widget_id();
        fm.register(a, 0);
        fm.register(b, 1);
        fm.register(c, 2);
        fm.focus_by_id(c, 0);
        assert_eq!(fm.current(), Some(c));
    }
}
