//! Terminal size query and change notification.

use tracing::debug;

/// `(cols, rows)` from the terminal's reported size attributes, falling
/// back to `80x24` if the query fails (e.g. not attached to a tty).
pub fn terminal_size() -> (u16, u16) {
    crossterm::terminal::size().unwrap_or_else(|err| {
        debug!(error = %err, "terminal size query failed, falling back to 80x24");
        (80, 24)
    })
}

/// Tracks the last observed size and reports `(new, previous)` only when a
/// poll observes an actual change, so resize listeners never fire spuriously.
#[derive(Debug, Clone, Copy)]
pub struct ResizeWatcher {
    current: (u16, u16),
}

impl ResizeWatcher {
    pub fn new(initial: (u16, u16)) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> (u16, u16) {
        self.current
    }

    /// Observe a freshly queried size; returns `Some((new, previous))` only
    /// on an actual change.
    pub fn observe(&mut self, new: (u16, u16)) -> Option<((u16, u16), (u16, u16))> {
        if new == self.current {
            return None;
        }
        let previous = self.current;
        self.current = new;
        Some((new, previous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_is_silent_when_unchanged() {
        let mut w = ResizeWatcher::new((80, 24));
        assert!(w.observe((80, 24)).is_none());
    }

    #[test]
    fn observe_reports_new_and_previous_on_change() {
        let mut w = ResizeWatcher::new((80, 24));
        let (new, prev) = w.observe((100, 40)).unwrap();
        assert_eq!(new, (100, 40));
        assert_eq!(prev, (80, 24));
        assert_eq!(w.current(), (100, 40));
    }
}
