//! Matches incoming key events against registered single-chord and
//! timed multi-chord sequence bindings.

use std::sync::atomic::{AtomicU64, Ordering};

use tessera_config::KeyBindingsConfig;
use tessera_events::Event;
use tracing::{debug, trace};

use crate::chord::KeyChord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(u64);

fn next_binding_id() -> BindingId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    BindingId(NEXT.fetch_add(1, Ordering::Relaxed))
}

struct Binding {
    id: BindingId,
    chords: Vec<KeyChord>,
    priority: i32,
    #[allow(dead_code)]
    description: String,
    once: bool,
    callback: Box<dyn FnMut(&mut Event) -> bool>,
}

struct PendingSequence {
    candidates: Vec<usize>,
    position: usize,
    started_at_ms: u64,
}

/// Owns every registered binding plus any in-flight multi-chord sequence.
pub struct KeyBindings {
    bindings: Vec<Binding>,
    config: KeyBindingsConfig,
    pending: Option<PendingSequence>,
}

impl KeyBindings {
    pub fn new(config: KeyBindingsConfig) -> Self {
        Self {
            bindings: Vec::new(),
            config,
            pending: None,
        }
    }

    /// `chords` must be non-empty; panics otherwise since an empty binding
    /// can never match anything and indicates a caller bug.
    pub fn register(
        &mut self,
        chords: Vec<KeyChord>,
        priority: i32,
        description: impl Into<String>,
        once: bool,
        callback: Box<dyn FnMut(&mut Event) -> bool>,
    ) -> BindingId {
        assert!(!chords.is_empty(), "a key binding must have at least one chord");
        let id = next_binding_id();
        self.bindings.push(Binding {
            id,
            chords,
            priority,
            description: description.into(),
            once,
            callback,
        });
        id
    }

    pub fn unregister(&mut self, id: BindingId) {
        self.bindings.retain(|b| b.id != id);
    }

    /// Feed one key event through the matcher. Returns `true` iff the event
    /// was consumed (a binding fired, or a sequence advanced/opened).
    pub fn handle_key(&mut self, chord: KeyChord, event: &mut Event, now_ms: u64) -> bool {
        if let Some(pending) = self.pending.take() {
            if let Some(consumed) = self.advance_pending(pending, chord, event, now_ms) {
                return consumed;
            }
            // Sequence abandoned; this chord still gets a fresh look below.
        }

        if let Some(idx) = self.best_single_chord_match(chord) {
            self.fire(idx, event);
            return true;
        }

        let opening: Vec<usize> = self
            .bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.chords.len() > 1 && b.chords[0].matches(&chord, self.config.case_sensitive))
            .map(|(i, _)| i)
            .collect();
        if !opening.is_empty() {
            trace!(candidates = opening.len(), "sequence opened");
            self.pending = Some(PendingSequence {
                candidates: opening,
                position: 1,
                started_at_ms: now_ms,
            });
            return true;
        }

        false
    }

    /// Drop any pending sequence whose timer has expired. Call once per
    /// cooperative-loop tick with the current time.
    pub fn poll_timeout(&mut self, now_ms: u64) {
        if let Some(pending) = &self.pending {
            let elapsed = now_ms.saturating_sub(pending.started_at_ms);
            if elapsed >= self.config.sequence_timeout_ms {
                debug!(elapsed, "key sequence timed out, dropping");
                self.pending = None;
            }
        }
    }

    /// `None` means the pending sequence was abandoned (no candidate chord
    /// matched) and the caller should re-evaluate `chord` from scratch.
    fn advance_pending(
        &mut self,
        pending: PendingSequence,
        chord: KeyChord,
        event: &mut Event,
        now_ms: u64,
    ) -> Option<bool> {
        let position = pending.position;
        let surviving: Vec<usize> = pending
            .candidates
            .into_iter()
            .filter(|&idx| {
                self.bindings[idx]
                    .chords
                    .get(position)
                    .is_some_and(|c| c.matches(&chord, self.config.case_sensitive))
            })
            .collect();

        if surviving.is_empty() {
            return None;
        }

        let completed: Vec<usize> = surviving
            .iter()
            .copied()
            .filter(|&idx| self.bindings[idx].chords.len() == position + 1)
            .collect();

        if let Some(&idx) = completed
            .iter()
            .max_by_key(|&&idx| (self.bindings[idx].priority, std::cmp::Reverse(idx)))
        {
            self.fire(idx, event);
            return Some(true);
        }

        self.pending = Some(PendingSequence {
            candidates: surviving,
            position: position + 1,
            started_at_ms: now_ms,
        });
        Some(true)
    }

    fn best_single_chord_match(&self, chord: KeyChord) -> Option<usize> {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.chords.len() == 1 && b.chords[0].matches(&chord, self.config.case_sensitive))
            .max_by_key(|(idx, b)| (b.priority, std::cmp::Reverse(*idx)))
            .map(|(idx, _)| idx)
    }

    fn fire(&mut self, idx: usize, event: &mut Event) {
        self.pending = None;
        event.prevent_default();
        let keep_going = (self.bindings[idx].callback)(event);
        if !keep_going {
            event.stop_propagation();
        }
        let id = self.bindings[idx].id;
        debug!(binding = ?id, "key binding fired");
        if self.bindings[idx].once {
            self.bindings.retain(|b| b.id != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tessera_events::{EventKind, KeyCode, KeyData, Priority};

    fn key_event(code: KeyCode) -> Event {
        Event::new(
            EventKind::Key(KeyData {
                key: code,
                raw: Vec::new(),
                ctrl: false,
                alt: false,
                shift: false,
                code: 0,
            }),
            Priority::Normal,
            0,
        )
    }

    fn chord(c: char) -> KeyChord {
        KeyChord::new(KeyCode::Char(c))
    }

    #[test]
    fn single_chord_binding_fires_and_sets_default_prevented() {
        let mut kb = KeyBindings::new(KeyBindingsConfig::default());
        let fired = Rc::new(RefCell::new(false));
        let fired2 = fired.clone();
        kb.register(vec![chord('s')], 0, "save", false, Box::new(move |_| {
            *fired2.borrow_mut() = true;
            true
        }));
        let mut ev = key_event(KeyCode::Char('s'));
        let matched = kb.handle_key(chord('s'), &mut ev, 0);
        assert!(matched);
        assert!(*fired.borrow());
        assert!(ev.default_prevented);
    }

    #[test]
    fn higher_priority_single_chord_binding_wins() {
        let mut kb = KeyBindings::new(KeyBindingsConfig::default());
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = order.clone();
        kb.register(vec![chord('s')], 0, "low", false, Box::new(move |_| { o1.borrow_mut().push("low"); true }));
        let o2 = order.clone();
        kb.register(vec![chord('s')], 5, "high", false, Box::new(move |_| { o2.borrow_mut().push("high"); true }));
        let mut ev = key_event(KeyCode::Char('s'));
        kb.handle_key(chord('s'), &mut ev, 0);
        assert_eq!(*order.borrow(), vec!["high"]);
    }

    #[test]
    fn two_chord_sequence_fires_on_completion() {
        let mut kb = KeyBindings::new(KeyBindingsConfig::default());
        let fired = Rc::new(RefCell::new(false));
        let fired2 = fired.clone();
        kb.register(
            vec![chord('g'), chord('g')],
            0,
            "goto-top",
            false,
            Box::new(move |_| {
                *fired2.borrow_mut() = true;
                true
            }),
        );
        let mut ev = key_event(KeyCode::Char('g'));
        assert!(kb.handle_key(chord('g'), &mut ev, 0));
        assert!(!*fired.borrow());
        let mut ev2 = key_event(KeyCode::Char('g'));
        assert!(kb.handle_key(chord('g'), &mut ev2, 10));
        assert!(*fired.borrow());
    }

    #[test]
    fn non_matching_second_chord_abandons_sequence_without_losing_the_key() {
        let mut kb = KeyBindings::new(KeyBindingsConfig::default());
        kb.register(vec![chord('g'), chord('g')], 0, "goto-top", false, Box::new(|_| true));
        let single_fired = Rc::new(RefCell::new(false));
        let sf2 = single_fired.clone();
        kb.register(vec![chord('x')], 0, "single", false, Box::new(move |_| { *sf2.borrow_mut() = true; true }));

        let mut ev = key_event(KeyCode::Char('g'));
        kb.handle_key(chord('g'), &mut ev, 0);
        let mut ev2 = key_event(KeyCode::Char('x'));
        let matched = kb.handle_key(chord('x'), &mut ev2, 10);
        assert!(matched);
        assert!(*single_fired.borrow());
    }

    #[test]
    fn sequence_times_out_and_is_dropped() {
        let mut cfg = KeyBindingsConfig::default();
        cfg.sequence_timeout_ms = 50;
        let mut kb = KeyBindings::new(cfg);
        kb.register(vec![chord('g'), chord('g')], 0, "goto-top", false, Box::new(|_| true));
        let mut ev = key_event(KeyCode::Char('g'));
        kb.handle_key(chord('g'), &mut ev, 0);
        kb.poll_timeout(100);
        assert!(kb.pending.is_none());
    }

    #[test]
    fn once_binding_is_removed_after_firing() {
        let mut kb = KeyBindings::new(KeyBindingsConfig::default());
        let calls = Rc::new(RefCell::new(0));
        let c2 = calls.clone();
        kb.register(vec![chord('s')], 0, "once-save", true, Box::new(move |_| { *c2.borrow_mut() += 1; true }));
        let mut ev = key_event(KeyCode::Char('s'));
        kb.handle_key(chord('s'), &mut ev, 0);
        let mut ev2 = key_event(KeyCode::Char('s'));
        kb.handle_key(chord('s'), &mut ev2, 1);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn callback_returning_false_stops_propagation() {
        let mut kb = KeyBindings::new(KeyBindingsConfig::default());
        kb.register(vec![chord('s')], 0, "save", false, Box::new(|_| false));
        let mut ev = key_event(KeyCode::Char('s'));
        kb.handle_key(chord('s'), &mut ev, 0);
        assert!(ev.propagation_stopped);
    }
}
