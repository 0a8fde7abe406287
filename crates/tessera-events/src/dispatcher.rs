//! Per-type handler registry with capture/bubble dispatch.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::error;

use crate::event::Event;

pub type TargetId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

fn next_handler_id() -> HandlerId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    HandlerId(NEXT.fetch_add(1, Ordering::Relaxed))
}

struct HandlerEntry {
    id: HandlerId,
    type_tag: &'static str,
    target: TargetId,
    priority: i32,
    capture: bool,
    once: bool,
    seq: u64,
    handler: Box<dyn FnMut(&mut Event) -> bool>,
}

/// Routes events along a target chain (ancestors-to-target) through
/// registered handlers, honoring capture/bubble phases, priority-then-
/// insertion-order, `once` removal, and `propagation_stopped` short-circuit.
pub struct Dispatcher {
    entries: Vec<HandlerEntry>,
    seq: u64,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            seq: 0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        type_tag: &'static str,
        target: TargetId,
        priority: i32,
        capture: bool,
        once: bool,
        handler: Box<dyn FnMut(&mut Event) -> bool>,
    ) -> HandlerId {
        let id = next_handler_id();
        let seq = self.seq;
        self.seq += 1;
        self.entries.push(HandlerEntry {
            id,
            type_tag,
            target,
            priority,
            capture,
            once,
            seq,
            handler,
        });
        id
    }

    pub fn unregister(&mut self, id: HandlerId) {
        self.entries.retain(|e| e.id != id);
    }

    /// Dispatch `event` (of `type_tag`) along `chain`, where `chain.last()`
    /// is the target and everything before it is an ancestor, root-first.
    /// Returns `true` iff propagation was never stopped.
    pub fn dispatch(&mut self, type_tag: &str, chain: &[TargetId], event: &mut Event) -> bool {
        let Some((&target, ancestors)) = chain.split_last() else {
            return true;
        };

        let mut fired_once: Vec<HandlerId> = Vec::new();
        let mut stopped = false;

        // Capture phase: ancestors root-to-target, capture handlers only.
        'outer: for &node in ancestors {
            if self.run_phase(type_tag, node, true, event, &mut fired_once) {
                stopped = true;
                break 'outer;
            }
        }

        // At-target: every handler registered on the target fires.
        if !stopped {
            for capture in [true, false] {
                if self.run_phase(type_tag, target, capture, event, &mut fired_once) {
                    stopped = true;
                    break;
                }
            }
        }

        // Bubble phase: ancestors target-to-root, non-capture handlers only.
        if !stopped {
            for &node in ancestors.iter().rev() {
                if self.run_phase(type_tag, node, false, event, &mut fired_once) {
                    stopped = true;
                    break;
                }
            }
        }

        for id in fired_once {
            self.unregister(id);
        }

        !stopped
    }

    /// Run every handler matching `(type_tag, node, capture)` in
    /// descending-priority, insertion-order-ties order. Returns whether
    /// propagation was stopped during this phase.
    fn run_phase(
        &mut self,
        type_tag: &str,
        node: TargetId,
        capture: bool,
        event: &mut Event,
        fired_once: &mut Vec<HandlerId>,
    ) -> bool {
        let mut indices: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.type_tag == type_tag && e.target == node && e.capture == capture)
            .map(|(i, _)| i)
            .collect();
        indices.sort_by(|&a, &b| {
            self.entries[b]
                .priority
                .cmp(&self.entries[a].priority)
                .then(self.entries[a].seq.cmp(&self.entries[b].seq))
        });

        for idx in indices {
            let id = self.entries[idx].id;
            let once = self.entries[idx].once;
            let stop = panic::catch_unwind(AssertUnwindSafe(|| {
                (self.entries[idx].handler)(event)
            }))
            .unwrap_or_else(|_| {
                error!(handler = ?id, "event handler panicked, isolating");
                false
            });
            if once {
                fired_once.push(id);
            }
            if stop || event.propagation_stopped {
                event.propagation_stopped = true;
                return true;
            }
        }
        false
    }
}
