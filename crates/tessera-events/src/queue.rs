//! Three-band priority queue: strict priority, FIFO within a band.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::event::{Event, Priority};

#[derive(Debug, Default)]
struct QueueCounters {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueueStats {
    pub enqueued: u64,
    pub dequeued: u64,
    pub dropped: u64,
}

/// Policy applied once `max_size` is reached and a new item arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Reject the incoming event outright.
    RejectNew,
    /// Evict the oldest event strictly below the incoming priority band, if
    /// one exists; otherwise reject the incoming event.
    DropOldestLowerPriority,
}

fn band_index(p: Priority) -> usize {
    match p {
        Priority::High => 0,
        Priority::Normal => 1,
        Priority::Low => 2,
    }
}

/// Priority bands, each FIFO. `stats.dropped` counts every enqueue call
/// that did not leave a net-new retained item: outright rejections and
/// evictions performed to admit a higher-priority item both count.
pub struct EventQueue {
    bands: [VecDeque<Event>; 3],
    max_size: Option<usize>,
    policy: OverflowPolicy,
    counters: QueueCounters,
}

impl EventQueue {
    pub fn new(max_size: Option<usize>, policy: OverflowPolicy) -> Self {
        Self {
            bands: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
            max_size,
            policy,
            counters: QueueCounters::default(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None, OverflowPolicy::RejectNew)
    }

    pub fn size(&self) -> usize {
        self.bands.iter().map(|b| b.len()).sum()
    }

    pub fn is_full(&self) -> bool {
        self.max_size.is_some_and(|max| self.size() >= max)
    }

    /// Attempt to admit `event`. Returns whether it was retained.
    pub fn enqueue(&mut self, event: Event) -> bool {
        if self.is_full() {
            match self.policy {
                OverflowPolicy::RejectNew => {
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    return false;
                }
                OverflowPolicy::DropOldestLowerPriority => {
                    if !self.evict_oldest_below(event.priority) {
                        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                        return false;
                    }
                }
            }
        }
        self.bands[band_index(event.priority)].push_back(event);
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn evict_oldest_below(&mut self, incoming: Priority) -> bool {
        for band in (band_index(incoming) + 1..self.bands.len()).rev() {
            if let Some(_victim) = self.bands[band].pop_front() {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                return true;
            }
        }
        false
    }

    pub fn batch_enqueue(&mut self, events: Vec<Event>) -> usize {
        let mut accepted = 0;
        for ev in events {
            if self.enqueue(ev) {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn dequeue(&mut self) -> Option<Event> {
        for band in self.bands.iter_mut() {
            if let Some(ev) = band.pop_front() {
                self.counters.dequeued.fetch_add(1, Ordering::Relaxed);
                return Some(ev);
            }
        }
        None
    }

    pub fn peek(&self) -> Option<&Event> {
        self.bands.iter().find_map(|b| b.front())
    }

    pub fn remove_where<F: FnMut(&Event) -> bool>(&mut self, mut pred: F) -> usize {
        let mut removed = 0;
        for band in self.bands.iter_mut() {
            let before = band.len();
            band.retain(|ev| !pred(ev));
            removed += before - band.len();
        }
        removed
    }

    pub fn find_by_type(&self, tag: &str) -> Vec<&Event> {
        self.bands
            .iter()
            .flat_map(|b| b.iter())
            .filter(|ev| ev.kind.type_tag() == tag)
            .collect()
    }

    pub fn clear(&mut self) {
        for band in self.bands.iter_mut() {
            band.clear();
        }
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dequeued: self.counters.dequeued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn ev(priority: Priority, ts: u64) -> Event {
        Event::new(EventKind::Focus { gained: true }, priority, ts)
    }

    #[test]
    fn dequeues_high_then_normal_then_low() {
        let mut q = EventQueue::unbounded();
        q.enqueue(ev(Priority::Low, 1));
        q.enqueue(ev(Priority::High, 2));
        q.enqueue(ev(Priority::Normal, 3));
        assert_eq!(q.dequeue().unwrap().priority, Priority::High);
        assert_eq!(q.dequeue().unwrap().priority, Priority::Normal);
        assert_eq!(q.dequeue().unwrap().priority, Priority::Low);
    }

    #[test]
    fn fifo_within_same_band() {
        let mut q = EventQueue::unbounded();
        q.enqueue(ev(Priority::Normal, 1));
        q.enqueue(ev(Priority::Normal, 2));
        assert_eq!(q.dequeue().unwrap().timestamp, 1);
        assert_eq!(q.dequeue().unwrap().timestamp, 2);
    }

    #[test]
    fn reject_new_policy_drops_incoming_when_full() {
        let mut q = EventQueue::new(Some(1), OverflowPolicy::RejectNew);
        assert!(q.enqueue(ev(Priority::Normal, 1)));
        assert!(!q.enqueue(ev(Priority::High, 2)));
        assert_eq!(q.stats().dropped, 1);
    }

    #[test]
    fn drop_oldest_lower_priority_admits_higher_priority_incoming() {
        let mut q = EventQueue::new(Some(1), OverflowPolicy::DropOldestLowerPriority);
        q.enqueue(ev(Priority::Low, 1));
        assert!(q.enqueue(ev(Priority::High, 2)));
        assert_eq!(q.size(), 1);
        assert_eq!(q.dequeue().unwrap().priority, Priority::High);
        assert_eq!(q.stats().dropped, 1);
    }

    #[test]
    fn drop_oldest_policy_rejects_when_nothing_lower_to_evict() {
        let mut q = EventQueue::new(Some(1), OverflowPolicy::DropOldestLowerPriority);
        q.enqueue(ev(Priority::High, 1));
        assert!(!q.enqueue(ev(Priority::High, 2)));
        assert_eq!(q.stats().dropped, 1);
    }

    #[test]
    fn remove_where_removes_matching_across_bands() {
        let mut q = EventQueue::unbounded();
        q.enqueue(ev(Priority::High, 1));
        q.enqueue(ev(Priority::Low, 2));
        let removed = q.remove_where(|ev| ev.timestamp == 2);
        assert_eq!(removed, 1);
        assert_eq!(q.size(), 1);
    }
}
