//! Renderer-wide atomic counters, sampled independently of whether a
//! tracing subscriber is attached.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct RenderMetricsInner {
    pub frames_full: AtomicU64,
    pub frames_differential: AtomicU64,
    pub frames_smart_escalated: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub bytes_written: AtomicU64,
    pub changed_cells_total: AtomicU64,
}

impl RenderMetricsInner {
    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            frames_full: self.frames_full.load(Ordering::Relaxed),
            frames_differential: self.frames_differential.load(Ordering::Relaxed),
            frames_smart_escalated: self.frames_smart_escalated.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            changed_cells_total: self.changed_cells_total.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderMetricsSnapshot {
    pub frames_full: u64,
    pub frames_differential: u64,
    pub frames_smart_escalated: u64,
    pub frames_dropped: u64,
    pub bytes_written: u64,
    pub changed_cells_total: u64,
}
