//! The frame pipeline: a bounded, strictly-serial render queue sitting on
//! top of a [`DoubleBuffer`], pacing itself to a target frame rate and
//! writing patches through a [`BufferedWriter`] in bounded batches.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use tessera_cell::DoubleBuffer;
use tessera_color::Encoder;
use tessera_config::{RendererConfig, StrategyKind};
use tessera_terminal::{BufferedWriter, TerminalError};
use tracing::{debug, info, warn};

use crate::metrics::{RenderMetricsInner, RenderMetricsSnapshot};
use crate::strategy::{compute_patch, Patch, Strategy};

const MAX_SEQUENCES_PER_WRITE: usize = 100;

#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Painted(Patch),
    /// The request never ran a diff: it was evicted from the queue to make
    /// room for a newer one, or nothing was pending.
    Dropped,
}

impl From<StrategyKind> for Strategy {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Full => Strategy::Full,
            StrategyKind::Differential => Strategy::Differential,
            StrategyKind::Smart => Strategy::Smart,
        }
    }
}

/// Owns the double buffer, the render queue, and the terminal writer.
/// `render`/`destroy` drive a cooperative frame pipeline; everything else
/// is a plain synchronous accessor.
pub struct Renderer<W: Write> {
    config: RendererConfig,
    strategy: Strategy,
    double: DoubleBuffer,
    encoder: Encoder,
    writer: BufferedWriter<W>,
    queue: VecDeque<Option<tessera_cell::ScreenBuffer>>,
    last_frame_at: Option<Instant>,
    cursor_hidden: bool,
    metrics: RenderMetricsInner,
}

impl<W: Write> Renderer<W> {
    pub fn new(width: u16, height: u16, config: RendererConfig, encoder: Encoder, writer: BufferedWriter<W>) -> Self {
        let strategy = Strategy::from(config.strategy);
        let cursor_hidden = config.hide_cursor;
        Self {
            config,
            strategy,
            double: DoubleBuffer::new(width, height),
            encoder,
            writer,
            queue: VecDeque::new(),
            last_frame_at: None,
            cursor_hidden,
            metrics: RenderMetricsInner::default(),
        }
    }

    /// Enqueue `buffer` (or, if `None`, a repaint of the current back
    /// buffer) and drain the queue to exhaustion, returning the outcome of
    /// the frame this call requested.
    pub async fn render(&mut self, buffer: Option<tessera_cell::ScreenBuffer>) -> RenderOutcome {
        if self.queue.len() >= self.config.max_queue_size {
            self.queue.pop_front();
            self.metrics.frames_dropped.fetch_add(1, Ordering::Relaxed);
            warn!(max = self.config.max_queue_size, "render queue full, dropping oldest pending frame");
        }
        self.queue.push_back(buffer);
        let mut last = RenderOutcome::Dropped;
        while let Some(next) = self.queue.pop_front() {
            last = self.paint_one(next).await;
        }
        last
    }

    async fn paint_one(&mut self, buffer: Option<tessera_cell::ScreenBuffer>) -> RenderOutcome {
        if let Some(incoming) = buffer {
            if self.double.back.copy_from(&incoming).is_err() {
                self.double.resize(incoming.width(), incoming.height());
                let _ = self.double.back.copy_from(&incoming);
            }
        }
        self.pace().await;

        let patch = compute_patch(self.strategy, &self.double.front, &self.double.back, &self.encoder);
        if let Err(err) = self.write_patch(&patch) {
            warn!(error = %err, "failed writing render patch");
        }
        self.double.swap();
        self.record_metrics(&patch);
        self.last_frame_at = Some(Instant::now());
        debug!(strategy = patch.stats.strategy_name, changed = patch.stats.changed_cells, "frame painted");
        RenderOutcome::Painted(patch)
    }

    async fn pace(&mut self) {
        if !self.config.frame_rate_limiting {
            return;
        }
        let Some(last) = self.last_frame_at else {
            return;
        };
        let budget = Duration::from_millis(1000 / self.config.target_fps.max(1) as u64);
        let elapsed = last.elapsed();
        if elapsed < budget {
            tokio::time::sleep(budget - elapsed).await;
        }
    }

    fn write_patch(&mut self, patch: &Patch) -> Result<(), TerminalError> {
        for chunk in patch.ops.chunks(MAX_SEQUENCES_PER_WRITE) {
            let mut bytes = Vec::new();
            for op in chunk {
                bytes.extend_from_slice(op);
            }
            self.writer.write(&bytes)?;
        }
        self.writer.flush()?;
        self.metrics.bytes_written.store(self.writer.bytes_written(), Ordering::Relaxed);
        Ok(())
    }

    fn record_metrics(&mut self, patch: &Patch) {
        self.metrics.changed_cells_total.fetch_add(patch.stats.changed_cells as u64, Ordering::Relaxed);
        if patch.stats.is_full_render {
            self.metrics.frames_full.fetch_add(1, Ordering::Relaxed);
            if patch.stats.strategy_name == "smart" {
                self.metrics.frames_smart_escalated.fetch_add(1, Ordering::Relaxed);
                info!("smart strategy escalated to a full redraw");
            }
        } else {
            self.metrics.frames_differential.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn clear(&mut self) {
        self.double.front.clear(None);
        self.double.back.clear(None);
    }

    pub fn flush(&mut self) -> Result<(), TerminalError> {
        self.writer.flush()
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.double.resize(width, height);
    }

    pub fn get_dimensions(&self) -> (u16, u16) {
        (self.double.front.width(), self.double.front.height())
    }

    pub fn get_metrics(&self) -> RenderMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.config.target_fps = fps.clamp(1, 144);
    }

    pub fn enable_rate_limiting(&mut self, enable: bool) {
        self.config.frame_rate_limiting = enable;
    }

    /// Drain any still-pending frames, restore the cursor if this renderer
    /// hid it, and drop the double buffer.
    pub async fn destroy(mut self) -> RenderMetricsSnapshot {
        while let Some(next) = self.queue.pop_front() {
            self.paint_one(next).await;
        }
        if self.cursor_hidden {
            let _ = self.writer.write(b"\x1b[?25h");
            let _ = self.writer.flush();
            self.cursor_hidden = false;
        }
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::OutputConfig;

    fn renderer() -> Renderer<Vec<u8>> {
        let config = RendererConfig {
            frame_rate_limiting: false,
            ..RendererConfig::default()
        };
        let writer = BufferedWriter::new(Vec::new(), &OutputConfig::default());
        Renderer::new(4, 2, config, Encoder::new(Some("truecolor"), Some("xterm")), writer)
    }

    #[tokio::test]
    async fn first_render_paints_a_full_frame() {
        let mut r = renderer();
        let outcome = r.render(None).await;
        match outcome {
            RenderOutcome::Painted(patch) => assert!(!patch.ops.is_empty()),
            RenderOutcome::Dropped => panic!("expected a painted frame"),
        }
    }

    #[tokio::test]
    async fn queue_overflow_drops_the_oldest_pending_request() {
        let mut r = renderer();
        r.config.max_queue_size = 1;
        // First render drains immediately (queue empty before push), so push
        // two buffers back to back without draining by calling render twice
        // rapidly is equivalent to serial processing; exercise the counter
        // path directly instead.
        r.queue.push_back(None);
        let outcome = r.render(None).await;
        assert!(matches!(outcome, RenderOutcome::Painted(_)));
        assert_eq!(r.get_metrics().frames_dropped, 1);
    }

    #[tokio::test]
    async fn resize_changes_reported_dimensions() {
        let mut r = renderer();
        r.resize(10, 5);
        assert_eq!(r.get_dimensions(), (10, 5));
    }

    #[tokio::test]
    async fn destroy_restores_the_cursor_when_hidden() {
        let mut config = RendererConfig::default();
        config.hide_cursor = true;
        config.frame_rate_limiting = false;
        let writer = BufferedWriter::new(Vec::new(), &OutputConfig::default());
        let r = Renderer::new(2, 2, config, Encoder::new(None, None), writer);
        r.destroy().await;
    }

    #[tokio::test]
    async fn metrics_track_full_frame_count() {
        let mut r = renderer();
        r.render(None).await;
        assert_eq!(r.get_metrics().frames_full, 1);
    }

    #[test]
    fn set_target_fps_clamps_into_range() {
        let mut r = renderer();
        r.set_target_fps(9999);
        assert_eq!(r.config.target_fps, 144);
    }
}
