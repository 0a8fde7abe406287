//! A frame ticker independent of the renderer's own pacing. Widgets
//! register callbacks and receive `deltaTime`/`timestamp` each tick; a
//! logical pause flag lets a host suspend animation without touching the
//! renderer itself.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub type AnimationId = u64;

fn next_animation_id() -> AnimationId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

const HISTORY_LEN: usize = 60;

#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub delta_time: Duration,
    pub timestamp: Instant,
}

struct Callback {
    id: AnimationId,
    cb: Box<dyn FnMut(Tick) + Send>,
}

pub struct AnimationTicker {
    callbacks: Vec<Callback>,
    last_tick: Option<Instant>,
    paused: bool,
    target_fps: u32,
    fps_history: VecDeque<f32>,
    delta_history: VecDeque<Duration>,
}

impl AnimationTicker {
    pub fn new(target_fps: u32) -> Self {
        Self {
            callbacks: Vec::new(),
            last_tick: None,
            paused: false,
            target_fps: target_fps.max(1),
            fps_history: VecDeque::with_capacity(HISTORY_LEN),
            delta_history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    pub fn request(&mut self, cb: impl FnMut(Tick) + Send + 'static) -> AnimationId {
        let id = next_animation_id();
        self.callbacks.push(Callback { id, cb: Box::new(cb) });
        id
    }

    pub fn cancel(&mut self, id: AnimationId) {
        self.callbacks.retain(|c| c.id != id);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume, discarding the last tick timestamp so the next `tick` reports
    /// a zero delta instead of counting the paused interval.
    pub fn resume(&mut self) {
        self.paused = false;
        self.last_tick = None;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.target_fps = fps.max(1);
    }

    /// Run every registered callback, skipping entirely while paused or when
    /// `now` arrives faster than the configured `target_fps` budget allows.
    pub fn tick(&mut self, now: Instant) {
        if self.paused {
            return;
        }
        let budget = Duration::from_millis(1000 / self.target_fps as u64);
        if let Some(last) = self.last_tick {
            if now.duration_since(last) < budget {
                return;
            }
        }
        let delta = self.last_tick.map(|last| now.duration_since(last)).unwrap_or(Duration::ZERO);
        self.last_tick = Some(now);
        self.push_history(delta);

        let tick = Tick { delta_time: delta, timestamp: now };
        for callback in &mut self.callbacks {
            (callback.cb)(tick);
        }
    }

    fn push_history(&mut self, delta: Duration) {
        if self.delta_history.len() == HISTORY_LEN {
            self.delta_history.pop_front();
            self.fps_history.pop_front();
        }
        let fps = if delta.as_secs_f32() > 0.0 { 1.0 / delta.as_secs_f32() } else { 0.0 };
        self.delta_history.push_back(delta);
        self.fps_history.push_back(fps);
    }

    pub fn average_fps(&self) -> f32 {
        if self.fps_history.is_empty() {
            return 0.0;
        }
        self.fps_history.iter().sum::<f32>() / self.fps_history.len() as f32
    }

    pub fn average_delta(&self) -> Duration {
        if self.delta_history.is_empty() {
            return Duration::ZERO;
        }
        self.delta_history.iter().sum::<Duration>() / self.delta_history.len() as u32
    }

    pub fn pending_count(&self) -> usize {
        self.callbacks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    #[test]
    fn request_then_tick_invokes_the_callback() {
        let mut ticker = AnimationTicker::new(60);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        ticker.request(move |_tick| {
            calls_clone.fetch_add(1, Ordering::Relaxed);
        });
        ticker.tick(Instant::now());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn cancel_removes_a_registered_callback() {
        let mut ticker = AnimationTicker::new(60);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let id = ticker.request(move |_tick| {
            calls_clone.fetch_add(1, Ordering::Relaxed);
        });
        ticker.cancel(id);
        ticker.tick(Instant::now());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn paused_ticker_skips_every_callback() {
        let mut ticker = AnimationTicker::new(60);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        ticker.request(move |_tick| {
            calls_clone.fetch_add(1, Ordering::Relaxed);
        });
        ticker.pause();
        ticker.tick(Instant::now());
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn tick_faster_than_target_fps_is_skipped() {
        let mut ticker = AnimationTicker::new(30);
        let now = Instant::now();
        ticker.tick(now);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        ticker.request(move |_t| {
            calls_clone.fetch_add(1, Ordering::Relaxed);
        });
        ticker.tick(now + Duration::from_millis(1));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn average_fps_is_zero_with_no_history() {
        let ticker = AnimationTicker::new(60);
        assert_eq!(ticker.average_fps(), 0.0);
    }
}
