//! Process signal handling: lock-free `AtomicBool` flags set from the
//! signal-safe handler context, translated into `Signal`/`Resize` events on
//! the next cooperative-loop tick.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::signal::{SIGCONT, SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGTSTP, SIGWINCH};
use signal_hook::flag;
use signal_hook::low_level::unregister;
use signal_hook::SigId;
use tessera_config::SignalHandlerConfig;
use tessera_events::{Event, EventKind, Priority, ResizeData, SignalKind};
use tracing::{debug, warn};

fn raw_signal(kind: SignalKind) -> i32 {
    match kind {
        SignalKind::Int => SIGINT,
        SignalKind::Term => SIGTERM,
        SignalKind::Hup => SIGHUP,
        SignalKind::Winch => SIGWINCH,
        SignalKind::Quit => SIGQUIT,
        SignalKind::Tstp => SIGTSTP,
        SignalKind::Cont => SIGCONT,
    }
}

fn enabled_kinds(config: &SignalHandlerConfig) -> Vec<SignalKind> {
    let mut kinds = Vec::new();
    if config.int {
        kinds.push(SignalKind::Int);
    }
    if config.term {
        kinds.push(SignalKind::Term);
    }
    if config.hup {
        kinds.push(SignalKind::Hup);
    }
    if config.winch {
        kinds.push(SignalKind::Winch);
    }
    if config.quit {
        kinds.push(SignalKind::Quit);
    }
    if config.tstp {
        kinds.push(SignalKind::Tstp);
    }
    if config.cont {
        kinds.push(SignalKind::Cont);
    }
    kinds
}

fn priority_for(kind: SignalKind) -> Priority {
    match kind {
        SignalKind::Int | SignalKind::Term | SignalKind::Hup | SignalKind::Quit => Priority::High,
        SignalKind::Tstp | SignalKind::Cont => Priority::Normal,
        SignalKind::Winch => Priority::High,
    }
}

struct ArmedFlag {
    kind: SignalKind,
    flag: Arc<AtomicBool>,
    id: Option<SigId>,
}

/// Outcome of one [`SignalHandler::poll`] call.
#[derive(Debug, Default)]
pub struct SignalPoll {
    pub events: Vec<Event>,
    /// `true` when Int or Term fired and no callback suppressed the default
    /// exit; the cooperative loop should stop on the next iteration.
    pub exit_requested: bool,
}

/// Installs a configurable subset of process signal handlers and translates
/// their delivery into queueable events.
pub struct SignalHandler {
    config: SignalHandlerConfig,
    armed: Vec<ArmedFlag>,
    callbacks: Vec<(SignalKind, Box<dyn FnMut(&mut Event) -> bool>)>,
    last_size: (u16, u16),
}

impl SignalHandler {
    pub fn new(config: SignalHandlerConfig) -> Self {
        Self {
            config,
            armed: Vec::new(),
            callbacks: Vec::new(),
            last_size: tessera_terminal::terminal_size(),
        }
    }

    pub fn on(&mut self, kind: SignalKind, callback: Box<dyn FnMut(&mut Event) -> bool>) {
        self.callbacks.push((kind, callback));
    }

    /// Register OS signal handlers for every kind enabled in the config.
    /// Idempotent: a second call without an intervening `stop` is a no-op.
    pub fn start(&mut self) -> io::Result<()> {
        if !self.armed.is_empty() {
            return Ok(());
        }
        for kind in enabled_kinds(&self.config) {
            let flag = Arc::new(AtomicBool::new(false));
            let id = flag::register(raw_signal(kind), Arc::clone(&flag))?;
            self.armed.push(ArmedFlag { kind, flag, id: Some(id) });
        }
        debug!(count = self.armed.len(), "signal handlers installed");
        Ok(())
    }

    /// Restore whatever handlers were in place before `start`. Idempotent.
    pub fn stop(&mut self) {
        for armed in self.armed.drain(..) {
            if let Some(id) = armed.id {
                if !unregister(id) {
                    warn!(kind = ?armed.kind, "signal handler was already unregistered");
                }
            }
        }
    }

    /// Drain every armed flag, translate deliveries into events, and run
    /// registered callbacks. Multiple Winch deliveries within one tick
    /// coalesce into a single `Resize` event.
    pub fn poll(&mut self, now_ms: u64) -> SignalPoll {
        let mut poll = SignalPoll::default();
        let mut winch_fired = false;

        for armed in &self.armed {
            if !armed.flag.swap(false, Ordering::Relaxed) {
                continue;
            }
            if armed.kind == SignalKind::Winch {
                winch_fired = true;
                continue;
            }
            let mut event = Event::new(EventKind::Signal { kind: armed.kind }, priority_for(armed.kind), now_ms);
            let mut default_exit = matches!(armed.kind, SignalKind::Int | SignalKind::Term);
            for (cb_kind, callback) in self.callbacks.iter_mut().filter(|(k, _)| *k == armed.kind) {
                let _ = cb_kind;
                if !callback(&mut event) {
                    default_exit = false;
                }
            }
            if default_exit {
                poll.exit_requested = true;
            }
            poll.events.push(event);
        }

        if winch_fired {
            let size = tessera_terminal::terminal_size();
            let resize = ResizeData {
                columns: size.0,
                rows: size.1,
                prev_columns: self.last_size.0,
                prev_rows: self.last_size.1,
            };
            self.last_size = size;
            let mut event = Event::new(EventKind::Resize(resize), Priority::High, now_ms);
            for (cb_kind, callback) in self.callbacks.iter_mut().filter(|(k, _)| *k == SignalKind::Winch) {
                let _ = cb_kind;
                callback(&mut event);
            }
            poll.events.push(event);
        }

        poll
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_kinds_respects_config_flags() {
        let mut cfg = SignalHandlerConfig::default();
        cfg.winch = false;
        cfg.tstp = false;
        cfg.cont = false;
        let kinds = enabled_kinds(&cfg);
        assert!(kinds.contains(&SignalKind::Int));
        assert!(!kinds.contains(&SignalKind::Winch));
    }

    #[test]
    fn poll_without_start_reports_nothing() {
        let mut handler = SignalHandler::new(SignalHandlerConfig::default());
        let poll = handler.poll(0);
        assert!(poll.events.is_empty());
        assert!(!poll.exit_requested);
    }

    #[test]
    fn int_signal_synthesized_via_flag_requests_exit_by_default() {
        let mut handler = SignalHandler::new(SignalHandlerConfig::default());
        let flag = Arc::new(AtomicBool::new(true));
        // Simulate delivery without touching real OS signal state.
        handler.armed.push(ArmedFlag {
            kind: SignalKind::Int,
            flag: flag.clone(),
            id: None,
        });
        let poll = handler.poll(0);
        assert!(poll.exit_requested);
        assert_eq!(poll.events.len(), 1);
    }

    #[test]
    fn callback_returning_false_suppresses_default_exit() {
        let mut handler = SignalHandler::new(SignalHandlerConfig::default());
        handler.on(SignalKind::Int, Box::new(|_| false));
        let flag = Arc::new(AtomicBool::new(true));
        handler.armed.push(ArmedFlag {
            kind: SignalKind::Int,
            flag,
            id: None,
        });
        let poll = handler.poll(0);
        assert!(!poll.exit_requested);
    }
}
