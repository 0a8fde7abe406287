//! Logging and panic-hook bootstrap for whatever binary hosts the runtime.
//! Library crates never install a global subscriber themselves; this is
//! the one place that does, so an application gets one call to wire both.

use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `TESSERA_LOG`, falling back to
/// `RUST_LOG`, then to `info` if neither is set. Returns the worker guard
/// the caller must hold for the process lifetime — dropping it early can
/// truncate buffered log lines. A prior global subscriber (or a second call
/// in the same process) makes this a silent no-op returning `None`.
pub fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env("TESSERA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    match tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).try_init() {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

/// Logs a panic through `tracing` at `error` before chaining to whatever
/// hook was previously installed, so a panic during raw-mode is visible in
/// the log even after the terminal guard has restored the screen. Safe to
/// call more than once; only the first call installs anything.
pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(panic = %info, "panic");
            default_hook(info);
        }));
    });
}
