//! Layered configuration surface.
//!
//! Discovery order is: an explicit path, then `tessera.toml` in the current
//! directory, then the platform config directory, then compiled-in
//! defaults. A missing or malformed file never aborts startup — it falls
//! back to defaults and logs a warning.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Which diffing strategy the renderer picks by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Full,
    Differential,
    Smart,
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::Smart
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub target_fps: u32,
    pub frame_rate_limiting: bool,
    pub hide_cursor: bool,
    pub max_queue_size: usize,
    pub strategy: StrategyKind,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            frame_rate_limiting: true,
            hide_cursor: true,
            max_queue_size: 10,
            strategy: StrategyKind::Smart,
        }
    }
}

impl RendererConfig {
    /// Clamp `target_fps` into `[1, 144]` and require at least one queue
    /// slot, the way a resize recomputes layout breakpoints elsewhere in the
    /// pipeline: out-of-range input is corrected, never rejected.
    pub fn recompute_with_context(&mut self) {
        let clamped_fps = self.target_fps.clamp(1, 144);
        if clamped_fps != self.target_fps {
            warn!(
                requested = self.target_fps,
                clamped = clamped_fps,
                "target_fps out of range, clamping"
            );
            self.target_fps = clamped_fps;
        }
        if self.max_queue_size == 0 {
            warn!("max_queue_size of 0 is invalid, forcing to 1");
            self.max_queue_size = 1;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub escape_timeout_ms: u64,
    pub max_escape_length: usize,
    pub mouse_support: bool,
    pub bracketed_paste: bool,
    pub focus_events: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            escape_timeout_ms: 50,
            max_escape_length: 100,
            mouse_support: true,
            bracketed_paste: true,
            focus_events: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyBindingsConfig {
    pub sequence_timeout_ms: u64,
    pub case_sensitive: bool,
}

impl Default for KeyBindingsConfig {
    fn default() -> Self {
        Self {
            sequence_timeout_ms: 1000,
            case_sensitive: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventQueueConfig {
    pub max_size: Option<usize>,
    pub drop_low_priority_on_overflow: bool,
}

impl Default for EventQueueConfig {
    fn default() -> Self {
        Self {
            max_size: None,
            drop_low_priority_on_overflow: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalHandlerConfig {
    pub int: bool,
    pub term: bool,
    pub hup: bool,
    pub winch: bool,
    pub quit: bool,
    pub tstp: bool,
    pub cont: bool,
}

impl Default for SignalHandlerConfig {
    fn default() -> Self {
        Self {
            int: true,
            term: true,
            hup: true,
            winch: true,
            quit: true,
            tstp: true,
            cont: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub buffer_size: usize,
    pub auto_flush: bool,
    pub flush_interval_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            auto_flush: false,
            flush_interval_ms: 0,
            max_retries: 3,
            retry_delay_ms: 10,
        }
    }
}

/// On-disk shape. Every section is optional and every field defaults, so a
/// partial file (or an empty one) is always valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    renderer: RendererConfig,
    input: InputConfig,
    key_bindings: KeyBindingsConfig,
    event_queue: EventQueueConfig,
    signal_handler: SignalHandlerConfig,
    output: OutputConfig,
}

/// The full layered configuration, one sub-struct per component.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub renderer: RendererConfig,
    pub input: InputConfig,
    pub key_bindings: KeyBindingsConfig,
    pub event_queue: EventQueueConfig,
    pub signal_handler: SignalHandlerConfig,
    pub output: OutputConfig,
}

impl From<ConfigFile> for Config {
    fn from(f: ConfigFile) -> Self {
        Config {
            renderer: f.renderer,
            input: f.input,
            key_bindings: f.key_bindings,
            event_queue: f.event_queue,
            signal_handler: f.signal_handler,
            output: f.output,
        }
    }
}

impl Config {
    /// Search order: local `tessera.toml`, then the platform config
    /// directory's `tessera/tessera.toml`. Returns `None` if neither exists.
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from("tessera.toml");
        if local.is_file() {
            return Some(local);
        }
        let platform = dirs::config_dir()?.join("tessera").join("tessera.toml");
        platform.is_file().then_some(platform)
    }

    /// Load from `path`, falling back to defaults (never an error) on a
    /// missing file or a parse failure.
    pub fn load_from(path: Option<&Path>) -> Config {
        let Some(path) = path else {
            return Config::default();
        };
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config file unreadable, using defaults");
                return Config::default();
            }
        };
        match toml::from_str::<ConfigFile>(&text) {
            Ok(file) => file.into(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config file malformed, using defaults");
                Config::default()
            }
        }
    }

    pub fn load() -> Config {
        Self::load_from(Self::discover().as_deref())
    }

    pub fn recompute_with_context(&mut self) {
        self.renderer.recompute_with_context();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = Config::load_from(Some(Path::new("/nonexistent/tessera.toml")));
        assert_eq!(cfg.renderer.target_fps, 60);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessera.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "this is not valid toml [[[").unwrap();
        let cfg = Config::load_from(Some(&path));
        assert_eq!(cfg.renderer.target_fps, 60);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessera.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "[renderer]\ntarget_fps = 30\n").unwrap();
        let cfg = Config::load_from(Some(&path));
        assert_eq!(cfg.renderer.target_fps, 30);
        assert!(cfg.renderer.frame_rate_limiting);
        assert_eq!(cfg.input.escape_timeout_ms, 50);
    }

    #[test]
    fn recompute_clamps_out_of_range_fps() {
        let mut cfg = Config::default();
        cfg.renderer.target_fps = 9999;
        cfg.recompute_with_context();
        assert_eq!(cfg.renderer.target_fps, 144);
    }
}
