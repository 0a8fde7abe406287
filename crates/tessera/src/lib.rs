//! Facade crate: wires the color/cell/terminal/event/input/keymap/signal/
//! layout/render/widget/config crates into one cooperative runtime, plus
//! the logging and panic-hook bootstrap a hosting binary needs to run it.
//!
//! This crate owns no CLI surface of its own — no argument parsing, no
//! `main`. A host binary constructs a [`Runtime`], feeds it terminal bytes
//! and wall-clock timestamps, and drives [`Runtime::tick`] in a loop.

mod logging;
mod runtime;

pub use logging::{init_logging, install_panic_hook};
pub use runtime::{Runtime, TickOutcome};

pub use tessera_cell as cell;
pub use tessera_color as color;
pub use tessera_config as config;
pub use tessera_events as events;
pub use tessera_input as input;
pub use tessera_keymap as keymap;
pub use tessera_layout as layout;
pub use tessera_render as render;
pub use tessera_signal as signal;
pub use tessera_terminal as terminal;
pub use tessera_widget as widget;
