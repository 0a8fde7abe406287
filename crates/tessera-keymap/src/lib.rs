//! Single-chord and timed multi-chord sequence key bindings.

mod bindings;
mod chord;

pub use bindings::{BindingId, KeyBindings};
pub use chord::{format_chord, parse_chord, KeyChord, ParseChordError};
