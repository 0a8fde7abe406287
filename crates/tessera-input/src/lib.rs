//! Hand-rolled ANSI/VT input decoder: raw bytes in, `Event`s out.
//!
//! Deliberately independent of any terminal backend crate — decoding key,
//! mouse, paste, and focus sequences from a byte stream is exactly the part
//! of the input pipeline this workspace owns outright.

mod decoder;
mod keys;

pub use decoder::{signal_priority, Decoder, BYTES_DECODED, MALFORMED_SEQUENCES, PASTE_EVENTS};
pub use keys::{decode_modifier_param, letter_to_key, tilde_param_to_key, Modifiers};
