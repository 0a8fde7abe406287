//! Lookup tables for the CSI/SS3 key vocabulary.

use tessera_events::{KeyCode, NamedKey};

/// Modifier bits packed into the `;<m>` parameter xterm uses: `m = 1 +
/// (shift | alt<<1 | ctrl<<2)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

pub fn decode_modifier_param(m: u32) -> Modifiers {
    if m == 0 {
        return Modifiers::default();
    }
    let bits = m.saturating_sub(1);
    Modifiers {
        shift: bits & 0b001 != 0,
        alt: bits & 0b010 != 0,
        ctrl: bits & 0b100 != 0,
    }
}

/// Final byte of a plain `ESC[<letter>` or `ESC O <letter>` sequence.
pub fn letter_to_key(letter: u8) -> Option<KeyCode> {
    match letter {
        b'A' => Some(KeyCode::Named(NamedKey::Up)),
        b'B' => Some(KeyCode::Named(NamedKey::Down)),
        b'C' => Some(KeyCode::Named(NamedKey::Right)),
        b'D' => Some(KeyCode::Named(NamedKey::Left)),
        b'H' => Some(KeyCode::Named(NamedKey::Home)),
        b'F' => Some(KeyCode::Named(NamedKey::End)),
        b'P' => Some(KeyCode::Named(NamedKey::F(1))),
        b'Q' => Some(KeyCode::Named(NamedKey::F(2))),
        b'R' => Some(KeyCode::Named(NamedKey::F(3))),
        b'S' => Some(KeyCode::Named(NamedKey::F(4))),
        _ => None,
    }
}

/// `ESC[<n>~` numeric final-tilde sequences: function keys 5-12 and the
/// navigation cluster.
pub fn tilde_param_to_key(n: u32) -> Option<KeyCode> {
    match n {
        1 => Some(KeyCode::Named(NamedKey::Home)),
        2 => Some(KeyCode::Named(NamedKey::Insert)),
        3 => Some(KeyCode::Named(NamedKey::Delete)),
        4 => Some(KeyCode::Named(NamedKey::End)),
        5 => Some(KeyCode::Named(NamedKey::PageUp)),
        6 => Some(KeyCode::Named(NamedKey::PageDown)),
        15 => Some(KeyCode::Named(NamedKey::F(5))),
        17 => Some(KeyCode::Named(NamedKey::F(6))),
        18 => Some(KeyCode::Named(NamedKey::F(7))),
        19 => Some(KeyCode::Named(NamedKey::F(8))),
        20 => Some(KeyCode::Named(NamedKey::F(9))),
        21 => Some(KeyCode::Named(NamedKey::F(10))),
        23 => Some(KeyCode::Named(NamedKey::F(11))),
        24 => Some(KeyCode::Named(NamedKey::F(12))),
        _ => None,
    }
}
