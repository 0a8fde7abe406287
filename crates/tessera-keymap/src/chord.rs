//! `KeyChord` plus its textual notation (`"ctrl+shift+s"`).

use tessera_events::{KeyCode, NamedKey};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: KeyCode,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    /// Chord-name equality: same key name plus exact modifier booleans.
    /// `case_sensitive` only affects `Char` key-name comparison.
    pub fn matches(&self, other: &KeyChord, case_sensitive: bool) -> bool {
        if self.ctrl != other.ctrl || self.alt != other.alt || self.shift != other.shift {
            return false;
        }
        match (self.key, other.key) {
            (KeyCode::Char(a), KeyCode::Char(b)) if !case_sensitive => {
                a.to_ascii_lowercase() == b.to_ascii_lowercase()
            }
            (a, b) => a == b,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseChordError {
    #[error("empty chord")]
    Empty,
    #[error("unknown key token: {0}")]
    UnknownToken(String),
}

/// Parse `"ctrl+shift+s"`-style notation. Modifier order is irrelevant;
/// exactly one non-modifier token (the key) is required.
pub fn parse_chord(text: &str) -> Result<KeyChord, ParseChordError> {
    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;
    let mut key = None;

    for token in text.split('+') {
        let token = token.trim();
        if token.is_empty() {
            return Err(ParseChordError::Empty);
        }
        match token.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => ctrl = true,
            "alt" | "option" => alt = true,
            "shift" => shift = true,
            other => {
                if key.is_some() {
                    return Err(ParseChordError::UnknownToken(token.to_string()));
                }
                key = Some(named_or_char(other).ok_or_else(|| ParseChordError::UnknownToken(token.to_string()))?);
            }
        }
    }

    let key = key.ok_or(ParseChordError::Empty)?;
    Ok(KeyChord { key, ctrl, alt, shift })
}

fn named_or_char(token: &str) -> Option<KeyCode> {
    let named = match token {
        "enter" | "return" => Some(NamedKey::Enter),
        "tab" => Some(NamedKey::Tab),
        "backspace" => Some(NamedKey::Backspace),
        "esc" | "escape" => Some(NamedKey::Escape),
        "up" => Some(NamedKey::Up),
        "down" => Some(NamedKey::Down),
        "left" => Some(NamedKey::Left),
        "right" => Some(NamedKey::Right),
        "home" => Some(NamedKey::Home),
        "end" => Some(NamedKey::End),
        "pageup" => Some(NamedKey::PageUp),
        "pagedown" => Some(NamedKey::PageDown),
        "insert" => Some(NamedKey::Insert),
        "delete" | "del" => Some(NamedKey::Delete),
        "space" => Some(NamedKey::Space),
        _ => None,
    };
    if let Some(n) = named {
        return Some(KeyCode::Named(n));
    }
    if let Some(n) = token.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        return Some(KeyCode::Named(NamedKey::F(n)));
    }
    let mut chars = token.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };
    Some(KeyCode::Char(c))
}

/// Canonical `ctrl+alt+shift+key` rendering, lowercase.
pub fn format_chord(chord: &KeyChord) -> String {
    let mut parts = Vec::new();
    if chord.ctrl {
        parts.push("ctrl".to_string());
    }
    if chord.alt {
        parts.push("alt".to_string());
    }
    if chord.shift {
        parts.push("shift".to_string());
    }
    parts.push(match chord.key {
        KeyCode::Char(c) => c.to_ascii_lowercase().to_string(),
        KeyCode::Named(NamedKey::Enter) => "enter".to_string(),
        KeyCode::Named(NamedKey::Tab) => "tab".to_string(),
        KeyCode::Named(NamedKey::Backspace) => "backspace".to_string(),
        KeyCode::Named(NamedKey::Escape) => "esc".to_string(),
        KeyCode::Named(NamedKey::Up) => "up".to_string(),
        KeyCode::Named(NamedKey::Down) => "down".to_string(),
        KeyCode::Named(NamedKey::Left) => "left".to_string(),
        KeyCode::Named(NamedKey::Right) => "right".to_string(),
        KeyCode::Named(NamedKey::Home) => "home".to_string(),
        KeyCode::Named(NamedKey::End) => "end".to_string(),
        KeyCode::Named(NamedKey::PageUp) => "pageup".to_string(),
        KeyCode::Named(NamedKey::PageDown) => "pagedown".to_string(),
        KeyCode::Named(NamedKey::Insert) => "insert".to_string(),
        KeyCode::Named(NamedKey::Delete) => "delete".to_string(),
        KeyCode::Named(NamedKey::Space) => "space".to_string(),
        KeyCode::Named(NamedKey::F(n)) => format!("f{n}"),
    });
    parts.join("+")
}
