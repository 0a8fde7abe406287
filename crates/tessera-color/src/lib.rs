//! Color model and ANSI escape-sequence encoder.
//!
//! A `Color` is always stored at full fidelity (`Rgb`, `Indexed256`,
//! `Named`, or `Default`); the [`Encoder`] is responsible for downgrading
//! to whatever the terminal actually supports when it emits bytes.

use tracing::debug;

/// One of the 16 standard ANSI colors (8 normal + 8 bright).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl NamedColor {
    /// Index into the 16-entry ANSI palette (0..=15), matching SGR code order.
    pub const fn index(self) -> u8 {
        match self {
            NamedColor::Black => 0,
            NamedColor::Red => 1,
            NamedColor::Green => 2,
            NamedColor::Yellow => 3,
            NamedColor::Blue => 4,
            NamedColor::Magenta => 5,
            NamedColor::Cyan => 6,
            NamedColor::White => 7,
            NamedColor::BrightBlack => 8,
            NamedColor::BrightRed => 9,
            NamedColor::BrightGreen => 10,
            NamedColor::BrightYellow => 11,
            NamedColor::BrightBlue => 12,
            NamedColor::BrightMagenta => 13,
            NamedColor::BrightCyan => 14,
            NamedColor::BrightWhite => 15,
        }
    }

    fn rgb(self) -> (u8, u8, u8) {
        BASIC16_RGB[self.index() as usize]
    }
}

/// A color at full fidelity. `Default` is a distinct variant from any
/// explicit color that happens to match the terminal's own default; the
/// two are never unified during diffing or encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Default,
    Named(NamedColor),
    Indexed256(u8),
    Rgb { r: u8, g: u8, b: u8 },
}

impl Color {
    fn rgb(self) -> Option<(u8, u8, u8)> {
        match self {
            Color::Default => None,
            Color::Named(n) => Some(n.rgb()),
            Color::Indexed256(i) => Some(palette256_entry(i)),
            Color::Rgb { r, g, b } => Some((r, g, b)),
        }
    }
}

/// Ceiling on encoding fidelity, ordered from least to most capable so
/// `a < b` means "`a` is a stricter cap than `b`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TerminalColorSupport {
    None,
    Basic16,
    Extended256,
    TrueColor,
}

/// Detect color support from the two environment hints a terminal exposes.
///
/// `COLORTERM` containing `truecolor` or `24bit` wins outright; otherwise
/// `TERM` is inspected for `256color`, then the generic `xterm|screen|vt|ansi`
/// family, falling back to no color support at all.
pub fn detect_support(colorterm: Option<&str>, term: Option<&str>) -> TerminalColorSupport {
    if let Some(ct) = colorterm {
        let ct = ct.to_ascii_lowercase();
        if ct.contains("truecolor") || ct.contains("24bit") {
            debug!(colorterm = %ct, "detected truecolor support");
            return TerminalColorSupport::TrueColor;
        }
    }
    if let Some(term) = term {
        let t = term.to_ascii_lowercase();
        if t.contains("256color") {
            debug!(term = %t, "detected 256-color support");
            return TerminalColorSupport::Extended256;
        }
        if t.contains("xterm") || t.contains("screen") || t.contains("vt") || t.contains("ansi") {
            debug!(term = %t, "detected basic 16-color support");
            return TerminalColorSupport::Basic16;
        }
    }
    debug!("no recognized color hints, disabling color output");
    TerminalColorSupport::None
}

/// Translates [`Color`] values into SGR byte sequences, downgrading to the
/// active [`TerminalColorSupport`] ceiling.
#[derive(Debug, Clone)]
pub struct Encoder {
    detected: TerminalColorSupport,
    forced: Option<TerminalColorSupport>,
}

impl Encoder {
    pub fn new(colorterm: Option<&str>, term: Option<&str>) -> Self {
        Self {
            detected: detect_support(colorterm, term),
            forced: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var("COLORTERM").ok().as_deref(),
            std::env::var("TERM").ok().as_deref(),
        )
    }

    pub fn support_level(&self) -> TerminalColorSupport {
        self.forced.unwrap_or(self.detected)
    }

    pub fn force_level(&mut self, level: Option<TerminalColorSupport>) {
        self.forced = level;
    }

    /// Foreground escape bytes for `color`, downgraded as needed. Empty for
    /// `Color::Default` (callers rely on `reset()` to clear prior styling).
    pub fn fg(&self, color: Color) -> Vec<u8> {
        self.encode(color, 38, 30)
    }

    /// Background escape bytes for `color`, downgraded as needed.
    pub fn bg(&self, color: Color) -> Vec<u8> {
        self.encode(color, 48, 40)
    }

    pub fn reset(&self) -> Vec<u8> {
        b"\x1b[0m".to_vec()
    }

    fn encode(&self, color: Color, extended_prefix: u8, basic_base: u8) -> Vec<u8> {
        let Some(rgb) = color.rgb() else {
            return Vec::new();
        };
        match self.support_level() {
            TerminalColorSupport::None => Vec::new(),
            TerminalColorSupport::TrueColor => {
                format!("\x1b[{};2;{};{};{}m", extended_prefix, rgb.0, rgb.1, rgb.2).into_bytes()
            }
            TerminalColorSupport::Extended256 => {
                let idx = nearest_256(rgb);
                format!("\x1b[{};5;{}m", extended_prefix, idx).into_bytes()
            }
            TerminalColorSupport::Basic16 => {
                let idx = nearest_16(rgb);
                format!("\x1b[{}m", basic_base + idx).into_bytes()
            }
        }
    }
}

const BASIC16_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (205, 0, 0),
    (0, 205, 0),
    (205, 205, 0),
    (0, 0, 238),
    (205, 0, 205),
    (0, 205, 205),
    (229, 229, 229),
    (127, 127, 127),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (92, 92, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

fn cube_step(n: u8) -> u8 {
    if n == 0 { 0 } else { 55 + n * 40 }
}

/// Resolve the RGB components represented by a 256-color palette index,
/// covering the 16 system colors, the 6x6x6 cube, and the 24-step grayscale
/// ramp.
fn palette256_entry(index: u8) -> (u8, u8, u8) {
    match index {
        0..=15 => BASIC16_RGB[index as usize],
        16..=231 => {
            let i = index - 16;
            let r = i / 36;
            let g = (i % 36) / 6;
            let b = i % 6;
            (cube_step(r), cube_step(g), cube_step(b))
        }
        232..=255 => {
            let level = 8 + (index - 232) * 10;
            (level, level, level)
        }
    }
}

fn dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Nearest of the 8 standard colors (indices 0-7); the bright block
/// (8-15) is excluded because `30 + idx`/`40 + idx` only spans the
/// standard range — a bright hit would overflow into the extended-color
/// introducer (38/48) or the background block (40-47 from an `fg` call).
fn nearest_16(rgb: (u8, u8, u8)) -> u8 {
    BASIC16_RGB[..8]
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| dist2(rgb, **c))
        .map(|(i, _)| i as u8)
        .unwrap_or(0)
}

/// Nearest entry in the 6x6x6 cube or grayscale ramp (indices 16-255).
/// The 16 system-color slots are excluded: `Rgb` values should downgrade
/// through the cube §4.1 describes, not alias back onto the system palette.
fn nearest_256(rgb: (u8, u8, u8)) -> u8 {
    (16u16..256)
        .min_by_key(|&i| dist2(rgb, palette256_entry(i as u8)))
        .map(|i| i as u8)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_truecolor_from_colorterm() {
        assert_eq!(
            detect_support(Some("truecolor"), Some("xterm")),
            TerminalColorSupport::TrueColor
        );
    }

    #[test]
    fn detects_256color_from_term() {
        assert_eq!(
            detect_support(None, Some("xterm-256color")),
            TerminalColorSupport::Extended256
        );
    }

    #[test]
    fn detects_basic16_from_term() {
        assert_eq!(
            detect_support(None, Some("screen")),
            TerminalColorSupport::Basic16
        );
    }

    #[test]
    fn detects_none_when_unrecognized() {
        assert_eq!(detect_support(None, Some("dumb")), TerminalColorSupport::None);
    }

    #[test]
    fn forced_basic16_downgrades_rgb_red_to_ansi_red() {
        let mut enc = Encoder::new(Some("truecolor"), Some("xterm"));
        enc.force_level(Some(TerminalColorSupport::Basic16));
        let bytes = enc.fg(Color::Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(bytes, b"\x1b[31m".to_vec());
    }

    #[test]
    fn forced_extended256_uses_nearest_cube_entry() {
        let mut enc = Encoder::new(Some("truecolor"), Some("xterm"));
        enc.force_level(Some(TerminalColorSupport::Extended256));
        let bytes = enc.fg(Color::Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(bytes, b"\x1b[38;5;196m".to_vec());
    }

    #[test]
    fn truecolor_emits_24bit_sequence() {
        let mut enc = Encoder::new(None, None);
        enc.force_level(Some(TerminalColorSupport::TrueColor));
        let bytes = enc.bg(Color::Rgb {
            r: 10,
            g: 20,
            b: 30,
        });
        assert_eq!(bytes, b"\x1b[48;2;10;20;30m".to_vec());
    }

    #[test]
    fn default_color_never_emits_bytes() {
        let enc = Encoder::new(Some("truecolor"), Some("xterm"));
        assert!(enc.fg(Color::Default).is_empty());
        assert!(enc.bg(Color::Default).is_empty());
    }

    #[test]
    fn no_support_suppresses_all_color_bytes() {
        let mut enc = Encoder::new(None, None);
        enc.force_level(Some(TerminalColorSupport::None));
        assert!(enc.fg(Color::Rgb { r: 1, g: 2, b: 3 }).is_empty());
    }
}
