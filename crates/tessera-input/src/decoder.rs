//! Byte-level ANSI input decoder: `Ground -> Escape -> Csi/Ss3 -> ...`.
//!
//! The decoder never blocks waiting for more bytes. A half-open escape
//! sequence is held in `state` and reported via [`Decoder::is_incomplete`];
//! the caller is responsible for calling [`Decoder::poll_timeout`] with the
//! current time so a bare `ESC` (or any stalled sequence) is eventually
//! flushed back as a literal keystroke instead of being swallowed forever.

use std::sync::atomic::{AtomicU64, Ordering};

use tessera_config::InputConfig;
use tessera_events::{
    Event, EventKind, KeyCode, KeyData, MouseAction, MouseButton, MouseData, NamedKey, Priority,
    SignalKind,
};
use tracing::warn;

use crate::keys::{decode_modifier_param, letter_to_key, tilde_param_to_key};

pub static BYTES_DECODED: AtomicU64 = AtomicU64::new(0);
pub static PASTE_EVENTS: AtomicU64 = AtomicU64::new(0);
pub static MALFORMED_SEQUENCES: AtomicU64 = AtomicU64::new(0);

const PASTE_CLOSE: &[u8] = b"\x1b[201~";

#[derive(Debug, Clone)]
enum State {
    Ground,
    Escape,
    Csi(Vec<u8>),
    Ss3,
    MouseX10(Vec<u8>),
    Paste(Vec<u8>, usize),
}

pub struct Decoder {
    state: State,
    config: InputConfig,
    escape_started_at_ms: Option<u64>,
}

impl Decoder {
    pub fn new(config: InputConfig) -> Self {
        Self {
            state: State::Ground,
            config,
            escape_started_at_ms: None,
        }
    }

    /// Whether a sequence is mid-flight (caller should keep polling
    /// `poll_timeout` so it isn't stuck forever).
    pub fn is_incomplete(&self) -> bool {
        !matches!(self.state, State::Ground)
    }

    pub fn feed(&mut self, bytes: &[u8], now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for &b in bytes {
            BYTES_DECODED.fetch_add(1, Ordering::Relaxed);
            self.process_byte(b, now_ms, &mut events);
        }
        events
    }

    /// Flush a stalled escape sequence as a literal key once
    /// `escape_timeout_ms` has elapsed since it started.
    pub fn poll_timeout(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(started) = self.escape_started_at_ms else {
            return events;
        };
        if now_ms.saturating_sub(started) < self.config.escape_timeout_ms {
            return events;
        }
        match std::mem::replace(&mut self.state, State::Ground) {
            State::Escape => {
                events.push(self.key_event(KeyCode::Named(NamedKey::Escape), false, false, false, now_ms));
            }
            State::Csi(_) | State::Ss3 | State::MouseX10(_) => {
                MALFORMED_SEQUENCES.fetch_add(1, Ordering::Relaxed);
                warn!("escape sequence timed out, flushing literal ESC");
                events.push(self.key_event(KeyCode::Named(NamedKey::Escape), false, false, false, now_ms));
            }
            other => {
                self.state = other;
                return events;
            }
        }
        self.escape_started_at_ms = None;
        events
    }

    fn process_byte(&mut self, b: u8, now_ms: u64, events: &mut Vec<Event>) {
        match &self.state {
            State::Ground => self.handle_ground(b, now_ms, events),
            State::Escape => self.handle_escape(b, now_ms, events),
            State::Csi(_) => self.handle_csi(b, now_ms, events),
            State::Ss3 => self.handle_ss3(b, now_ms, events),
            State::MouseX10(_) => self.handle_mouse_x10(b, now_ms, events),
            State::Paste(_, _) => self.handle_paste(b, now_ms, events),
        }
    }

    fn handle_ground(&mut self, b: u8, now_ms: u64, events: &mut Vec<Event>) {
        if b == 0x1B {
            self.state = State::Escape;
            self.escape_started_at_ms = Some(now_ms);
            return;
        }
        if let Some((code, ctrl)) = control_byte_to_key(b) {
            events.push(self.key_event(code, ctrl, false, false, now_ms));
            return;
        }
        events.push(self.key_event(KeyCode::Char(b as char), false, false, false, now_ms));
    }

    fn handle_escape(&mut self, b: u8, now_ms: u64, events: &mut Vec<Event>) {
        match b {
            b'[' => self.state = State::Csi(Vec::new()),
            b'O' => self.state = State::Ss3,
            0x1B => {
                events.push(self.key_event(KeyCode::Named(NamedKey::Escape), false, true, false, now_ms));
                self.reset_to_ground();
            }
            other => {
                events.push(self.key_event(KeyCode::Char(other as char), false, true, false, now_ms));
                self.reset_to_ground();
            }
        }
    }

    fn handle_csi(&mut self, b: u8, now_ms: u64, events: &mut Vec<Event>) {
        let mut params = match std::mem::replace(&mut self.state, State::Ground) {
            State::Csi(p) => p,
            other => {
                self.state = other;
                return;
            }
        };
        if params.is_empty() && b == b'M' {
            self.state = State::MouseX10(Vec::new());
            return;
        }
        if (0x40..=0x7E).contains(&b) {
            self.finalize_csi(&params, b, now_ms, events);
            return;
        }
        if params.len() >= self.config.max_escape_length {
            MALFORMED_SEQUENCES.fetch_add(1, Ordering::Relaxed);
            warn!(len = params.len(), "csi sequence exceeded max length, resynchronizing");
            events.push(self.key_event(KeyCode::Named(NamedKey::Escape), false, false, false, now_ms));
            self.reset_to_ground();
            self.handle_ground(b, now_ms, events);
            return;
        }
        params.push(b);
        self.state = State::Csi(params);
    }

    fn finalize_csi(&mut self, params: &[u8], final_byte: u8, now_ms: u64, events: &mut Vec<Event>) {
        let sgr = params.first() == Some(&b'<');
        let body = if sgr { &params[1..] } else { params };
        let text = String::from_utf8_lossy(body);
        let nums: Vec<i64> = text
            .split(';')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<i64>().unwrap_or(0))
            .collect();

        self.state = State::Ground;
        self.escape_started_at_ms = None;

        match final_byte {
            b'M' if sgr => self.emit_sgr_mouse(&nums, true, now_ms, events),
            b'm' if sgr => self.emit_sgr_mouse(&nums, false, now_ms, events),
            b'I' => events.push(Event::new(EventKind::Focus { gained: true }, Priority::Normal, now_ms)),
            b'O' => events.push(Event::new(EventKind::Focus { gained: false }, Priority::Normal, now_ms)),
            b'~' => {
                let n = nums.first().copied().unwrap_or(0);
                if n == 200 {
                    self.state = State::Paste(Vec::new(), 0);
                    return;
                }
                if n == 201 {
                    return;
                }
                let modifiers = decode_modifier_param(nums.get(1).copied().unwrap_or(0).max(0) as u32);
                if let Some(code) = tilde_param_to_key(n.max(0) as u32) {
                    events.push(self.key_event(code, modifiers.ctrl, modifiers.alt, modifiers.shift, now_ms));
                }
            }
            letter if letter.is_ascii_alphabetic() => {
                if let Some(code) = letter_to_key(letter) {
                    let modifiers = decode_modifier_param(nums.get(1).copied().unwrap_or(0).max(0) as u32);
                    events.push(self.key_event(code, modifiers.ctrl, modifiers.alt, modifiers.shift, now_ms));
                } else {
                    MALFORMED_SEQUENCES.fetch_add(1, Ordering::Relaxed);
                }
            }
            _ => {
                MALFORMED_SEQUENCES.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn handle_ss3(&mut self, b: u8, now_ms: u64, events: &mut Vec<Event>) {
        if let Some(code) = letter_to_key(b) {
            events.push(self.key_event(code, false, false, false, now_ms));
        } else {
            MALFORMED_SEQUENCES.fetch_add(1, Ordering::Relaxed);
        }
        self.reset_to_ground();
    }

    fn handle_mouse_x10(&mut self, b: u8, now_ms: u64, events: &mut Vec<Event>) {
        let mut buf = match std::mem::replace(&mut self.state, State::Ground) {
            State::MouseX10(buf) => buf,
            other => {
                self.state = other;
                return;
            }
        };
        buf.push(b);
        if buf.len() < 3 {
            self.state = State::MouseX10(buf);
            return;
        }
        self.escape_started_at_ms = None;
        let cb = buf[0].wrapping_sub(32);
        let x = buf[1].wrapping_sub(32) as u16;
        let y = buf[2].wrapping_sub(32) as u16;
        emit_x10_mouse(cb, x, y, now_ms, events);
    }

    fn handle_paste(&mut self, b: u8, now_ms: u64, events: &mut Vec<Event>) {
        let (mut content, mut match_len) = match std::mem::replace(&mut self.state, State::Ground) {
            State::Paste(c, m) => (c, m),
            other => {
                self.state = other;
                return;
            }
        };
        if b == PASTE_CLOSE[match_len] {
            match_len += 1;
            if match_len == PASTE_CLOSE.len() {
                let text = String::from_utf8_lossy(&content).into_owned();
                PASTE_EVENTS.fetch_add(1, Ordering::Relaxed);
                events.push(Event::new(EventKind::Paste { text }, Priority::Normal, now_ms));
                return;
            }
            self.state = State::Paste(content, match_len);
            return;
        }
        if match_len > 0 {
            content.extend_from_slice(&PASTE_CLOSE[..match_len]);
        }
        if b == PASTE_CLOSE[0] {
            self.state = State::Paste(content, 1);
        } else {
            content.push(b);
            self.state = State::Paste(content, 0);
        }
    }

    fn reset_to_ground(&mut self) {
        self.state = State::Ground;
        self.escape_started_at_ms = None;
    }

    fn key_event(&self, code: KeyCode, ctrl: bool, alt: bool, shift: bool, now_ms: u64) -> Event {
        let numeric = match code {
            KeyCode::Char(c) => c as u32,
            KeyCode::Named(_) => 0,
        };
        let is_ctrl_c = matches!(code, KeyCode::Char('c')) && ctrl;
        let priority = if is_ctrl_c { Priority::High } else { Priority::Normal };
        Event::new(
            EventKind::Key(KeyData {
                key: code,
                raw: Vec::new(),
                ctrl,
                alt,
                shift,
                code: numeric,
            }),
            priority,
            now_ms,
        )
    }
}

fn control_byte_to_key(b: u8) -> Option<(KeyCode, bool)> {
    match b {
        0x09 => Some((KeyCode::Named(NamedKey::Tab), false)),
        0x0D => Some((KeyCode::Named(NamedKey::Enter), false)),
        0x08 | 0x7F => Some((KeyCode::Named(NamedKey::Backspace), false)),
        0x00 => Some((KeyCode::Char('@'), true)),
        0x01..=0x1A => Some((KeyCode::Char((b'a' + (b - 1)) as char), true)),
        0x1C..=0x1F => Some((KeyCode::Char((b'\\' + (b - 0x1C)) as char), true)),
        _ => None,
    }
}

fn emit_x10_mouse(cb: u8, x: u16, y: u16, now_ms: u64, events: &mut Vec<Event>) {
    let cbu = cb as u32;
    let low = cbu & 0x03;
    let shift = cbu & 0x04 != 0;
    let alt = cbu & 0x08 != 0;
    let ctrl = cbu & 0x10 != 0;
    let (button, action) = if low == 3 {
        (MouseButton::None, MouseAction::Release)
    } else {
        let btn = match low {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        };
        (btn, MouseAction::Press)
    };
    events.push(Event::new(
        EventKind::Mouse(MouseData {
            action,
            button,
            x,
            y,
            ctrl,
            alt,
            shift,
        }),
        Priority::Normal,
        now_ms,
    ));
}

fn decode_mouse_button(cb: u32) -> (MouseButton, bool, bool, bool, bool) {
    let shift = cb & 0x04 != 0;
    let alt = cb & 0x08 != 0;
    let ctrl = cb & 0x10 != 0;
    let motion = cb & 0x20 != 0;
    let scroll = cb & 0x40 != 0;
    let low = cb & 0x03;
    let button = if scroll {
        if low == 0 { MouseButton::WheelUp } else { MouseButton::WheelDown }
    } else {
        match low {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        }
    };
    (button, shift, alt, ctrl, motion)
}

impl Decoder {
    fn emit_sgr_mouse(&self, nums: &[i64], is_press: bool, now_ms: u64, events: &mut Vec<Event>) {
        if nums.len() < 3 {
            return;
        }
        let cb = nums[0].max(0) as u32;
        let x = nums[1].max(0) as u16;
        let y = nums[2].max(0) as u16;
        let (button, shift, alt, ctrl, motion) = decode_mouse_button(cb);
        let action = if cb & 0x40 != 0 {
            MouseAction::Scroll
        } else if motion {
            MouseAction::Move
        } else if is_press {
            MouseAction::Press
        } else {
            MouseAction::Release
        };
        events.push(Event::new(
            EventKind::Mouse(MouseData {
                action,
                button,
                x,
                y,
                ctrl,
                alt,
                shift,
            }),
            Priority::Normal,
            now_ms,
        ));
    }
}

/// Map a process signal kind to its priority. `Winch` is carried as a
/// `Resize` event instead (see `tessera-signal`); the remaining kinds here
/// keep `Int`/`Term`/`Hup`/`Quit` urgent so shutdown requests aren't starved
/// behind a backlog of key events.
pub fn signal_priority(kind: SignalKind) -> Priority {
    match kind {
        SignalKind::Int | SignalKind::Term | SignalKind::Hup | SignalKind::Quit => Priority::High,
        SignalKind::Winch | SignalKind::Tstp | SignalKind::Cont => Priority::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> Decoder {
        Decoder::new(InputConfig::default())
    }

    fn only_key(events: Vec<Event>) -> KeyData {
        assert_eq!(events.len(), 1, "expected exactly one event, got {events:?}");
        match events.into_iter().next().unwrap().kind {
            EventKind::Key(k) => k,
            other => panic!("expected a key event, got {other:?}"),
        }
    }

    #[test]
    fn plain_ascii_byte_decodes_to_char_key() {
        let mut d = decoder();
        let k = only_key(d.feed(b"a", 0));
        assert_eq!(k.key, KeyCode::Char('a'));
        assert!(!d.is_incomplete());
    }

    #[test]
    fn arrow_key_csi_sequence_decodes_in_one_shot() {
        let mut d = decoder();
        let k = only_key(d.feed(b"\x1b[A", 0));
        assert_eq!(k.key, KeyCode::Named(NamedKey::Up));
        assert!(!d.is_incomplete());
    }

    #[test]
    fn arrow_key_fed_byte_by_byte_stays_incomplete_until_final_byte() {
        let mut d = decoder();
        assert!(d.feed(b"\x1b", 0).is_empty());
        assert!(d.is_incomplete());
        assert!(d.feed(b"[", 0).is_empty());
        assert!(d.is_incomplete());
        let k = only_key(d.feed(b"A", 0));
        assert_eq!(k.key, KeyCode::Named(NamedKey::Up));
        assert!(!d.is_incomplete());
    }

    #[test]
    fn modified_arrow_key_decodes_ctrl_bit() {
        let mut d = decoder();
        let k = only_key(d.feed(b"\x1b[1;5A", 0));
        assert_eq!(k.key, KeyCode::Named(NamedKey::Up));
        assert!(k.ctrl);
    }

    #[test]
    fn ctrl_c_byte_decodes_to_char_c_with_ctrl_flag_and_high_priority() {
        let mut d = decoder();
        let events = d.feed(&[0x03], 0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].priority, Priority::High);
        match &events[0].kind {
            EventKind::Key(k) => {
                assert_eq!(k.key, KeyCode::Char('c'));
                assert!(k.ctrl);
            }
            other => panic!("expected a key event, got {other:?}"),
        }
    }

    #[test]
    fn tab_enter_backspace_are_named_keys_not_ctrl_chars() {
        let mut d = decoder();
        assert_eq!(only_key(d.feed(b"\t", 0)).key, KeyCode::Named(NamedKey::Tab));
        assert_eq!(only_key(d.feed(b"\r", 0)).key, KeyCode::Named(NamedKey::Enter));
        assert_eq!(only_key(d.feed(&[0x7F], 0)).key, KeyCode::Named(NamedKey::Backspace));
    }

    #[test]
    fn sgr_mouse_sequence_reports_wire_coordinates_verbatim() {
        let mut d = decoder();
        let events = d.feed(b"\x1b[<0;10;20M", 0);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::Mouse(m) => {
                assert_eq!(m.x, 10);
                assert_eq!(m.y, 20);
                assert_eq!(m.button, MouseButton::Left);
                assert_eq!(m.action, MouseAction::Press);
            }
            other => panic!("expected a mouse event, got {other:?}"),
        }
    }

    #[test]
    fn sgr_mouse_release_uses_lowercase_final_byte() {
        let mut d = decoder();
        let events = d.feed(b"\x1b[<0;10;20m", 0);
        match &events[0].kind {
            EventKind::Mouse(m) => assert_eq!(m.action, MouseAction::Release),
            other => panic!("expected a mouse event, got {other:?}"),
        }
    }

    #[test]
    fn x10_mouse_sequence_decodes_three_raw_bytes() {
        let mut d = decoder();
        let events = d.feed(&[0x1b, b'[', b'M', 32, 33, 34], 0);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::Mouse(m) => {
                assert_eq!(m.x, 1);
                assert_eq!(m.y, 2);
            }
            other => panic!("expected a mouse event, got {other:?}"),
        }
    }

    #[test]
    fn bracketed_paste_emits_single_atomic_event() {
        let mut d = decoder();
        let mut events = d.feed(b"\x1b[200~hello world\x1b[201~", 0);
        assert_eq!(events.len(), 1);
        match events.remove(0).kind {
            EventKind::Paste { text } => assert_eq!(text, "hello world"),
            other => panic!("expected a paste event, got {other:?}"),
        }
    }

    #[test]
    fn paste_content_containing_a_partial_closer_prefix_is_preserved() {
        // The pasted text itself contains a stray ESC that almost, but
        // doesn't quite, match the close sequence.
        let mut d = decoder();
        let mut events = d.feed(b"\x1b[200~a\x1b[20Xb\x1b[201~", 0);
        assert_eq!(events.len(), 1);
        match events.remove(0).kind {
            EventKind::Paste { text } => assert_eq!(text, "a\x1b[20Xb"),
            other => panic!("expected a paste event, got {other:?}"),
        }
    }

    #[test]
    fn stalled_escape_flushes_to_literal_after_timeout() {
        let mut cfg = InputConfig::default();
        cfg.escape_timeout_ms = 25;
        let mut d = Decoder::new(cfg);
        assert!(d.feed(b"\x1b", 0).is_empty());
        assert!(d.poll_timeout(10).is_empty());
        let events = d.poll_timeout(30);
        assert_eq!(only_key(events).key, KeyCode::Named(NamedKey::Escape));
        assert!(!d.is_incomplete());
    }

    #[test]
    fn oversized_csi_sequence_resynchronizes_instead_of_hanging() {
        let mut cfg = InputConfig::default();
        cfg.max_escape_length = 4;
        let mut d = Decoder::new(cfg);
        let mut input = vec![0x1b, b'['];
        input.extend(std::iter::repeat(b'9').take(10));
        input.push(b'~');
        let events = d.feed(&input, 0);
        assert!(!events.is_empty());
        assert!(!d.is_incomplete());
        assert!(MALFORMED_SEQUENCES.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn focus_events_decode_in_and_out() {
        let mut d = decoder();
        let events = d.feed(b"\x1b[I", 0);
        match &events[0].kind {
            EventKind::Focus { gained } => assert!(*gained),
            other => panic!("expected a focus event, got {other:?}"),
        }
        let events = d.feed(b"\x1b[O", 0);
        match &events[0].kind {
            EventKind::Focus { gained } => assert!(!*gained),
            other => panic!("expected a focus event, got {other:?}"),
        }
    }
}
