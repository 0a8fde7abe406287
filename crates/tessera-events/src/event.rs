//! The `Event` sum type and the values its variants carry.

/// Relative urgency band used by both the queue and the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Tab,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Space,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Named(NamedKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyData {
    pub key: KeyCode,
    pub raw: Vec<u8>,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub code: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Release,
    Move,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseData {
    pub action: MouseAction,
    pub button: MouseButton,
    pub x: u16,
    pub y: u16,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeData {
    pub columns: u16,
    pub rows: u16,
    pub prev_columns: u16,
    pub prev_rows: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Int,
    Term,
    Hup,
    Winch,
    Quit,
    Tstp,
    Cont,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomPayload {
    None,
    Text(String),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Key(KeyData),
    Mouse(MouseData),
    Paste { text: String },
    Focus { gained: bool },
    Resize(ResizeData),
    Signal { kind: SignalKind },
    Custom { name: String, payload: CustomPayload },
}

impl EventKind {
    /// Stable tag used for dispatcher routing and `find_by_type`.
    pub fn type_tag(&self) -> &'static str {
        match self {
            EventKind::Key(_) => "key",
            EventKind::Mouse(_) => "mouse",
            EventKind::Paste { .. } => "paste",
            EventKind::Focus { .. } => "focus",
            EventKind::Resize(_) => "resize",
            EventKind::Signal { .. } => "signal",
            EventKind::Custom { .. } => "custom",
        }
    }
}

/// One occurrence flowing through the queue/dispatcher pipeline, carrying
/// the common bookkeeping fields every variant shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub priority: Priority,
    pub timestamp: u64,
    pub propagation_stopped: bool,
    pub default_prevented: bool,
}

impl Event {
    pub fn new(kind: EventKind, priority: Priority, timestamp: u64) -> Self {
        Self {
            kind,
            priority,
            timestamp,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}
