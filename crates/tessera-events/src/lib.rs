//! Event model, priority queue, and bubble/capture dispatcher.

mod dispatcher;
mod event;
mod queue;

pub use dispatcher::{Dispatcher, HandlerId, TargetId};
pub use event::{
    CustomPayload, Event, EventKind, KeyCode, KeyData, MouseAction, MouseButton, MouseData,
    NamedKey, Priority, ResizeData, SignalKind,
};
pub use queue::{EventQueue, OverflowPolicy, QueueStats};
