//! The widget contract the renderer hosts: paint primitives, a minimal
//! trait every widget implements, and a focus chain independent of any
//! particular widget tree shape.

mod context;
mod focus;
mod paint;
mod widget;

pub use context::RenderContext;
pub use focus::{FocusManager, FOCUS_GAINED, FOCUS_LOST};
pub use paint::paint_widget;
pub use widget::{next_widget_id, Widget, WidgetId, WidgetState};
