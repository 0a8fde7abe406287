//! Paint failure isolation: a widget's `paint` is a third-party boundary as
//! far as the host is concerned, so a panic there is caught rather than
//! brought down the whole frame.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::context::RenderContext;
use crate::widget::Widget;

/// Paint `widget`, catching a panic and leaving its region untouched (the
/// differential strategy will reproduce the previous frame's content there
/// since the back buffer was never written).
pub fn paint_widget(widget: &mut dyn Widget, ctx: &mut RenderContext<'_>) {
    let outcome = catch_unwind(AssertUnwindSafe(|| widget.paint(ctx)));
    if outcome.is_err() {
        warn!(widget_id = widget.id().0, "widget paint panicked, skipping this frame");
    }
}
