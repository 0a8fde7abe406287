//! Cell-buffer diff strategies, the render scheduler, and an independent
//! animation ticker with easing helpers.

mod animation;
mod easing;
mod metrics;
mod scheduler;
mod strategy;

pub use animation::{AnimationId, AnimationTicker, Tick};
pub use easing::{
    bounce_in, bounce_in_out, bounce_out, cubic_in, cubic_in_out, cubic_out, elastic_in, elastic_in_out, elastic_out,
    linear, quad_in, quad_in_out, quad_out,
};
pub use metrics::RenderMetricsSnapshot;
pub use scheduler::{RenderOutcome, Renderer};
pub use strategy::{compute_patch, Patch, RenderStats, Strategy, FULL_REDRAW_THRESHOLD};
