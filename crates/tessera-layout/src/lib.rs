//! Dimension resolution, the flex algorithm, responsive breakpoints, and a
//! depth-capped, optionally-memoized layout calculator.

mod calculator;
mod dimension;
mod flex;
mod node;
mod responsive;
mod style;

pub use calculator::Calculator;
pub use dimension::{normalize_constraints, resolve_dimension, Dimension};
pub use node::{LayoutNode, NodeId, Rect};
pub use responsive::{breakpoint_for, orientation_for, Breakpoint, Orientation, ResponsiveRouter, Transition};
pub use style::{Align, Direction, Justify, Style, Wrap};
