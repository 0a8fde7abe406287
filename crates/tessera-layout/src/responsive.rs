//! Viewport-size-driven breakpoint and orientation classification, with
//! transition-only change callbacks (mirrors `ResizeWatcher::observe`'s
//! change-only reporting in the terminal crate).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Breakpoint {
    Small,
    Medium,
    Large,
    XLarge,
}

pub fn breakpoint_for(width: u16) -> Breakpoint {
    match width {
        0..=80 => Breakpoint::Small,
        81..=120 => Breakpoint::Medium,
        121..=160 => Breakpoint::Large,
        _ => Breakpoint::XLarge,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Portrait,
    Landscape,
    Square,
}

pub fn orientation_for(width: u16, height: u16) -> Orientation {
    use std::cmp::Ordering;
    match width.cmp(&height) {
        Ordering::Less => Orientation::Portrait,
        Ordering::Greater => Orientation::Landscape,
        Ordering::Equal => Orientation::Square,
    }
}

/// Tracks the last observed breakpoint/orientation and reports transitions
/// only, so a layout factory lookup doesn't fire its change callback every
/// single resize tick.
#[derive(Debug, Clone, Copy)]
pub struct ResponsiveRouter {
    breakpoint: Breakpoint,
    orientation: Orientation,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transition {
    pub breakpoint_changed: Option<(Breakpoint, Breakpoint)>,
    pub orientation_changed: Option<(Orientation, Orientation)>,
}

impl ResponsiveRouter {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            breakpoint: breakpoint_for(width),
            orientation: orientation_for(width, height),
        }
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Re-evaluate against a new viewport size, returning only the fields
    /// that actually changed.
    pub fn observe(&mut self, width: u16, height: u16) -> Transition {
        let new_bp = breakpoint_for(width);
        let new_or = orientation_for(width, height);
        let mut transition = Transition::default();
        if new_bp != self.breakpoint {
            transition.breakpoint_changed = Some((self.breakpoint, new_bp));
            self.breakpoint = new_bp;
        }
        if new_or != self.orientation {
            transition.orientation_changed = Some((self.orientation, new_or));
            self.orientation = new_or;
        }
        transition
    }
}
