//! Coordinate conversion between pointer pixels and page percentages
//!
//! Fields are stored as percentages of the page (0-100, top-left origin) so an
//! overlay lands in the same place regardless of zoom or render scale.

use serde::{Deserialize, Serialize};

/// Lower and upper bound of a normalized coordinate
pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;

/// Rendered bounds of the visible page, in the pointer's pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bounds anchored at the origin
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// Page-relative position in percent, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Build a position, clamping both axes into [0, 100]
    pub fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    /// Center of the page
    pub fn center() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

/// Clamp a percentage into [0, 100]; NaN maps to 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return PERCENT_MIN;
    }
    value.clamp(PERCENT_MIN, PERCENT_MAX)
}

/// Convert a pointer position to a clamped page percentage
pub fn pointer_to_percent(pointer_x: f64, pointer_y: f64, bounds: PageBounds) -> Position {
    let x = axis_percent(pointer_x - bounds.left, bounds.width);
    let y = axis_percent(pointer_y - bounds.top, bounds.height);
    Position::clamped(x, y)
}

fn axis_percent(offset: f64, extent: f64) -> f64 {
    if extent <= 0.0 {
        return PERCENT_MIN;
    }
    (offset / extent) * 100.0
}

/// Convert a percentage position to pixels on a rendered surface
pub fn percent_to_surface(pos: Position, surface_width: f64, surface_height: f64) -> (f64, f64) {
    (
        pos.x / 100.0 * surface_width,
        pos.y / 100.0 * surface_height,
    )
}
