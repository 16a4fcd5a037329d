//! Grid snapping and pointer-delta arithmetic.
//!
//! Pointer motion arrives as continuous card-space coordinates. These
//! functions collapse it onto the discrete grid the document stores, so the
//! same gesture always produces the same numbers.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Smallest width or height a resize can produce.
pub const DEFAULT_MIN_SIZE: f64 = 20.0;

/// Number of grid cells along the card's shorter edge in proportional mode.
pub const GRID_DIVISIONS: f64 = 10.0;

/// A position or pointer delta in card coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate (pixels from the card's left edge).
    pub x: f64,
    /// Vertical coordinate (pixels from the card's top edge).
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn delta_from(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// How the grid step is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum GridPolicy {
    /// A constant step in pixels.
    Fixed {
        /// Step in pixels.
        step: f64,
    },
    /// One tenth of the card's shorter edge.
    #[default]
    Proportional,
}

impl GridPolicy {
    /// Grid step for a card of the given dimensions.
    #[must_use]
    pub fn step(&self, card_width: f64, card_height: f64) -> f64 {
        match *self {
            Self::Fixed { step } => step,
            Self::Proportional => card_width.min(card_height) / GRID_DIVISIONS,
        }
    }

    /// Check that a fixed step is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidGridStep`] for a zero, negative, or
    /// non-finite fixed step.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            Self::Fixed { step } if !(step.is_finite() && step > 0.0) => {
                Err(ValidationError::InvalidGridStep(step))
            }
            _ => Ok(()),
        }
    }
}

/// When drag positions are quantized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapPolicy {
    /// Move freely while dragging, snap once on pointer-up.
    #[default]
    OnRelease,
    /// Snap on every pointer-move.
    Continuous,
}

impl SnapPolicy {
    /// Whether intermediate drag positions are snapped.
    #[must_use]
    pub const fn snaps_during_drag(self) -> bool {
        matches!(self, Self::Continuous)
    }
}

/// Round `value` to the nearest multiple of `step`.
///
/// Halfway values round up, towards positive infinity, so `snap(45, 10)`
/// is 50 and `snap(-45, 10)` is -40. A step that is not positive and
/// finite leaves the value untouched.
#[must_use]
pub fn snap(value: f64, step: f64) -> f64 {
    if !(step.is_finite() && step > 0.0) {
        return value;
    }
    // `+ 0.0` folds a negative zero into positive zero.
    (value / step + 0.5).floor() * step + 0.0
}

/// Snap both coordinates of a point.
#[must_use]
pub fn snap_point(point: Point, step: f64) -> Point {
    Point::new(snap(point.x, step), snap(point.y, step))
}

/// Position of a dragged component: the origin moved by the pointer delta,
/// unsnapped.
#[must_use]
pub fn apply_drag(origin: Point, pointer_delta: Point) -> Point {
    Point::new(origin.x + pointer_delta.x, origin.y + pointer_delta.y)
}

/// Size of a resized component.
///
/// Each dimension is `max(min_size, snap(start + delta, step))`.
#[must_use]
pub fn apply_resize(start: Size, pointer_delta: Point, step: f64, min_size: f64) -> Size {
    Size::new(
        snap(start.width + pointer_delta.x, step).max(min_size),
        snap(start.height + pointer_delta.y, step).max(min_size),
    )
}

/// Guide line positions for drawing the grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridLines {
    /// X positions of vertical lines.
    pub vertical: Vec<f64>,
    /// Y positions of horizontal lines.
    pub horizontal: Vec<f64>,
}

/// Grid guide positions `0, step, 2*step, ...` up to and including each edge.
#[must_use]
pub fn grid_lines(width: f64, height: f64, step: f64) -> GridLines {
    GridLines {
        vertical: axis_lines(width, step),
        horizontal: axis_lines(height, step),
    }
}

// Partial trailing cells get no closing line.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn axis_lines(extent: f64, step: f64) -> Vec<f64> {
    if !(step.is_finite() && step > 0.0) || !extent.is_finite() || extent < 0.0 {
        return Vec::new();
    }
    let count = (extent / step).floor() as usize;
    (0..=count).map(|i| i as f64 * step).collect()
}
