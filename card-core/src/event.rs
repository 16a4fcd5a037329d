//! Pointer notifications from the rendering surface.

use serde::{Deserialize, Serialize};

use crate::component::ComponentId;
use crate::geometry::Point;

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerKind {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Press and release on the same component.
    Click,
}

/// Which part of a component was hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitRegion {
    /// Anywhere inside the component box.
    #[default]
    Body,
    /// The bottom-right resize handle.
    ResizeHandle,
}

/// A pointer notification in card coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceEvent {
    /// Event kind.
    pub kind: PointerKind,
    /// Component under the pointer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ComponentId>,
    /// Part of the target that was hit.
    #[serde(default)]
    pub region: HitRegion,
    /// Horizontal pointer position.
    pub x: f64,
    /// Vertical pointer position.
    pub y: f64,
}

impl SurfaceEvent {
    /// Pointer pressed on a component.
    #[must_use]
    pub fn pointer_down(target: ComponentId, region: HitRegion, at: Point) -> Self {
        Self {
            kind: PointerKind::Down,
            target: Some(target),
            region,
            x: at.x,
            y: at.y,
        }
    }

    /// Pointer moved.
    #[must_use]
    pub fn pointer_move(at: Point) -> Self {
        Self::untargeted(PointerKind::Move, at)
    }

    /// Pointer released.
    #[must_use]
    pub fn pointer_up(at: Point) -> Self {
        Self::untargeted(PointerKind::Up, at)
    }

    /// Click on a component, or on empty card when `target` is `None`.
    #[must_use]
    pub fn click(target: Option<ComponentId>, at: Point) -> Self {
        Self {
            target,
            ..Self::untargeted(PointerKind::Click, at)
        }
    }

    fn untargeted(kind: PointerKind, at: Point) -> Self {
        Self {
            kind,
            target: None,
            region: HitRegion::Body,
            x: at.x,
            y: at.y,
        }
    }

    /// Pointer position.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
