//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the active gesture tracked between pointer-down and
//! pointer-up, carrying the context needed to turn each pointer-move into an
//! absolute scene mutation. All points stored here are canonical.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::{NUDGE_STEP_LARGE_PX, NUDGE_STEP_PX};
use crate::geom::Point;
use crate::scene::ItemId;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Drag images and regions around the layout (default).
    #[default]
    Move,
    /// Drag a pivoted image to rotate it about its pivot.
    Rotate,
    /// Drag out a new drawable region.
    Region,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Keyboard nudge distance for these modifiers.
    #[must_use]
    pub fn nudge_step(self) -> f64 {
        if self.shift { NUDGE_STEP_LARGE_PX } else { NUDGE_STEP_PX }
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key, named as the host reports it (e.g. `"ArrowLeft"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// Unit direction for arrow keys, `None` for everything else.
    #[must_use]
    pub fn arrow_direction(&self) -> Option<(f64, f64)> {
        match self.0.as_str() {
            "ArrowLeft" => Some((-1.0, 0.0)),
            "ArrowRight" => Some((1.0, 0.0)),
            "ArrowUp" => Some((0.0, -1.0)),
            "ArrowDown" => Some((0.0, 1.0)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.0.as_str(), "Delete" | "Backspace")
    }
}

/// What the next click will place on an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Absolute rotation center.
    Pivot(ItemId),
    /// Pen tip, stored relative to the image's top-left.
    PenTip(ItemId),
}

impl Placement {
    #[must_use]
    pub fn image_id(&self) -> &str {
        match self {
            Self::Pivot(id) | Self::PenTip(id) => id,
        }
    }
}

/// Persistent UI state visible to the host.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub tool: Tool,
    pub selected_id: Option<ItemId>,
    /// Armed point placement, consumed by the next primary click.
    pub armed: Option<Placement>,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Moving an image; `grab` is the pointer offset from its top-left.
    DraggingImage { id: ItemId, grab: Point },
    /// Moving a region on the layout; `grab` is the pointer offset from its origin.
    DraggingRegion { id: ItemId, grab: Point },
    /// Rotating an image about its pivot.
    Rotating {
        id: ItemId,
        pivot: Point,
        /// Rotation in degrees at pointer-down.
        rotation_at_start: f64,
        /// Pointer angle about the pivot at pointer-down.
        angle_at_start: f64,
    },
    /// Dragging out a new region from `anchor` to `current`.
    DrawingRegion { anchor: Point, current: Point },
}
