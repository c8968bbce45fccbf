//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and pen pointer events into a unified
//! `InputEvent` enum consumed by the session. Coordinates are in screen
//! space; the session maps them through the view transform.

use serde::{Deserialize, Serialize};

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
}

/// A normalized input event from any pointing device.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pen contact).
    PointerDown {
        x: f64,
        y: f64,
        pointer_id: i32,
        modifiers: Modifiers,
    },

    /// Pointer moved.
    PointerMove { x: f64, y: f64, pointer_id: i32 },

    /// Pointer released.
    PointerUp { x: f64, y: f64, pointer_id: i32 },

    /// The platform aborted the gesture.
    PointerCancel { pointer_id: i32 },

    /// Pointer left the drawing surface.
    PointerLeave { pointer_id: i32 },
}

impl InputEvent {
    pub fn down(x: f64, y: f64, pointer_id: i32, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            x,
            y,
            pointer_id,
            modifiers,
        }
    }

    pub fn moved(x: f64, y: f64, pointer_id: i32) -> Self {
        Self::PointerMove { x, y, pointer_id }
    }

    pub fn up(x: f64, y: f64, pointer_id: i32) -> Self {
        Self::PointerUp { x, y, pointer_id }
    }

    /// Extract position if this event carries one.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. } => Some((*x, *y)),
            Self::PointerCancel { .. } | Self::PointerLeave { .. } => None,
        }
    }

    pub fn pointer_id(&self) -> i32 {
        match self {
            Self::PointerDown { pointer_id, .. }
            | Self::PointerMove { pointer_id, .. }
            | Self::PointerUp { pointer_id, .. }
            | Self::PointerCancel { pointer_id }
            | Self::PointerLeave { pointer_id } => *pointer_id,
        }
    }
}
