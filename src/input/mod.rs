//! Pointer input: a small event vocabulary, the per-layer gesture state
//! machine, and the router that feeds one from the other.

use egui::Pos2;

pub mod gestures;
mod router;

pub use gestures::{GestureInterpreter, GestureState, PinchBaseline};
pub use router::{GestureRouter, MOUSE_POINTER_ID};

/// Identifies one pointer stream (a finger, a pen, or the mouse).
pub type PointerId = u64;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub phase: PointerPhase,
    pub pos: Pos2,
}

impl PointerEvent {
    pub fn down(pointer: PointerId, pos: Pos2) -> Self {
        Self {
            pointer,
            phase: PointerPhase::Down,
            pos,
        }
    }

    pub fn moved(pointer: PointerId, pos: Pos2) -> Self {
        Self {
            pointer,
            phase: PointerPhase::Move,
            pos,
        }
    }

    pub fn up(pointer: PointerId, pos: Pos2) -> Self {
        Self {
            pointer,
            phase: PointerPhase::Up,
            pos,
        }
    }

    pub fn cancel(pointer: PointerId, pos: Pos2) -> Self {
        Self {
            pointer,
            phase: PointerPhase::Cancel,
            pos,
        }
    }

    /// Whether this event ends the pointer's stream.
    pub fn is_release(&self) -> bool {
        matches!(self.phase, PointerPhase::Up | PointerPhase::Cancel)
    }
}
