use egui::{Pos2, Vec2};

use super::{PointerEvent, PointerId, PointerPhase};
use crate::layer::{Transform, clamp_scale};

/// Two-pointer baseline captured when a pinch starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchBaseline {
    /// Distance between the two pointers, in canvas points. May be zero.
    pub distance: f32,
    /// Angle of the line from the first to the second pointer, in degrees.
    pub angle: f32,
    pub scale: f32,
    pub rotation: f32,
}

/// Gesture state of a single layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// One pointer translating the layer.
    Dragging { pointer_start: Pos2, layer_start: Vec2 },
    /// Two pointers scaling and rotating the layer.
    Pinching(PinchBaseline),
}

#[derive(Debug, Clone, Copy)]
struct TrackedPointer {
    id: PointerId,
    pos: Pos2,
}

/// Turns the pointer streams addressed to one layer into geometry changes.
///
/// Every layer owns its own interpreter, so pointers on different layers
/// never share tracking state. Pointers are kept in arrival order; only the
/// first two drive a pinch, any further ones are tracked for release only.
#[derive(Debug, Clone, Default)]
pub struct GestureInterpreter {
    state: GestureState,
    pointers: Vec<TrackedPointer>,
}

fn distance(a: Pos2, b: Pos2) -> f32 {
    (b - a).length()
}

fn angle_degrees(a: Pos2, b: Pos2) -> f32 {
    let d = b - a;
    d.y.atan2(d.x).to_degrees()
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    /// Number of pointers currently down on this layer.
    pub fn tracked_pointers(&self) -> usize {
        self.pointers.len()
    }

    /// Feeds one event. Returns `true` when `transform` was changed.
    pub fn handle(&mut self, event: &PointerEvent, transform: &mut Transform) -> bool {
        match event.phase {
            PointerPhase::Down => {
                self.pointer_down(event.pointer, event.pos, transform);
                false
            }
            PointerPhase::Move => self.pointer_move(event.pointer, event.pos, transform),
            PointerPhase::Up | PointerPhase::Cancel => {
                self.pointer_up(event.pointer, transform);
                false
            }
        }
    }

    pub fn pointer_down(&mut self, id: PointerId, pos: Pos2, transform: &Transform) {
        if let Some(tracked) = self.pointers.iter_mut().find(|p| p.id == id) {
            // A repeated down for a pointer we already hold only refreshes it.
            tracked.pos = pos;
            return;
        }
        self.pointers.push(TrackedPointer { id, pos });

        match self.pointers.len() {
            1 => {
                self.state = GestureState::Dragging {
                    pointer_start: pos,
                    layer_start: transform.position,
                };
            }
            2 => {
                self.state = GestureState::Pinching(self.baseline(transform));
                log::debug!("Pinch started: {:?}", self.state);
            }
            _ => {}
        }
    }

    pub fn pointer_move(&mut self, id: PointerId, pos: Pos2, transform: &mut Transform) -> bool {
        let Some(tracked) = self.pointers.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        tracked.pos = pos;

        match self.state {
            GestureState::Idle => false,
            GestureState::Dragging {
                pointer_start,
                layer_start,
            } => {
                transform.position = layer_start + (pos - pointer_start);
                true
            }
            GestureState::Pinching(baseline) => {
                if self.pointers.len() < 2 {
                    return false;
                }
                let (p1, p2) = (self.pointers[0].pos, self.pointers[1].pos);
                let current_distance = distance(p1, p2);
                let current_angle = angle_degrees(p1, p2);

                if baseline.distance == 0.0 {
                    // No usable baseline yet: hold the scale at 1x until the
                    // pointers separate, then measure from there.
                    if current_distance > 0.0 {
                        self.state = GestureState::Pinching(self.baseline(transform));
                    }
                    return false;
                }

                let factor = current_distance / baseline.distance;
                transform.scale = clamp_scale(baseline.scale * factor);
                transform.rotation = baseline.rotation + (current_angle - baseline.angle);
                true
            }
        }
    }

    pub fn pointer_up(&mut self, id: PointerId, transform: &Transform) {
        let Some(index) = self.pointers.iter().position(|p| p.id == id) else {
            return;
        };
        self.pointers.remove(index);

        self.state = match self.state {
            _ if self.pointers.is_empty() => GestureState::Idle,
            GestureState::Dragging { .. } => GestureState::Idle,
            // Dropping to one finger ends the gesture; it does not resume a drag.
            GestureState::Pinching(_) if self.pointers.len() < 2 => GestureState::Idle,
            GestureState::Pinching(_) if index < 2 => {
                // One of the two driving pointers left while a third is still
                // down: continue with the new pair from the current geometry.
                GestureState::Pinching(self.baseline(transform))
            }
            state => state,
        };
    }

    /// Forgets all pointers.
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.state = GestureState::Idle;
    }

    fn baseline(&self, transform: &Transform) -> PinchBaseline {
        let (p1, p2) = (self.pointers[0].pos, self.pointers[1].pos);
        PinchBaseline {
            distance: distance(p1, p2),
            angle: angle_degrees(p1, p2),
            scale: transform.scale,
            rotation: transform.rotation,
        }
    }
}
