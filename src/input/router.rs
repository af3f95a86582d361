use std::collections::{HashMap, HashSet};

use egui::{Pos2, Rect};

use super::{GestureInterpreter, PointerEvent, PointerId, PointerPhase};
use crate::document::Document;
use crate::layer::LayerId;

/// Pointer id used for the mouse, outside the range touch ids come from.
pub const MOUSE_POINTER_ID: PointerId = u64::MAX;

/// Routes pointer events to the gesture interpreter of the layer each
/// pointer went down on.
///
/// A pointer is captured by the layer it pressed, so later moves keep
/// driving that layer even when they leave its bounds.
#[derive(Debug, Default)]
pub struct GestureRouter {
    interpreters: HashMap<LayerId, GestureInterpreter>,
    captures: HashMap<PointerId, LayerId>,
    active_touches: HashSet<PointerId>,
}

impl GestureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The layer a pointer is currently captured by.
    pub fn captured_layer(&self, pointer: PointerId) -> Option<LayerId> {
        self.captures.get(&pointer).copied()
    }

    pub fn interpreter(&self, layer: LayerId) -> Option<&GestureInterpreter> {
        self.interpreters.get(&layer)
    }

    /// Whether any layer is mid-gesture.
    pub fn is_busy(&self) -> bool {
        !self.captures.is_empty()
    }

    /// Feeds one event. `hit` is the topmost layer under `event.pos` and is
    /// only consulted for pointer-down. Returns `true` when the document
    /// changed (geometry or selection).
    pub fn dispatch(&mut self, document: &mut Document, event: PointerEvent, hit: Option<LayerId>) -> bool {
        match event.phase {
            PointerPhase::Down => {
                let Some(layer_id) = hit else {
                    // Pressing the bare canvas deselects.
                    let changed = document.selected_layer_id().is_some();
                    document.set_selected_layer(None);
                    return changed;
                };
                let Some(layer) = document.layer_mut(layer_id) else {
                    return false;
                };
                self.captures.insert(event.pointer, layer_id);
                self.interpreters
                    .entry(layer_id)
                    .or_default()
                    .handle(&event, &mut layer.transform);
                document.set_selected_layer(Some(layer_id));
                true
            }
            PointerPhase::Move | PointerPhase::Up | PointerPhase::Cancel => {
                let Some(layer_id) = self.captured_layer(event.pointer) else {
                    return false;
                };
                if event.is_release() {
                    self.captures.remove(&event.pointer);
                }
                let Some(layer) = document.layer_mut(layer_id) else {
                    // Deleted mid-gesture.
                    self.interpreters.remove(&layer_id);
                    return false;
                };
                self.interpreters
                    .entry(layer_id)
                    .or_default()
                    .handle(&event, &mut layer.transform)
            }
        }
    }

    /// Forgets interpreters and captures of layers that no longer exist.
    pub fn retain_layers(&mut self, document: &Document) {
        self.interpreters.retain(|id, _| document.layer(*id).is_some());
        self.captures.retain(|_, id| document.layer(*id).is_some());
    }

    /// Drops all gesture state, e.g. after the document was cleared.
    pub fn reset(&mut self) {
        self.interpreters.clear();
        self.captures.clear();
        self.active_touches.clear();
    }

    /// Translates this frame's raw egui events into canvas-space pointer
    /// events.
    ///
    /// Presses outside `canvas_rect` are dropped. While a touch is active the
    /// mouse events egui synthesizes from it are skipped, otherwise the first
    /// finger would count twice and start a pinch on its own.
    pub fn collect_events(&mut self, events: &[egui::Event], canvas_rect: Rect) -> Vec<PointerEvent> {
        let to_canvas = |pos: Pos2| (pos - canvas_rect.min).to_pos2();
        let mut out = Vec::new();

        for event in events {
            match event {
                egui::Event::Touch { id, phase, pos, .. } => {
                    let pointer = id.0;
                    let phase = match phase {
                        egui::TouchPhase::Start => {
                            if !canvas_rect.contains(*pos) {
                                continue;
                            }
                            self.active_touches.insert(pointer);
                            PointerPhase::Down
                        }
                        egui::TouchPhase::Move => PointerPhase::Move,
                        egui::TouchPhase::End => {
                            self.active_touches.remove(&pointer);
                            PointerPhase::Up
                        }
                        egui::TouchPhase::Cancel => {
                            self.active_touches.remove(&pointer);
                            PointerPhase::Cancel
                        }
                    };
                    out.push(PointerEvent {
                        pointer,
                        phase,
                        pos: to_canvas(*pos),
                    });
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } if self.active_touches.is_empty() => {
                    if *pressed {
                        if canvas_rect.contains(*pos) {
                            out.push(PointerEvent::down(MOUSE_POINTER_ID, to_canvas(*pos)));
                        }
                    } else {
                        out.push(PointerEvent::up(MOUSE_POINTER_ID, to_canvas(*pos)));
                    }
                }
                egui::Event::PointerMoved(pos) if self.active_touches.is_empty() => {
                    out.push(PointerEvent::moved(MOUSE_POINTER_ID, to_canvas(*pos)));
                }
                egui::Event::PointerGone => {
                    out.push(PointerEvent::cancel(MOUSE_POINTER_ID, Pos2::ZERO));
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ImageSource;
    use egui::{Vec2, pos2, vec2};

    fn doc_with_two_layers() -> (Document, LayerId, LayerId) {
        let mut doc = Document::new();
        let a = doc.add_image_layer("a.png", ImageSource::App, vec2(0.0, 0.0));
        let b = doc.add_image_layer("b.png", ImageSource::App, vec2(200.0, 0.0));
        (doc, a, b)
    }

    #[test]
    fn pointer_down_selects_the_hit_layer() {
        let (mut doc, _, b) = doc_with_two_layers();
        let mut router = GestureRouter::new();
        router.dispatch(&mut doc, PointerEvent::down(1, pos2(210.0, 10.0)), Some(b));
        assert_eq!(doc.selected_layer_id(), Some(b));
    }

    #[test]
    fn pointer_down_on_empty_canvas_deselects() {
        let (mut doc, a, _) = doc_with_two_layers();
        doc.set_selected_layer(Some(a));
        let mut router = GestureRouter::new();
        assert!(router.dispatch(&mut doc, PointerEvent::down(1, pos2(500.0, 500.0)), None));
        assert_eq!(doc.selected_layer_id(), None);
    }

    #[test]
    fn interleaved_pointers_on_two_layers_stay_separate() {
        let (mut doc, a, b) = doc_with_two_layers();
        let mut router = GestureRouter::new();

        router.dispatch(&mut doc, PointerEvent::down(1, pos2(10.0, 10.0)), Some(a));
        router.dispatch(&mut doc, PointerEvent::down(2, pos2(210.0, 10.0)), Some(b));
        router.dispatch(&mut doc, PointerEvent::moved(1, pos2(20.0, 10.0)), None);
        router.dispatch(&mut doc, PointerEvent::moved(2, pos2(210.0, 40.0)), None);

        assert_eq!(doc.layer(a).unwrap().transform.position, vec2(10.0, 0.0));
        assert_eq!(doc.layer(b).unwrap().transform.position, vec2(200.0, 30.0));
        // Neither layer saw two pointers, so neither scaled.
        assert_eq!(doc.layer(a).unwrap().transform.scale, 1.0);
        assert_eq!(doc.layer(b).unwrap().transform.scale, 1.0);
    }

    #[test]
    fn release_drops_capture() {
        let (mut doc, a, _) = doc_with_two_layers();
        let mut router = GestureRouter::new();
        router.dispatch(&mut doc, PointerEvent::down(1, pos2(10.0, 10.0)), Some(a));
        router.dispatch(&mut doc, PointerEvent::up(1, pos2(10.0, 10.0)), None);
        assert!(!router.is_busy());
        assert!(!router.dispatch(&mut doc, PointerEvent::moved(1, pos2(90.0, 90.0)), None));
        assert_eq!(doc.layer(a).unwrap().transform.position, Vec2::ZERO);
    }

    #[test]
    fn deleting_a_layer_mid_drag_is_harmless() {
        let (mut doc, a, _) = doc_with_two_layers();
        let mut router = GestureRouter::new();
        router.dispatch(&mut doc, PointerEvent::down(1, pos2(10.0, 10.0)), Some(a));
        doc.delete_layer(a);
        assert!(!router.dispatch(&mut doc, PointerEvent::moved(1, pos2(30.0, 30.0)), None));
        router.retain_layers(&doc);
        assert!(router.interpreter(a).is_none());
    }

    #[test]
    fn synthetic_mouse_events_are_skipped_during_touch() {
        let mut router = GestureRouter::new();
        let canvas = Rect::from_min_size(pos2(100.0, 100.0), vec2(400.0, 400.0));
        let events = vec![
            egui::Event::Touch {
                device_id: egui::TouchDeviceId(0),
                id: egui::TouchId(7),
                phase: egui::TouchPhase::Start,
                pos: pos2(150.0, 150.0),
                force: None,
            },
            egui::Event::PointerButton {
                pos: pos2(150.0, 150.0),
                button: egui::PointerButton::Primary,
                pressed: true,
                modifiers: egui::Modifiers::NONE,
            },
        ];
        let out = router.collect_events(&events, canvas);
        assert_eq!(out, vec![PointerEvent::down(7, pos2(50.0, 50.0))]);
    }

    #[test]
    fn presses_outside_the_canvas_are_dropped() {
        let mut router = GestureRouter::new();
        let canvas = Rect::from_min_size(pos2(100.0, 100.0), vec2(400.0, 400.0));
        let events = vec![egui::Event::PointerButton {
            pos: pos2(10.0, 10.0),
            button: egui::PointerButton::Primary,
            pressed: true,
            modifiers: egui::Modifiers::NONE,
        }];
        assert!(router.collect_events(&events, canvas).is_empty());
    }
}
