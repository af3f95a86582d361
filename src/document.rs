use egui::{Vec2, vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::layer::{ImageSource, Layer, LayerContent, LayerId, TextContent};

/// Canvas background. Has no transform of its own; it always covers the
/// whole viewport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    pub src: String,
}

/// The full editable state: background, layers and selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    background: Option<Background>,
    /// Kept in insertion order; paint order comes from `Layer::order`.
    layers: Vec<Layer>,
    selected_layer_id: Option<LayerId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, background: Option<Background>) {
        self.background = background;
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    pub fn selected_layer_id(&self) -> Option<LayerId> {
        self.selected_layer_id
    }

    /// Selects `id`, or clears the selection with `None`.
    ///
    /// Unknown ids clear the selection rather than leaving a dangling one.
    pub fn set_selected_layer(&mut self, id: Option<LayerId>) {
        self.selected_layer_id = id.filter(|id| self.layer(*id).is_some());
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected_layer_id.and_then(|id| self.layer(id))
    }

    pub fn selected_layer_mut(&mut self) -> Option<&mut Layer> {
        let id = self.selected_layer_id?;
        self.layer_mut(id)
    }

    /// Highest `order` in the document, or 0 when it is empty.
    pub fn max_order(&self) -> i32 {
        self.layers.iter().map(|layer| layer.order).fold(0, i32::max)
    }

    /// Builds a new layer with a fresh id on top of everything else.
    ///
    /// The layer is not inserted; pass it to [`Document::push_layer`].
    pub fn create_layer(&self, content: LayerContent, position: Vec2) -> Layer {
        Layer::new(content, position, self.max_order() + 1)
    }

    /// Appends a layer and returns its id.
    pub fn push_layer(&mut self, layer: Layer) -> LayerId {
        let id = layer.id;
        log::debug!("Adding {} layer {} at order {}", layer.content.kind_name(), id, layer.order);
        self.layers.push(layer);
        id
    }

    pub fn add_image_layer(&mut self, src: impl Into<String>, source: ImageSource, position: Vec2) -> LayerId {
        let layer = Layer::new_image(src, source, position, self.max_order() + 1);
        self.push_layer(layer)
    }

    pub fn add_text_layer(&mut self, text: TextContent, position: Vec2) -> LayerId {
        let layer = Layer::new_text(text, position, self.max_order() + 1);
        self.push_layer(layer)
    }

    /// Puts the layer above every other layer. Unknown ids are ignored.
    pub fn bring_to_front(&mut self, id: LayerId) -> bool {
        let top = self.max_order() + 1;
        match self.layer_mut(id) {
            Some(layer) => {
                layer.order = top;
                true
            }
            None => false,
        }
    }

    /// Sets the layer's order to 1 without touching any other layer.
    ///
    /// This may collide with a layer already at 1; the stable paint sort
    /// then falls back to insertion order.
    pub fn send_to_back(&mut self, id: LayerId) -> bool {
        match self.layer_mut(id) {
            Some(layer) => {
                layer.order = 1;
                true
            }
            None => false,
        }
    }

    /// Removes a layer, clearing the selection if it pointed at it.
    pub fn delete_layer(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.layers.iter().position(|layer| layer.id == id)?;
        if self.selected_layer_id == Some(id) {
            self.selected_layer_id = None;
        }
        Some(self.layers.remove(index))
    }

    /// Drops all layers, the background and the selection.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.background = None;
        self.selected_layer_id = None;
    }

    pub fn has_content(&self) -> bool {
        self.background.is_some() || !self.layers.is_empty()
    }

    /// Layers in paint order: ascending `order`, ties in insertion order.
    pub fn paint_order(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.iter().collect();
        // `sort_by_key` is stable, which is what resolves equal orders.
        layers.sort_by_key(|layer| layer.order);
        layers
    }
}

/// Where a freshly imported image lands: a little jitter so several imports
/// don't stack exactly on top of each other.
pub fn random_image_position() -> Vec2 {
    let mut rng = rand::thread_rng();
    vec2(80.0 + rng.gen_range(0.0..40.0), 80.0 + rng.gen_range(0.0..40.0))
}

pub fn random_text_position() -> Vec2 {
    let mut rng = rand::thread_rng();
    vec2(120.0 + rng.gen_range(0.0..40.0), 120.0 + rng.gen_range(0.0..40.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_uses_max_order_plus_one() {
        let mut doc = Document::new();
        let a = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        doc.layer_mut(a).unwrap().order = 7;
        let b = doc.create_layer(LayerContent::Text(TextContent::default()), Vec2::ZERO);
        assert_eq!(b.order, 8);
    }

    #[test]
    fn first_layer_gets_order_one() {
        let mut doc = Document::new();
        let a = doc.add_image_layer("a.png", ImageSource::Device, Vec2::ZERO);
        assert_eq!(doc.layer(a).unwrap().order, 1);
    }

    #[test]
    fn delete_clears_selection_of_deleted_layer_only() {
        let mut doc = Document::new();
        let a = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        let b = doc.add_image_layer("b.png", ImageSource::App, Vec2::ZERO);

        doc.set_selected_layer(Some(a));
        doc.delete_layer(b);
        assert_eq!(doc.selected_layer_id(), Some(a));

        doc.delete_layer(a);
        assert_eq!(doc.selected_layer_id(), None);
        assert!(doc.layers().is_empty());
    }

    #[test]
    fn unknown_ids_are_noops() {
        let mut doc = Document::new();
        doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        let stranger = LayerId::new();
        assert!(!doc.bring_to_front(stranger));
        assert!(!doc.send_to_back(stranger));
        assert!(doc.delete_layer(stranger).is_none());
        doc.set_selected_layer(Some(stranger));
        assert_eq!(doc.selected_layer_id(), None);
    }

    #[test]
    fn clear_drops_everything() {
        let mut doc = Document::new();
        doc.set_background(Some(Background { src: "bg.png".into() }));
        let a = doc.add_text_layer(TextContent::default(), Vec2::ZERO);
        doc.set_selected_layer(Some(a));
        doc.clear();
        assert!(!doc.has_content());
        assert_eq!(doc.selected_layer_id(), None);
    }

    #[test]
    fn jittered_positions_stay_in_range() {
        for _ in 0..50 {
            let p = random_image_position();
            assert!((80.0..120.0).contains(&p.x) && (80.0..120.0).contains(&p.y));
            let t = random_text_position();
            assert!((120.0..160.0).contains(&t.x) && (120.0..160.0).contains(&t.y));
        }
    }
}
