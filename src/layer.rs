use egui::{Color32, Vec2, vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::geometry::{Affine, to_kurbo_vec};

/// Smallest uniform scale a layer may have.
pub const MIN_SCALE: f32 = 0.2;
/// Largest uniform scale a layer may have.
pub const MAX_SCALE: f32 = 5.0;

/// Side of the square box image layers are fitted into, in canvas points.
pub const IMAGE_BOX_SIZE: f32 = 120.0;

pub const DEFAULT_TEXT: &str = "Your text";
pub const DEFAULT_FONT_SIZE: f32 = 24.0;
pub const DEFAULT_TEXT_COLOR: Color32 = Color32::WHITE;
pub const DEFAULT_FONT_FAMILY: &str =
    r#"-apple-system, BlinkMacSystemFont, "SF Pro Text", "Segoe UI", Roboto, Helvetica, Arial, sans-serif"#;

/// Clamps a scale into `[MIN_SCALE, MAX_SCALE]`.
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// A unique identifier for a layer, stable for the document's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer_{}", self.0.simple())
    }
}

/// Where an image layer came from. Only used for labeling in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// Imported from the user's device.
    #[default]
    Device,
    /// Picked from the app's asset library.
    App,
}

impl ImageSource {
    pub fn label(&self) -> &'static str {
        match self {
            ImageSource::Device => "From gallery",
            ImageSource::App => "App image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Bitmap reference: an absolute URL, an asset path relative to the
    /// backend, or an embedded `data:` URL.
    pub src: String,
    pub source: ImageSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    pub font_size: f32,
    pub color: Color32,
    pub font_family: String,
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_TEXT_COLOR,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
        }
    }
}

impl TextContent {
    /// The text to draw. Empty content falls back to the placeholder so the
    /// layer never becomes invisible and ungrabbable.
    pub fn display_text(&self) -> &str {
        if self.text.is_empty() { DEFAULT_TEXT } else { &self.text }
    }

    /// Whether the family names a monospace face.
    pub fn is_monospace(&self) -> bool {
        let family = self.font_family.to_ascii_lowercase();
        family.contains("mono") || family.contains("courier") || family.contains("consolas")
    }
}

/// What a layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerContent {
    Image(ImageContent),
    Text(TextContent),
}

impl LayerContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            LayerContent::Image(_) => "image",
            LayerContent::Text(_) => "text",
        }
    }
}

/// Placement of a layer on the canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Top-left offset in canvas points.
    pub position: Vec2,
    /// Uniform scale factor (1.0 = original size).
    pub scale: f32,
    /// Rotation in degrees, clockwise on screen. Never normalized.
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        const DEFAULT_TRANSFORM: Transform = Transform {
            position: Vec2::ZERO,
            scale: 1.0,
            rotation: 0.0,
        };
        DEFAULT_TRANSFORM
    }
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Maps element-local coordinates to canvas coordinates.
    ///
    /// Equivalent to the CSS `translate(x, y) scale(s) rotate(r)` with the
    /// transform origin at `pivot` (element-local). Scale is uniform, so
    /// scale and rotation commute and the canvas-API order (translate,
    /// rotate, scale) lands on the same pixels.
    pub fn element_affine(&self, pivot: Vec2) -> Affine {
        Affine::translate(to_kurbo_vec(pivot + self.position))
            * Affine::scale(f64::from(self.scale))
            * Affine::rotate(f64::from(self.rotation).to_radians())
            * Affine::translate(to_kurbo_vec(-pivot))
    }

    /// The CSS transform string for this placement.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}) rotate({}deg)",
            self.position.x, self.position.y, self.scale, self.rotation
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    /// Unique identifier for the layer
    pub id: LayerId,
    /// Paint order; higher draws on top, ties keep insertion order.
    pub order: i32,
    pub transform: Transform,
    pub content: LayerContent,
}

impl Layer {
    pub fn new(content: LayerContent, position: Vec2, order: i32) -> Self {
        Self {
            id: LayerId::new(),
            order,
            transform: Transform::at(position),
            content,
        }
    }

    pub fn new_image(src: impl Into<String>, source: ImageSource, position: Vec2, order: i32) -> Self {
        Self::new(
            LayerContent::Image(ImageContent {
                src: src.into(),
                source,
            }),
            position,
            order,
        )
    }

    pub fn new_text(text: TextContent, position: Vec2, order: i32) -> Self {
        Self::new(LayerContent::Text(text), position, order)
    }

    pub fn image(&self) -> Option<&ImageContent> {
        match &self.content {
            LayerContent::Image(image) => Some(image),
            LayerContent::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&TextContent> {
        match &self.content {
            LayerContent::Text(text) => Some(text),
            LayerContent::Image(_) => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextContent> {
        match &mut self.content {
            LayerContent::Text(text) => Some(text),
            LayerContent::Image(_) => None,
        }
    }

    /// Sets the scale, clamped into the allowed range.
    pub fn set_scale(&mut self, scale: f32) {
        self.transform.scale = clamp_scale(scale);
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.transform.rotation = degrees;
    }

    /// Transform origin in element-local coordinates.
    ///
    /// Image boxes rotate about their center; text rotates about its
    /// top-left corner, where its text is anchored.
    pub fn pivot(&self) -> Vec2 {
        match &self.content {
            LayerContent::Image(_) => vec2(IMAGE_BOX_SIZE / 2.0, IMAGE_BOX_SIZE / 2.0),
            LayerContent::Text(_) => Vec2::ZERO,
        }
    }

    /// Maps this layer's local coordinates to canvas coordinates.
    pub fn local_to_canvas(&self) -> Affine {
        self.transform.element_affine(self.pivot())
    }

    /// Short label for the layer tools panel.
    pub fn label(&self) -> &'static str {
        match &self.content {
            LayerContent::Image(image) => image.source.label(),
            LayerContent::Text(_) => "Text layer",
        }
    }
}
