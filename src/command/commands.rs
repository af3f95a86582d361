use egui::{Color32, Vec2};

use super::CommandResult;
use crate::document::{Background, Document, random_image_position, random_text_position};
use crate::error::InputError;
use crate::layer::{DEFAULT_FONT_FAMILY, ImageSource, LayerContent, LayerId, TextContent};

/// Font families offered by the font picker, as `(label, css family)`.
pub const FONT_PRESETS: &[(&str, &str)] = &[
    ("System", DEFAULT_FONT_FAMILY),
    ("Serif", r#"Georgia, "Times New Roman", serif"#),
    ("Rounded", r#""Trebuchet MS", "Arial Rounded MT Bold", sans-serif"#),
    ("Typewriter", r#""Courier New", Courier, monospace"#),
];

/// Preset text colors.
pub const TEXT_SWATCHES: &[Color32] = &[
    Color32::WHITE,
    Color32::BLACK,
    Color32::from_rgb(0xff, 0x4d, 0x8d),
    Color32::from_rgb(0xff, 0xd6, 0x0a),
    Color32::from_rgb(0x8b, 0x5c, 0xf6),
    Color32::from_rgb(0x3a, 0x86, 0xff),
];

/// Parses a user-entered hex color (`#rrggbb`, `rrggbb`, `#rgb`, with
/// optional alpha).
pub fn parse_color(input: &str) -> Result<Color32, InputError> {
    let trimmed = input.trim();
    let hex = if trimmed.starts_with('#') {
        trimmed.to_owned()
    } else {
        format!("#{trimmed}")
    };
    Color32::from_hex(&hex).map_err(|_| InputError::InvalidColor(trimmed.to_owned()))
}

/// What a successful command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The document changed.
    Changed,
    /// A layer was created.
    Added(LayerId),
}

/// Commands that can be executed in the editor
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add an image layer at a jittered default position
    AddImageLayer { src: String, source: ImageSource },

    /// Add an image layer at an explicit position
    AddImageLayerAt {
        src: String,
        source: ImageSource,
        position: Vec2,
    },

    /// Add a default text layer and select it
    AddTextLayer,

    /// Replace (or with `None`, remove) the canvas background
    SetBackground(Option<String>),

    /// Change the selection; `None` clears it
    SelectLayer(Option<LayerId>),

    /// Set the selected layer's scale (clamped)
    SetScale(f32),

    /// Set the selected layer's rotation in degrees
    SetRotation(f32),

    BringToFront,
    SendToBack,
    DeleteSelected,

    /// Replace the selected text layer's text
    SetText(String),
    SetFontFamily(String),
    SetTextColor(Color32),

    /// Swap the bitmap of an image layer, e.g. after background removal
    ReplaceImageSource { layer_id: LayerId, src: String },

    /// Drop everything on the canvas
    Clear,
}

impl Command {
    /// Applies the command. Input errors leave the document untouched.
    pub fn execute(self, document: &mut Document) -> CommandResult {
        match self {
            Command::AddImageLayer { src, source } => {
                let id = document.add_image_layer(src, source, random_image_position());
                Ok(CommandOutcome::Added(id))
            }
            Command::AddImageLayerAt { src, source, position } => {
                let id = document.add_image_layer(src, source, position);
                Ok(CommandOutcome::Added(id))
            }
            Command::AddTextLayer => {
                let id = document.add_text_layer(TextContent::default(), random_text_position());
                document.set_selected_layer(Some(id));
                Ok(CommandOutcome::Added(id))
            }
            Command::SetBackground(src) => {
                document.set_background(src.map(|src| Background { src }));
                Ok(CommandOutcome::Changed)
            }
            Command::SelectLayer(id) => {
                document.set_selected_layer(id);
                Ok(CommandOutcome::Changed)
            }
            Command::SetScale(scale) => {
                selected(document)?.set_scale(scale);
                Ok(CommandOutcome::Changed)
            }
            Command::SetRotation(degrees) => {
                selected(document)?.set_rotation(degrees);
                Ok(CommandOutcome::Changed)
            }
            Command::BringToFront => {
                let id = selected(document)?.id;
                document.bring_to_front(id);
                Ok(CommandOutcome::Changed)
            }
            Command::SendToBack => {
                let id = selected(document)?.id;
                document.send_to_back(id);
                Ok(CommandOutcome::Changed)
            }
            Command::DeleteSelected => {
                let id = selected(document)?.id;
                document.delete_layer(id);
                Ok(CommandOutcome::Changed)
            }
            Command::SetText(text) => {
                selected_text(document)?.text = text;
                Ok(CommandOutcome::Changed)
            }
            Command::SetFontFamily(family) => {
                selected_text(document)?.font_family = family;
                Ok(CommandOutcome::Changed)
            }
            Command::SetTextColor(color) => {
                selected_text(document)?.color = color;
                Ok(CommandOutcome::Changed)
            }
            Command::ReplaceImageSource { layer_id, src } => {
                let layer = document.layer_mut(layer_id).ok_or(InputError::NoSelection)?;
                match &mut layer.content {
                    LayerContent::Image(image) => {
                        image.src = src;
                        Ok(CommandOutcome::Changed)
                    }
                    LayerContent::Text(_) => Err(InputError::NotAnImageLayer),
                }
            }
            Command::Clear => {
                document.clear();
                Ok(CommandOutcome::Changed)
            }
        }
    }
}

fn selected(document: &mut Document) -> Result<&mut crate::layer::Layer, InputError> {
    document.selected_layer_mut().ok_or(InputError::NoSelection)
}

fn selected_text(document: &mut Document) -> Result<&mut TextContent, InputError> {
    selected(document)?.text_mut().ok_or(InputError::NotATextLayer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{DEFAULT_TEXT, MAX_SCALE};

    #[test]
    fn add_text_selects_the_new_layer() {
        let mut doc = Document::new();
        let outcome = Command::AddTextLayer.execute(&mut doc).unwrap();
        let CommandOutcome::Added(id) = outcome else {
            panic!("expected a new layer, got {outcome:?}");
        };
        assert_eq!(doc.selected_layer_id(), Some(id));
        assert_eq!(doc.layer(id).unwrap().text().unwrap().text, DEFAULT_TEXT);
    }

    #[test]
    fn layer_tools_need_a_selection() {
        let mut doc = Document::new();
        doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        let before = doc.clone();

        for command in [
            Command::SetScale(2.0),
            Command::SetRotation(10.0),
            Command::BringToFront,
            Command::SendToBack,
            Command::DeleteSelected,
        ] {
            assert_eq!(command.execute(&mut doc), Err(InputError::NoSelection));
        }
        assert_eq!(doc, before);
    }

    #[test]
    fn text_tools_reject_image_layers() {
        let mut doc = Document::new();
        let id = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        doc.set_selected_layer(Some(id));
        assert_eq!(
            Command::SetText("hi".into()).execute(&mut doc),
            Err(InputError::NotATextLayer)
        );
        assert_eq!(
            Command::SetTextColor(Color32::RED).execute(&mut doc),
            Err(InputError::NotATextLayer)
        );
    }

    #[test]
    fn slider_scale_is_clamped() {
        let mut doc = Document::new();
        let id = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        doc.set_selected_layer(Some(id));
        Command::SetScale(50.0).execute(&mut doc).unwrap();
        assert_eq!(doc.layer(id).unwrap().transform.scale, MAX_SCALE);
    }

    #[test]
    fn delete_selected_clears_selection() {
        let mut doc = Document::new();
        let id = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        doc.set_selected_layer(Some(id));
        Command::DeleteSelected.execute(&mut doc).unwrap();
        assert!(doc.layers().is_empty());
        assert_eq!(doc.selected_layer_id(), None);
    }

    #[test]
    fn replace_image_source_swaps_src_only() {
        let mut doc = Document::new();
        let id = doc.add_image_layer("a.png", ImageSource::Device, Vec2::ZERO);
        Command::ReplaceImageSource {
            layer_id: id,
            src: "data:image/png;base64,AAAA".into(),
        }
        .execute(&mut doc)
        .unwrap();
        let image = doc.layer(id).unwrap().image().unwrap();
        assert_eq!(image.src, "data:image/png;base64,AAAA");
        assert_eq!(image.source, ImageSource::Device);
    }

    #[test]
    fn hex_colors_parse_with_or_without_hash() {
        assert_eq!(parse_color("#ff0000"), Ok(Color32::from_rgb(255, 0, 0)));
        assert_eq!(parse_color("00ff00"), Ok(Color32::from_rgb(0, 255, 0)));
        assert!(matches!(parse_color("#zzz"), Err(InputError::InvalidColor(_))));
    }
}
