use std::sync::Arc;

use egui::epaint::{Mesh, TextShape, Vertex};
use egui::{Align2, Color32, FontFamily, FontId, Galley, Painter, Pos2, Rect, Shape, Stroke, Vec2, pos2};

use crate::document::Document;
use crate::export::FALLBACK_COLOR;
use crate::geometry::hit_testing::hits_transformed_rect;
use crate::geometry::{Affine, fit, map_point, map_rect_corners, to_kurbo_vec};
use crate::layer::{IMAGE_BOX_SIZE, Layer, LayerContent, LayerId, TextContent};
use crate::texture_manager::{TextureManager, TextureSlot};

const SELECTION_COLOR: Color32 = Color32::from_rgb(0x8b, 0x5c, 0xf6);
const PLACEHOLDER_FILL: Color32 = Color32::from_rgba_premultiplied(40, 40, 40, 40);
const FAILED_STROKE: Color32 = Color32::from_rgb(0xd9, 0x48, 0x48);
const EMPTY_HINT: &str = "Add images or text to start your collage";

/// On-screen projection of one layer, in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
    pub layer_id: LayerId,
    /// Element box in layer-local points.
    pub local_rect: Rect,
    /// Layer-local points to canvas points.
    pub to_canvas: Affine,
    pub selected: bool,
}

impl ElementView {
    pub fn contains(&self, canvas_pos: Pos2) -> bool {
        hits_transformed_rect(canvas_pos, self.local_rect, &self.to_canvas)
    }

    /// Corners of the element box in canvas points.
    pub fn corners(&self) -> [Pos2; 4] {
        map_rect_corners(&self.to_canvas, self.local_rect)
    }
}

/// Font used on screen for a text layer.
pub fn font_id(text: &TextContent, size: f32) -> FontId {
    let family = if text.is_monospace() {
        FontFamily::Monospace
    } else {
        FontFamily::Proportional
    };
    FontId::new(size, family)
}

/// Projects `document` into element views in paint order (bottom first).
///
/// `measure_text` returns the unscaled size of a text layer's block.
pub fn project(document: &Document, mut measure_text: impl FnMut(&TextContent) -> Vec2) -> Vec<ElementView> {
    let selected = document.selected_layer_id();
    document
        .paint_order()
        .into_iter()
        .map(|layer| {
            let size = match &layer.content {
                LayerContent::Image(_) => Vec2::splat(IMAGE_BOX_SIZE),
                LayerContent::Text(text) => measure_text(text),
            };
            ElementView {
                layer_id: layer.id,
                local_rect: Rect::from_min_size(Pos2::ZERO, size),
                to_canvas: layer.local_to_canvas(),
                selected: selected == Some(layer.id),
            }
        })
        .collect()
}

/// Topmost element under `canvas_pos`.
pub fn hit_test(views: &[ElementView], canvas_pos: Pos2) -> Option<LayerId> {
    views
        .iter()
        .rev()
        .find(|view| view.contains(canvas_pos))
        .map(|view| view.layer_id)
}

/// Paints the document with egui every frame.
///
/// Nothing is retained between frames except the last projection, which
/// input handling uses for hit testing.
#[derive(Debug)]
pub struct Renderer {
    views: Vec<ElementView>,
    fallback_color: Color32,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(FALLBACK_COLOR)
    }
}

impl Renderer {
    pub fn new(fallback_color: Color32) -> Self {
        Self {
            views: Vec::new(),
            fallback_color,
        }
    }

    /// Element views from the last [`Renderer::render`].
    pub fn views(&self) -> &[ElementView] {
        &self.views
    }

    pub fn hit_test(&self, canvas_pos: Pos2) -> Option<LayerId> {
        hit_test(&self.views, canvas_pos)
    }

    /// Re-derives the view of `document` and paints it into `canvas_rect`.
    pub fn render(
        &mut self,
        painter: &Painter,
        canvas_rect: Rect,
        document: &Document,
        textures: &mut TextureManager,
    ) {
        let ctx = painter.ctx().clone();
        let painter = painter.with_clip_rect(canvas_rect);
        let to_screen = Affine::translate(to_kurbo_vec(canvas_rect.min.to_vec2()));

        self.views = project(document, |text| {
            ctx.fonts(|fonts| layout_text(fonts, text, 1.0).size())
        });

        self.paint_background(&painter, canvas_rect, document, textures);

        for view in &self.views {
            let Some(layer) = document.layer(view.layer_id) else {
                continue;
            };
            let element_to_screen = to_screen * view.to_canvas;
            match &layer.content {
                LayerContent::Image(image) => {
                    let slot = textures.texture(&ctx, &image.src);
                    paint_image(&painter, slot, &element_to_screen);
                }
                LayerContent::Text(text) => paint_text(&painter, layer, text, &to_screen),
            }
            if view.selected {
                paint_selection(&painter, view.local_rect, &element_to_screen);
            }
        }

        if !document.has_content() {
            painter.text(
                canvas_rect.center(),
                Align2::CENTER_CENTER,
                EMPTY_HINT,
                FontId::proportional(16.0),
                Color32::from_gray(110),
            );
        }
    }

    fn paint_background(
        &self,
        painter: &Painter,
        canvas_rect: Rect,
        document: &Document,
        textures: &mut TextureManager,
    ) {
        painter.rect_filled(canvas_rect, 0.0, self.fallback_color);
        let Some(background) = document.background() else {
            return;
        };
        if let TextureSlot::Ready { id, size } = textures.texture(painter.ctx(), &background.src) {
            let rect = fit::cover(size, canvas_rect);
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            painter.image(id, rect, uv, Color32::WHITE);
        }
    }
}

fn layout_text(fonts: &egui::text::Fonts, text: &TextContent, scale: f32) -> Arc<Galley> {
    fonts.layout_no_wrap(
        text.display_text().to_owned(),
        font_id(text, text.font_size * scale),
        text.color,
    )
}

fn quad(corners: [Pos2; 4], uvs: [Pos2; 4], color: Color32, mesh: &mut Mesh) {
    let base = mesh.vertices.len() as u32;
    for (pos, uv) in corners.into_iter().zip(uvs) {
        mesh.vertices.push(Vertex { pos, uv, color });
    }
    mesh.add_triangle(base, base + 1, base + 2);
    mesh.add_triangle(base, base + 2, base + 3);
}

fn paint_image(painter: &Painter, slot: TextureSlot, to_screen: &Affine) {
    let image_box = Rect::from_min_size(Pos2::ZERO, Vec2::splat(IMAGE_BOX_SIZE));
    match slot {
        TextureSlot::Ready { id, size } => {
            let dest = fit::contain(size, image_box);
            let uvs = [pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(1.0, 1.0), pos2(0.0, 1.0)];
            let mut mesh = Mesh::with_texture(id);
            quad(map_rect_corners(to_screen, dest), uvs, Color32::WHITE, &mut mesh);
            painter.add(Shape::mesh(mesh));
        }
        TextureSlot::Loading => {
            let mut mesh = Mesh::default();
            quad(map_rect_corners(to_screen, image_box), [egui::epaint::WHITE_UV; 4], PLACEHOLDER_FILL, &mut mesh);
            painter.add(Shape::mesh(mesh));
        }
        TextureSlot::Failed => {
            let corners = map_rect_corners(to_screen, image_box);
            painter.add(Shape::closed_line(corners.to_vec(), Stroke::new(1.5, FAILED_STROKE)));
            painter.line_segment([corners[0], corners[2]], Stroke::new(1.5, FAILED_STROKE));
        }
    }
}

fn paint_text(painter: &Painter, layer: &Layer, text: &TextContent, to_screen: &Affine) {
    // Laid out at the scaled size instead of scaling the glyph mesh, so
    // text stays crisp when enlarged. TextShape rotates about its top-left,
    // which is also the layer's pivot.
    let scale = layer.transform.scale;
    let galley = painter.ctx().fonts(|fonts| layout_text(fonts, text, scale));
    let anchor = map_point(to_screen, layer.transform.position.to_pos2());
    let shape = TextShape::new(anchor, galley, text.color).with_angle(layer.transform.rotation.to_radians());
    painter.add(shape);
}

fn paint_selection(painter: &Painter, local_rect: Rect, to_screen: &Affine) {
    let mut outline = map_rect_corners(to_screen, local_rect.expand(2.0)).to_vec();
    outline.push(outline[0]);
    painter.extend(Shape::dashed_line(&outline, Stroke::new(2.0, SELECTION_COLOR), 6.0, 4.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ImageSource;
    use egui::vec2;

    fn fixed_text_size(_: &TextContent) -> Vec2 {
        vec2(100.0, 30.0)
    }

    #[test]
    fn projection_follows_paint_order() {
        let mut doc = Document::new();
        let a = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        let b = doc.add_image_layer("b.png", ImageSource::App, Vec2::ZERO);
        doc.bring_to_front(a);

        let ids: Vec<LayerId> = project(&doc, fixed_text_size).iter().map(|v| v.layer_id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn topmost_overlapping_layer_wins_hit_test() {
        let mut doc = Document::new();
        let a = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        let b = doc.add_image_layer("b.png", ImageSource::App, vec2(50.0, 0.0));
        let views = project(&doc, fixed_text_size);

        assert_eq!(hit_test(&views, pos2(60.0, 60.0)), Some(b));
        assert_eq!(hit_test(&views, pos2(20.0, 60.0)), Some(a));
        assert_eq!(hit_test(&views, pos2(400.0, 400.0)), None);
    }

    #[test]
    fn scaled_image_hit_area_grows_around_its_center() {
        let mut doc = Document::new();
        let a = doc.add_image_layer("a.png", ImageSource::App, Vec2::ZERO);
        doc.layer_mut(a).unwrap().set_scale(2.0);
        let views = project(&doc, fixed_text_size);

        // The 120 box centered at (60, 60) now spans -60..180.
        assert_eq!(hit_test(&views, pos2(-50.0, 170.0)), Some(a));
        assert_eq!(hit_test(&views, pos2(190.0, 60.0)), None);
    }

    #[test]
    fn text_box_uses_measured_size_at_its_position() {
        let mut doc = Document::new();
        let t = doc.add_text_layer(TextContent::default(), vec2(10.0, 10.0));
        doc.set_selected_layer(Some(t));
        let views = project(&doc, fixed_text_size);

        assert!(views[0].selected);
        assert_eq!(views[0].corners()[0], pos2(10.0, 10.0));
        assert_eq!(hit_test(&views, pos2(105.0, 35.0)), Some(t));
        assert_eq!(hit_test(&views, pos2(120.0, 35.0)), None);
    }

    #[test]
    fn render_paints_without_panicking() {
        use crate::assets::MemoryAssetLoader;

        let ctx = egui::Context::default();
        let mut textures = TextureManager::new(
            std::sync::Arc::new(MemoryAssetLoader::new()),
            crate::util::task::Spawner::new().unwrap(),
            8,
        );
        let mut renderer = Renderer::default();
        let mut doc = Document::new();
        doc.add_text_layer(TextContent::default(), vec2(10.0, 10.0));

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(300.0, 300.0));
                renderer.render(ui.painter(), rect, &doc, &mut textures);
            });
        });
        assert_eq!(renderer.views().len(), 1);
        assert!(renderer.views()[0].local_rect.width() > 0.0);
    }
}
