//! Off-screen re-rendering of a document into a PNG.
//!
//! Layers are drawn with `vello_cpu` through the same
//! [`Layer::local_to_canvas`] affine the live renderer uses, so the exported
//! image lines up with what was on screen.

use egui::{Color32, Rect, Vec2, pos2, vec2};
use futures::StreamExt as _;
use image::RgbaImage;
use thiserror::Error;

use crate::assets::{AssetError, AssetLoader, data_url, encode_png};
use crate::document::Document;
use crate::geometry::{Affine, fit, stretch};
use crate::layer::{IMAGE_BOX_SIZE, Layer, LayerContent, MIN_SCALE, TextContent};

mod canvas;
mod text;

pub use canvas::{Bitmap, ExportCanvas};
pub use text::{TextBitmap, TextRasterizer};

/// Canvas color when there is no background, or it failed to load.
pub const FALLBACK_COLOR: Color32 = Color32::from_rgb(0xf5, 0xe6, 0xff);

/// Bitmap loads allowed in flight at once. Results are still drawn in
/// document order.
const MAX_CONCURRENT_LOADS: usize = 4;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("bitmap of {width}x{height} cannot be drawn")]
    BitmapTooLarge { width: u32, height: u32 },

    #[error("font error: {0}")]
    Font(String),

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Pixels per canvas point. Layer coordinates are in points.
    pub pixels_per_point: f32,
    pub fallback_color: Color32,
}

impl ExportOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels_per_point: 1.0,
            fallback_color: FALLBACK_COLOR,
        }
    }

    /// Output matching a viewport of `size` points shown at `pixels_per_point`.
    pub fn for_viewport(size: Vec2, pixels_per_point: f32) -> Self {
        let ppp = if pixels_per_point > 0.0 { pixels_per_point } else { 1.0 };
        Self {
            width: (size.x * ppp).round().max(0.0) as u32,
            height: (size.y * ppp).round().max(0.0) as u32,
            pixels_per_point: ppp,
            fallback_color: FALLBACK_COLOR,
        }
    }

    pub fn with_fallback_color(mut self, color: Color32) -> Self {
        self.fallback_color = color;
        self
    }

    /// The viewport in canvas points.
    fn viewport(&self) -> Rect {
        Rect::from_min_size(
            pos2(0.0, 0.0),
            vec2(
                self.width as f32 / self.pixels_per_point,
                self.height as f32 / self.pixels_per_point,
            ),
        )
    }

    fn points_to_pixels(&self) -> Affine {
        Affine::scale(f64::from(self.pixels_per_point))
    }
}

/// Rasterizes `document` into a `width x height` bitmap.
///
/// Bitmaps are fetched concurrently but drawn strictly in paint order. A
/// layer whose bitmap cannot be loaded is skipped with a warning; a failing
/// background falls back to the fill color.
pub async fn rasterize<L: AssetLoader + ?Sized>(
    document: &Document,
    loader: &L,
    options: &ExportOptions,
) -> Result<RgbaImage, ExportError> {
    if options.width == 0
        || options.height == 0
        || !options.pixels_per_point.is_finite()
        || options.pixels_per_point <= 0.0
    {
        return Err(ExportError::InvalidSize {
            width: options.width,
            height: options.height,
        });
    }
    log::info!(
        "Rasterizing {} layers into {}x{} px",
        document.layers().len(),
        options.width,
        options.height
    );

    let background = match document.background() {
        Some(background) => match loader.load(&background.src).await {
            Ok(bitmap) => Some(bitmap),
            Err(err) => {
                log::warn!("Background {} failed to load, using fill color: {err}", background.src);
                None
            }
        },
        None => None,
    };

    let layers = document.paint_order();
    let loads: Vec<_> = layers.iter().map(|layer| load_layer_bitmap(loader, layer)).collect();
    let bitmaps: Vec<Option<Result<RgbaImage, AssetError>>> = futures::stream::iter(loads)
        .buffered(MAX_CONCURRENT_LOADS)
        .collect()
        .await;

    paint(options, background.as_ref(), &layers, bitmaps)
}

async fn load_layer_bitmap<L: AssetLoader + ?Sized>(loader: &L, layer: &Layer) -> Option<Result<RgbaImage, AssetError>> {
    match &layer.content {
        LayerContent::Image(image) => Some(loader.load(&image.src).await),
        LayerContent::Text(_) => None,
    }
}

/// Draws the loaded bitmaps. Runs after every load has settled, so the
/// render context never lives across an await.
fn paint(
    options: &ExportOptions,
    background: Option<&RgbaImage>,
    layers: &[&Layer],
    bitmaps: Vec<Option<Result<RgbaImage, AssetError>>>,
) -> Result<RgbaImage, ExportError> {
    let mut canvas = ExportCanvas::new(options.width, options.height)?;
    let to_pixels = options.points_to_pixels();

    canvas.fill(options.fallback_color);
    if let Some(background) = background {
        match Bitmap::from_rgba(background) {
            Ok(bitmap) => {
                let dest = fit::cover(bitmap.size(), options.viewport());
                canvas.draw_bitmap(&bitmap, &(to_pixels * stretch(bitmap.size(), dest)));
            }
            Err(err) => log::warn!("Skipping background: {err}"),
        }
    }

    let needs_text = layers.iter().any(|layer| matches!(layer.content, LayerContent::Text(_)));
    let text_rasterizer = if needs_text { Some(TextRasterizer::new()?) } else { None };

    for (layer, bitmap) in layers.iter().zip(bitmaps) {
        let to_canvas = to_pixels * layer.local_to_canvas();
        match (&layer.content, bitmap) {
            (LayerContent::Image(image), Some(Ok(bitmap))) => match Bitmap::from_rgba(&bitmap) {
                Ok(bitmap) => draw_image_layer(&mut canvas, &bitmap, &to_canvas),
                Err(err) => log::warn!("Skipping layer {} ({}): {err}", layer.id, image.src),
            },
            (LayerContent::Image(image), Some(Err(err))) => {
                log::warn!("Skipping layer {} ({}): {err}", layer.id, image.src);
            }
            (LayerContent::Text(text), _) => {
                if let Some(rasterizer) = &text_rasterizer {
                    draw_text_layer(&mut canvas, rasterizer, layer, text, options, &to_canvas);
                }
            }
            (LayerContent::Image(_), None) => {}
        }
    }

    Ok(canvas.into_image())
}

fn draw_image_layer(canvas: &mut ExportCanvas, bitmap: &Bitmap, to_canvas: &Affine) {
    let image_box = Rect::from_min_size(pos2(0.0, 0.0), Vec2::splat(IMAGE_BOX_SIZE));
    let dest = fit::contain(bitmap.size(), image_box);
    canvas.draw_bitmap(bitmap, &(*to_canvas * stretch(bitmap.size(), dest)));
}

fn draw_text_layer(
    canvas: &mut ExportCanvas,
    rasterizer: &TextRasterizer,
    layer: &Layer,
    text: &TextContent,
    options: &ExportOptions,
    to_canvas: &Affine,
) {
    // Glyphs are rasterized at their final pixel size so scaled-up text
    // stays sharp; the bitmap is then mapped back into layer-local points.
    let density = options.pixels_per_point * layer.transform.scale.max(MIN_SCALE);
    let image = rasterizer.render(text, text.font_size * density);
    match Bitmap::from_rgba(&image) {
        Ok(bitmap) => canvas.draw_bitmap(&bitmap, &(*to_canvas * Affine::scale(1.0 / f64::from(density)))),
        Err(err) => log::warn!("Skipping text layer {}: {err}", layer.id),
    }
}

/// Rasterizes `document` and encodes it as a `data:image/png;base64,` URL,
/// the payload the backend stores.
pub async fn capture_collage_as_png<L: AssetLoader + ?Sized>(
    document: &Document,
    loader: &L,
    options: &ExportOptions,
) -> Result<String, ExportError> {
    let image = rasterize(document, loader, options).await?;
    let png = encode_png(&image)?;
    log::info!("Exported collage: {} bytes of PNG", png.len());
    Ok(data_url::encode_png(&png))
}
