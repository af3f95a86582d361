//! Text rasterization for export, using the same fonts egui ships with so
//! the exported text matches what the canvas shows.

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};

use super::ExportError;
use crate::layer::TextContent;

const PROPORTIONAL_FONT: &str = "Ubuntu-Light";
const MONOSPACE_FONT: &str = "Hack";

const PROPORTIONAL: usize = 0;
const MONOSPACE: usize = 1;

/// Coverage of one laid-out text block.
#[derive(Debug, Clone)]
pub struct TextBitmap {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

pub struct TextRasterizer {
    fonts: [Font; 2],
}

impl TextRasterizer {
    pub fn new() -> Result<Self, ExportError> {
        let definitions = egui::FontDefinitions::default();
        let load = |name: &str| -> Result<Font, ExportError> {
            let data = definitions
                .font_data
                .get(name)
                .ok_or_else(|| ExportError::Font(format!("font {name} is not bundled")))?;
            Font::from_bytes(&data.font[..], FontSettings::default())
                .map_err(|err| ExportError::Font(format!("{name}: {err}")))
        };
        Ok(Self {
            fonts: [load(PROPORTIONAL_FONT)?, load(MONOSPACE_FONT)?],
        })
    }

    fn font_index(text: &TextContent) -> usize {
        if text.is_monospace() { MONOSPACE } else { PROPORTIONAL }
    }

    /// Lays out `text` top-left aligned at `px` pixels per em. Lines break
    /// on `\n` only.
    pub fn layout(&self, text: &TextContent, px: f32) -> Layout {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&self.fonts, &TextStyle::new(text.display_text(), px, Self::font_index(text)));
        layout
    }

    /// Coverage of `text` laid out at `px`. The first line's ascent starts
    /// at y = 0, matching a `top` text baseline.
    pub fn rasterize(&self, text: &TextContent, px: f32) -> TextBitmap {
        let layout = self.layout(text, px);
        let glyphs = layout.glyphs();

        let right = glyphs
            .iter()
            .map(|glyph| glyph.x + glyph.width as f32)
            .fold(0.0f32, f32::max);
        let width = right.ceil().max(1.0) as u32;
        let height = layout.height().ceil().max(1.0) as u32;
        let mut coverage = vec![0u8; width as usize * height as usize];

        for glyph in glyphs {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = self.fonts[glyph.font_index].rasterize_config(glyph.key);
            let (left, top) = (glyph.x as i32, glyph.y as i32);
            for gy in 0..metrics.height {
                let y = top + gy as i32;
                if y < 0 || y >= height as i32 {
                    continue;
                }
                for gx in 0..metrics.width {
                    let x = left + gx as i32;
                    if x < 0 || x >= width as i32 {
                        continue;
                    }
                    let dst = &mut coverage[y as usize * width as usize + x as usize];
                    *dst = (*dst).max(bitmap[gy * metrics.width + gx]);
                }
            }
        }

        TextBitmap {
            width,
            height,
            coverage,
        }
    }

    /// Rasterizes `text` in its color.
    pub fn render(&self, text: &TextContent, px: f32) -> RgbaImage {
        let bitmap = self.rasterize(text, px);
        let [r, g, b, a] = text.color.to_srgba_unmultiplied();
        RgbaImage::from_fn(bitmap.width, bitmap.height, |x, y| {
            let c = bitmap.coverage[y as usize * bitmap.width as usize + x as usize];
            let alpha = ((u32::from(a) * u32::from(c) + 127) / 255) as u8;
            Rgba([r, g, b, alpha])
        })
    }
}
