//! The export target: a `vello_cpu` render context, plus the conversions
//! between straight-alpha `image` bitmaps and premultiplied pixmaps.

use std::sync::Arc;

use egui::{Color32, Vec2, vec2};
use image::RgbaImage;
use vello_cpu::peniko::color::PremulRgba8;

use super::ExportError;
use crate::geometry::Affine;

fn mul_div255(x: u8, y: u8) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}

fn premultiply([r, g, b, a]: [u8; 4]) -> PremulRgba8 {
    PremulRgba8 {
        r: mul_div255(r, a),
        g: mul_div255(g, a),
        b: mul_div255(b, a),
        a,
    }
}

fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |c: u8| ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8;
    [un(r), un(g), un(b), a]
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn full_rect(width: u16, height: u16) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height))
}

/// A decoded bitmap prepared as an image paint.
#[derive(Clone)]
pub struct Bitmap {
    width: u16,
    height: u16,
    paint: vello_cpu::Image,
}

impl Bitmap {
    pub fn from_rgba(image: &RgbaImage) -> Result<Self, ExportError> {
        let too_large = || ExportError::BitmapTooLarge {
            width: image.width(),
            height: image.height(),
        };
        let width: u16 = image.width().try_into().map_err(|_| too_large())?;
        let height: u16 = image.height().try_into().map_err(|_| too_large())?;
        if width == 0 || height == 0 {
            return Err(too_large());
        }

        let mut may_have_opacities = false;
        let pixels = image
            .pixels()
            .map(|pixel| {
                may_have_opacities |= pixel[3] != 255;
                premultiply(pixel.0)
            })
            .collect();
        let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, width, height, may_have_opacities);

        Ok(Self {
            width,
            height,
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
        })
    }

    /// Size in pixels.
    pub fn size(&self) -> Vec2 {
        vec2(f32::from(self.width), f32::from(self.height))
    }
}

pub struct ExportCanvas {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
}

impl ExportCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self, ExportError> {
        let invalid = || ExportError::InvalidSize { width, height };
        let w: u16 = width.try_into().map_err(|_| invalid())?;
        let h: u16 = height.try_into().map_err(|_| invalid())?;
        if w == 0 || h == 0 {
            return Err(invalid());
        }
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
        })
    }

    pub fn fill(&mut self, color: Color32) {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        self.ctx.fill_rect(&full_rect(self.width, self.height));
    }

    /// Draws `bitmap` with its pixel grid mapped onto the canvas by
    /// `to_pixels`. Draws composite source-over in call order.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, to_pixels: &Affine) {
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(*to_pixels));
        self.ctx.set_paint(bitmap.paint.clone());
        self.ctx.fill_rect(&full_rect(bitmap.width, bitmap.height));
    }

    /// Renders everything drawn so far into a straight-alpha bitmap.
    pub fn into_image(mut self) -> RgbaImage {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);

        let raw: Vec<u8> = pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .flat_map(|px| unpremultiply([px[0], px[1], px[2], px[3]]))
            .collect();
        let (width, height) = (u32::from(self.width), u32::from(self.height));
        // The pixmap always holds width * height * 4 bytes.
        RgbaImage::from_raw(width, height, raw).unwrap_or_else(|| RgbaImage::new(width, height))
    }
}
