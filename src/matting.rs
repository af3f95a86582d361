//! Background removal by color distance from the image corners.

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::assets::{AssetError, AssetLoader, data_url, encode_png};

/// Pixels closer than this (Euclidean RGB distance) to the estimated
/// background color become transparent.
pub const MATTE_THRESHOLD: f32 = 40.0;

#[derive(Error, Debug)]
pub enum MattingError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("failed to encode matted image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("image has no pixels")]
    Empty,
}

/// Average RGB of the four corner pixels.
pub fn estimate_background(image: &RgbaImage) -> Option<[f32; 3]> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let corners = [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)];
    let mut sum = [0.0f32; 3];
    for (x, y) in corners {
        let Rgba([r, g, b, _]) = *image.get_pixel(x, y);
        sum[0] += r as f32;
        sum[1] += g as f32;
        sum[2] += b as f32;
    }
    Some(sum.map(|c| c / 4.0))
}

/// [`matte_with_threshold`] at the default threshold.
pub fn matte(image: &RgbaImage) -> RgbaImage {
    matte_with_threshold(image, MATTE_THRESHOLD)
}

/// Clears the alpha of every pixel whose color is within `threshold` of the
/// corner average. One pass over all pixels; matches in the interior are
/// cleared as well, there is no flood fill from the edges.
pub fn matte_with_threshold(image: &RgbaImage, threshold: f32) -> RgbaImage {
    let mut out = image.clone();
    let Some(background) = estimate_background(image) else {
        return out;
    };

    let mut cleared = 0usize;
    for pixel in out.pixels_mut() {
        let dr = pixel[0] as f32 - background[0];
        let dg = pixel[1] as f32 - background[1];
        let db = pixel[2] as f32 - background[2];
        if (dr * dr + dg * dg + db * db).sqrt() < threshold {
            pixel[3] = 0;
            cleared += 1;
        }
    }
    log::debug!(
        "Matte cleared {cleared} of {} pixels (background {background:?})",
        out.width() as usize * out.height() as usize
    );
    out
}

/// Loads `src`, removes its background and returns the result as a PNG
/// `data:` URL suitable as the layer's new `src`.
pub async fn remove_background<L: AssetLoader + ?Sized>(
    loader: &L,
    src: &str,
    threshold: f32,
) -> Result<String, MattingError> {
    let image = loader.load(src).await?;
    if image.width() == 0 || image.height() == 0 {
        return Err(MattingError::Empty);
    }
    let matted = matte_with_threshold(&image, threshold);
    let png = encode_png(&matted)?;
    Ok(data_url::encode_png(&png))
}
