//! Bitmap loading for the live renderer, the export rasterizer and matting.

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::util::task::{MaybeSend, MaybeSync};

pub mod data_url;
mod loader;

pub use loader::{HttpAssetLoader, MemoryAssetLoader, resolve_url};

/// Errors that can occur while fetching or decoding a bitmap
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),

    #[error("invalid URL {src}: {reason}")]
    InvalidUrl { src: String, reason: String },

    #[error("failed to fetch {src}: {reason}")]
    Fetch { src: String, reason: String },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unknown asset: {0}")]
    NotFound(String),

    #[error("{0} is not a supported image")]
    Unsupported(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Future returned by [`AssetLoader::load`]. `Send` on native so loads can
/// run on the shared runtime; the browser's HTTP client is bound to the UI
/// thread, so there it is not.
#[cfg(not(target_arch = "wasm32"))]
pub type LoadFuture<'a> = futures::future::BoxFuture<'a, Result<RgbaImage, AssetError>>;
#[cfg(target_arch = "wasm32")]
pub type LoadFuture<'a> = futures::future::LocalBoxFuture<'a, Result<RgbaImage, AssetError>>;

/// Source of decoded bitmaps.
pub trait AssetLoader {
    fn load<'a>(&'a self, src: &'a str) -> LoadFuture<'a>;
}

impl<T: AssetLoader + ?Sized> AssetLoader for Arc<T> {
    fn load<'a>(&'a self, src: &'a str) -> LoadFuture<'a> {
        (**self).load(src)
    }
}

/// A loader that can be handed to background tasks.
pub trait SharedAssetLoader: AssetLoader + MaybeSend + MaybeSync {}
impl<T: AssetLoader + MaybeSend + MaybeSync> SharedAssetLoader for T {}

pub type SharedLoader = Arc<dyn SharedAssetLoader>;

/// Decodes any supported image format into straight-alpha RGBA.
pub fn decode_bitmap(bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    let image = image::load_from_memory(bytes)?;
    log::debug!("Decoded bitmap: {}x{}", image.width(), image.height());
    Ok(image.to_rgba8())
}

/// Decodes a `data:` URL bitmap synchronously.
pub fn decode_data_url_bitmap(src: &str) -> Result<RgbaImage, AssetError> {
    let url = data_url::decode(src)?;
    decode_bitmap(&url.bytes)
}

/// Encodes a bitmap as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// MIME type of an encoded image, sniffed from its magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}
