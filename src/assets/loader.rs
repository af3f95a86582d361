use std::collections::HashMap;

use image::RgbaImage;
use parking_lot::Mutex;
use reqwest::Url;

use super::{AssetError, AssetLoader, LoadFuture, data_url, decode_bitmap, decode_data_url_bitmap};

/// Loads bitmaps from `data:` URLs or over HTTP.
///
/// Relative sources (`/media/images/cat.png`) resolve against the backend
/// base URL, which is where the asset library serves its files.
#[derive(Debug, Clone)]
pub struct HttpAssetLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAssetLoader {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Absolute URL for `src`.
    pub fn resolve(&self, src: &str) -> Result<Url, AssetError> {
        resolve_url(&self.base_url, src)
    }

    async fn fetch(&self, src: &str) -> Result<RgbaImage, AssetError> {
        let url = self.resolve(src)?;
        log::debug!("Fetching bitmap {url}");
        let fetch_error = |reason: String| AssetError::Fetch {
            src: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| fetch_error(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }
        let bytes = response.bytes().await.map_err(|err| fetch_error(err.to_string()))?;
        decode_bitmap(&bytes)
    }
}

impl AssetLoader for HttpAssetLoader {
    fn load<'a>(&'a self, src: &'a str) -> LoadFuture<'a> {
        if data_url::is_data_url(src) {
            let result = decode_data_url_bitmap(src);
            return Box::pin(async move { result });
        }
        Box::pin(self.fetch(src))
    }
}

/// Resolves `src` against `base` with standard URL reference rules. Absolute
/// sources come back unchanged; root-relative ones replace the base path.
pub fn resolve_url(base: &str, src: &str) -> Result<Url, AssetError> {
    let base_url = Url::parse(base).map_err(|err| AssetError::InvalidUrl {
        src: base.to_owned(),
        reason: err.to_string(),
    })?;
    base_url.join(src).map_err(|err| AssetError::InvalidUrl {
        src: src.to_owned(),
        reason: err.to_string(),
    })
}

/// In-memory bitmaps keyed by source string, with `data:` URLs decoded on
/// the fly. Counts loads so callers can check what was fetched.
#[derive(Debug, Default)]
pub struct MemoryAssetLoader {
    images: HashMap<String, RgbaImage>,
    loads: Mutex<Vec<String>>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, src: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(src, image);
        self
    }

    pub fn insert(&mut self, src: impl Into<String>, image: RgbaImage) {
        self.images.insert(src.into(), image);
    }

    /// Sources requested so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.loads.lock().clone()
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load<'a>(&'a self, src: &'a str) -> LoadFuture<'a> {
        self.loads.lock().push(src.to_owned());
        let result = if data_url::is_data_url(src) {
            decode_data_url_bitmap(src)
        } else {
            self.images
                .get(src)
                .cloned()
                .ok_or_else(|| AssetError::NotFound(src.to_owned()))
        };
        Box::pin(async move { result })
    }
}
