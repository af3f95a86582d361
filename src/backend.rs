//! Client for the collage backend: the asset library and collage storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use reqwest::Url;

use crate::assets::resolve_url;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("backend rejected the image payload: {0}")]
    MalformedImage(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// One entry of the asset library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub src: String,
}

/// Response of `GET /api/assets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetCatalog {
    pub images: Vec<AssetEntry>,
    pub backgrounds: Vec<AssetEntry>,
    pub thumbnails: Vec<AssetEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// Body of `POST /api/collages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollage {
    /// PNG `data:` URL.
    pub image_data: String,
    pub visibility: Visibility,
    #[serde(rename = "ownerUserID")]
    pub owner_user_id: String,
}

/// A stored collage as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollageRecord {
    pub id: String,
    #[serde(rename = "ownerUserID")]
    pub owner_user_id: Option<String>,
    pub image_url: Option<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by_viewer: bool,
}

/// HTTP client for the backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> BackendResult<Url> {
        resolve_url(&self.base_url, path).map_err(|err| BackendError::InvalidUrl(err.to_string()))
    }

    /// Rewrites every entry's `src` to an absolute URL. Entries that cannot
    /// be resolved keep their original `src`.
    fn absolutize_sources(&self, catalog: &mut AssetCatalog) {
        for entry in catalog
            .images
            .iter_mut()
            .chain(catalog.backgrounds.iter_mut())
            .chain(catalog.thumbnails.iter_mut())
        {
            match self.url(&entry.src) {
                Ok(url) => entry.src = url.into(),
                Err(err) => log::warn!("Keeping asset {} as {:?}: {err}", entry.id, entry.src),
            }
        }
    }

    fn network_error(url: &str, err: reqwest::Error) -> BackendError {
        BackendError::Network {
            url: url.to_owned(),
            message: err.to_string(),
        }
    }

    /// Lists the asset library. Relative `src` paths are resolved against
    /// the base URL so they can be loaded directly.
    pub async fn fetch_assets(&self) -> BackendResult<AssetCatalog> {
        let url = self.url("/api/assets")?;
        log::debug!("Fetching asset catalog from {url}");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| Self::network_error(url.as_str(), err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let mut catalog: AssetCatalog = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;

        self.absolutize_sources(&mut catalog);
        log::info!(
            "Loaded asset catalog: {} images, {} backgrounds",
            catalog.images.len(),
            catalog.backgrounds.len()
        );
        Ok(catalog)
    }

    /// Stores an exported collage.
    pub async fn save_collage(&self, collage: &NewCollage) -> BackendResult<CollageRecord> {
        let url = self.url("/api/collages")?;
        log::info!(
            "Saving {:?} collage for {} ({} bytes)",
            collage.visibility,
            collage.owner_user_id,
            collage.image_data.len()
        );

        let response = self
            .client
            .post(url.clone())
            .json(collage)
            .send()
            .await
            .map_err(|err| Self::network_error(url.as_str(), err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Failed to save collage: HTTP {status}: {body}");
            if status == reqwest::StatusCode::BAD_REQUEST {
                return Err(BackendError::MalformedImage(body));
            }
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let record: CollageRecord = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        log::info!("Saved collage record {}", record.id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_collage_uses_backend_field_names() {
        let body = NewCollage {
            image_data: "data:image/png;base64,AA==".into(),
            visibility: Visibility::Private,
            owner_user_id: "u1".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["imageData"], "data:image/png;base64,AA==");
        assert_eq!(json["visibility"], "private");
        assert_eq!(json["ownerUserID"], "u1");
    }

    #[test]
    fn record_accepts_null_image_url() {
        let record: CollageRecord = serde_json::from_str(
            r#"{"id":"c1","ownerUserID":"u1","imageUrl":null,"visibility":"public",
                "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z",
                "likeCount":3,"likedByViewer":false}"#,
        )
        .unwrap();
        assert_eq!(record.image_url, None);
        assert_eq!(record.visibility, Visibility::Public);
        assert_eq!(record.like_count, 3);
    }

    #[test]
    fn catalog_tolerates_missing_sections() {
        let catalog: AssetCatalog =
            serde_json::from_str(r#"{"images":[{"id":"i1","label":"Cat","src":"/media/cat.png"}]}"#).unwrap();
        assert_eq!(catalog.images.len(), 1);
        assert!(catalog.backgrounds.is_empty());
    }

    #[test]
    fn urls_join_the_base() {
        let client = BackendClient::new(reqwest::Client::new(), "http://localhost:4000/");
        assert_eq!(client.url("/api/assets").unwrap().as_str(), "http://localhost:4000/api/assets");
    }

    #[test]
    fn bad_base_url_is_reported() {
        let client = BackendClient::new(reqwest::Client::new(), "localhost");
        assert!(matches!(client.url("/api/assets"), Err(BackendError::InvalidUrl(_))));
    }

    #[test]
    fn catalog_sources_become_absolute() {
        let client = BackendClient::new(reqwest::Client::new(), "http://localhost:4000/api/");
        let mut catalog: AssetCatalog = serde_json::from_str(
            r#"{"images":[{"id":"i1","src":"/media/cat.png"}],
                "backgrounds":[{"id":"b1","src":"https://cdn.test/sky.jpg"}],
                "thumbnails":[{"id":"t1","src":"../thumbs/cat.png"}]}"#,
        )
        .unwrap();

        client.absolutize_sources(&mut catalog);
        assert_eq!(catalog.images[0].src, "http://localhost:4000/media/cat.png");
        assert_eq!(catalog.backgrounds[0].src, "https://cdn.test/sky.jpg");
        assert_eq!(catalog.thumbnails[0].src, "http://localhost:4000/thumbs/cat.png");
    }
}
