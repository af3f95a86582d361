//! `data:` URLs, the embedded-bitmap form device imports and exports use.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::AssetError;

pub const PNG_MIME: &str = "image/png";

pub fn is_data_url(src: &str) -> bool {
    src.starts_with("data:")
}

/// Encodes bytes as `data:<mime>;base64,<payload>`.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn encode_png(bytes: &[u8]) -> String {
    encode(PNG_MIME, bytes)
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Decodes a base64 `data:` URL. Non-base64 (percent-encoded) payloads are
/// not used for bitmaps and are rejected.
pub fn decode(src: &str) -> Result<DataUrl, AssetError> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::MalformedDataUrl("missing data: prefix".to_owned()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::MalformedDataUrl("missing ',' separator".to_owned()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| AssetError::MalformedDataUrl("payload is not base64".to_owned()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|err| AssetError::MalformedDataUrl(err.to_string()))?;

    Ok(DataUrl {
        mime: mime.to_owned(),
        bytes,
    })
}
