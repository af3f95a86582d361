use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::export::FALLBACK_COLOR;
use crate::matting::MATTE_THRESHOLD;

/// Names the JSON config file to read on native builds.
pub const CONFIG_PATH_VAR: &str = "COLLAGE_CONFIG";
/// Overrides [`EditorConfig::api_base_url`].
pub const API_BASE_VAR: &str = "COLLAGE_API_BASE";
/// Overrides [`EditorConfig::user_id`].
pub const USER_ID_VAR: &str = "COLLAGE_USER_ID";

pub const DEFAULT_API_BASE: &str = "http://localhost:4000";

/// Editor settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Backend origin; asset paths and API routes resolve against it.
    pub api_base_url: String,
    /// Signed-in user, if the host already knows it.
    pub user_id: Option<String>,
    /// Color distance below which matting clears a pixel.
    pub matte_threshold: f32,
    /// Canvas color when there is no background.
    pub fallback_color: Color32,
    /// Textures kept on the GPU before the least recently used are dropped.
    pub max_textures: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_owned(),
            user_id: None,
            matte_threshold: MATTE_THRESHOLD,
            fallback_color: FALLBACK_COLOR,
            max_textures: 64,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production). Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(base) = non_empty(API_BASE_VAR) {
            self.api_base_url = base;
        }
        if let Some(user) = non_empty(USER_ID_VAR) {
            self.user_id = Some(user);
        }
    }

    /// Loads the config for this platform. Problems are logged and fall
    /// back to defaults; the editor always starts.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(json) => Self::from_json(&json).unwrap_or_else(|err| {
                    log::warn!("Ignoring invalid config {path}: {err}");
                    Self::default()
                }),
                Err(err) => {
                    log::warn!("Could not read config {path}: {err}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        log::info!("Using backend at {}", config.api_base_url);
        config
    }

    /// Loads the config for this platform: the backend is the page origin.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(origin) = web_sys::window().and_then(|window| window.location().origin().ok()) {
            config.api_base_url = origin;
        }
        log::info!("Using backend at {}", config.api_base_url);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"matte_threshold": 25.0}"#).unwrap();
        assert_eq!(config.matte_threshold, 25.0);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert_eq!(config.fallback_color, FALLBACK_COLOR);
    }

    #[test]
    fn overrides_replace_non_empty_values() {
        let mut config = EditorConfig::default();
        config.apply_overrides(|name| match name {
            API_BASE_VAR => Some("https://collage.example".to_owned()),
            USER_ID_VAR => Some("  ".to_owned()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://collage.example");
        assert_eq!(config.user_id, None);
    }
}
