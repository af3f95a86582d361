use std::collections::HashSet;

use eframe::egui;

use crate::assets::{AssetError, data_url, sniff_mime};
use crate::command::Command;
use crate::layer::ImageSource;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Turns files dropped onto the window into device image layers.
///
/// Each file is embedded as a `data:` URL so the document stays
/// self-contained and the export rasterizer can read it without a network
/// round trip.
#[derive(Debug, Default)]
pub struct FileHandler {
    processed_files: HashSet<String>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes this frame's dropped files and returns one command per usable
    /// image. Files that can't be imported are returned as errors.
    pub fn take_dropped_files(&mut self, ctx: &egui::Context) -> Vec<Result<Command, AssetError>> {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let mut results = Vec::new();

        for file in &dropped {
            let file_name = display_name(file);
            if !self.processed_files.insert(file_name.clone()) {
                continue;
            }
            let result = read_bytes(file, &file_name).and_then(|bytes| import_bytes(&file_name, &bytes));
            if result.is_ok() {
                ctx.request_repaint();
            }
            results.push(result);
        }
        results
    }

    /// Forgets which files were imported so the same file can be dropped
    /// again.
    pub fn clear_processed_files(&mut self) {
        self.processed_files.clear();
    }

    /// Dims the window and lists the files being dragged over it.
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, FontId, Id, LayerId, Order};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let text = ctx.input(|i| {
            let mut text = "Drop images to add them to the collage:\n".to_owned();
            for file in &i.raw.hovered_files {
                match &file.path {
                    Some(path) => text += &format!("\n{}", path.display()),
                    None if !file.mime.is_empty() => text += &format!("\n{}", file.mime),
                    None => text += "\n(unnamed file)",
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(20.0),
            Color32::WHITE,
        );
    }
}

fn display_name(file: &egui::DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

/// Whether the file looks like an image from its MIME type or extension.
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    let name = file
        .path
        .as_ref()
        .and_then(|path| path.extension())
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .or_else(|| file.name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()));
    name.is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn read_bytes(file: &egui::DroppedFile, file_name: &str) -> Result<Vec<u8>, AssetError> {
    if !is_image_file(file) {
        return Err(AssetError::Unsupported(file_name.to_owned()));
    }
    if let Some(bytes) = &file.bytes {
        log::info!("Importing image from memory: {file_name} ({} bytes)", bytes.len());
        return Ok(bytes.to_vec());
    }

    // The browser never hands out paths, only bytes.
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Some(path) = &file.path {
            log::info!("Importing image from path: {}", path.display());
            return std::fs::read(path).map_err(|source| AssetError::Io {
                path: file_name.to_owned(),
                source,
            });
        }
    }

    log::warn!("Dropped file has no accessible data: {file_name}");
    Err(AssetError::NotFound(file_name.to_owned()))
}

/// Builds the command that adds `bytes` as a device image layer.
///
/// The bytes are validated by decoding them once, so a corrupt file is
/// rejected here instead of showing up as a broken layer.
pub fn import_bytes(file_name: &str, bytes: &[u8]) -> Result<Command, AssetError> {
    let mime = sniff_mime(bytes).ok_or_else(|| AssetError::Unsupported(file_name.to_owned()))?;
    image::load_from_memory(bytes)?;
    Ok(Command::AddImageLayer {
        src: data_url::encode(mime, bytes),
        source: ImageSource::Device,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{decode_data_url_bitmap, encode_png};
    use image::{Rgba, RgbaImage};

    #[test]
    fn png_bytes_become_a_device_layer() {
        let png = encode_png(&RgbaImage::from_pixel(2, 3, Rgba([9, 8, 7, 255]))).unwrap();
        let Command::AddImageLayer { src, source } = import_bytes("cat.png", &png).unwrap() else {
            panic!("expected an image layer command");
        };
        assert_eq!(source, ImageSource::Device);
        assert!(src.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url_bitmap(&src).unwrap().dimensions(), (2, 3));
    }

    #[test]
    fn non_images_are_rejected() {
        assert!(matches!(
            import_bytes("notes.txt", b"hello"),
            Err(AssetError::Unsupported(name)) if name == "notes.txt"
        ));
    }

    #[test]
    fn extension_is_used_when_mime_is_missing() {
        let file = egui::DroppedFile {
            name: "photo.JPG".into(),
            ..Default::default()
        };
        assert!(is_image_file(&file));

        let file = egui::DroppedFile {
            mime: "text/plain".into(),
            name: "photo.png".into(),
            ..Default::default()
        };
        assert!(!is_image_file(&file));
    }
}
