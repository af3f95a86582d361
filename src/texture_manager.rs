use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions, Vec2};
use image::RgbaImage;

use crate::assets::{AssetError, SharedLoader};
use crate::util::task::{Pending, Spawner};

/// What the renderer can draw for a bitmap source this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureSlot {
    Ready { id: TextureId, size: Vec2 },
    Loading,
    Failed,
}

enum TextureEntry {
    Loading(Pending<Result<ColorImage, AssetError>>),
    Ready(TextureHandle),
    Failed,
}

fn to_color_image(image: &RgbaImage) -> ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

/// Caches GPU textures by bitmap source, loading missing ones in the
/// background.
///
/// Requests for a source that is still loading return
/// [`TextureSlot::Loading`] so the renderer can draw a placeholder.
/// Failures are remembered so a broken URL is not refetched every frame.
/// They share the LRU budget with ready textures and are dropped on
/// [`TextureManager::invalidate`] or when they age out.
pub struct TextureManager {
    loader: SharedLoader,
    spawner: Spawner,
    entries: HashMap<String, TextureEntry>,
    /// Tracks when each ready or failed entry was last used
    last_used: HashMap<String, u64>,
    /// Current frame counter for LRU tracking
    current_frame: u64,
    /// Maximum number of ready and failed entries to keep
    max_cache_size: usize,
    next_name: u64,
}

impl TextureManager {
    pub fn new(loader: SharedLoader, spawner: Spawner, max_cache_size: usize) -> Self {
        Self {
            loader,
            spawner,
            entries: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size,
            next_name: 0,
        }
    }

    pub fn loader(&self) -> &SharedLoader {
        &self.loader
    }

    /// Advances the LRU clock and uploads any bitmaps that finished loading.
    /// Call once at the start of each frame.
    pub fn begin_frame(&mut self, ctx: &Context) {
        self.current_frame += 1;

        let finished: Vec<(String, Result<ColorImage, AssetError>)> = self
            .entries
            .iter()
            .filter_map(|(src, entry)| match entry {
                TextureEntry::Loading(pending) => pending.try_take().map(|result| (src.clone(), result)),
                _ => None,
            })
            .collect();

        for (src, result) in finished {
            match result {
                Ok(image) => self.upload(ctx, src, image),
                Err(err) => {
                    log::warn!("Failed to load texture {}: {err}", short_src(&src));
                    self.prune_cache_if_needed();
                    self.last_used.insert(src.clone(), self.current_frame);
                    self.entries.insert(src, TextureEntry::Failed);
                }
            }
        }
    }

    /// The texture for `src`, starting a background load on first request.
    pub fn texture(&mut self, ctx: &Context, src: &str) -> TextureSlot {
        match self.entries.get(src) {
            Some(TextureEntry::Ready(handle)) => {
                let size = handle.size_vec2();
                let id = handle.id();
                self.last_used.insert(src.to_owned(), self.current_frame);
                TextureSlot::Ready { id, size }
            }
            Some(TextureEntry::Loading(_)) => TextureSlot::Loading,
            Some(TextureEntry::Failed) => {
                self.last_used.insert(src.to_owned(), self.current_frame);
                TextureSlot::Failed
            }
            None => {
                self.start_load(ctx, src);
                TextureSlot::Loading
            }
        }
    }

    /// Uploads an already decoded bitmap for `src`, replacing any entry.
    pub fn insert_image(&mut self, ctx: &Context, src: impl Into<String>, image: &RgbaImage) {
        self.upload(ctx, src.into(), to_color_image(image));
    }

    /// Whether any texture is still loading.
    pub fn is_loading(&self) -> bool {
        self.entries.values().any(|entry| matches!(entry, TextureEntry::Loading(_)))
    }

    /// Forgets `src` so the next request reloads it.
    pub fn invalidate(&mut self, src: &str) {
        self.entries.remove(src);
        self.last_used.remove(src);
    }

    /// Clears all textures from the cache
    pub fn clear_cache(&mut self) {
        self.entries.clear();
        self.last_used.clear();
    }

    /// Number of ready textures currently held.
    pub fn cache_size(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| matches!(entry, TextureEntry::Ready(_)))
            .count()
    }

    fn start_load(&mut self, ctx: &Context, src: &str) {
        log::debug!("Loading texture {}", short_src(src));
        let loader = self.loader.clone();
        let owned_src = src.to_owned();
        let pending = self.spawner.spawn(Some(ctx.clone()), async move {
            let image = loader.load(&owned_src).await?;
            Ok::<_, AssetError>(to_color_image(&image))
        });
        self.entries.insert(src.to_owned(), TextureEntry::Loading(pending));
    }

    fn upload(&mut self, ctx: &Context, src: String, image: ColorImage) {
        self.prune_cache_if_needed();

        self.next_name += 1;
        let name = format!("collage_texture_{}", self.next_name);
        let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);
        self.last_used.insert(src.clone(), self.current_frame);
        self.entries.insert(src, TextureEntry::Ready(handle));
    }

    /// Drops least recently used entries, ready or failed, once the cache
    /// is full.
    fn prune_cache_if_needed(&mut self) {
        let held = self.last_used.len();
        if held < self.max_cache_size {
            return;
        }

        let mut entries: Vec<(String, u64)> = self
            .last_used
            .iter()
            .map(|(src, frame)| (src.clone(), *frame))
            .collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = held + 1 - self.max_cache_size;
        for (src, _) in entries.into_iter().take(to_remove) {
            self.entries.remove(&src);
            self.last_used.remove(&src);
        }
    }
}

/// Data URLs are long; log only their head.
fn short_src(src: &str) -> &str {
    match src.char_indices().nth(64) {
        Some((index, _)) => &src[..index],
        None => src,
    }
}
