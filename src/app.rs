use std::sync::Arc;

use egui::Rect;

use crate::assets::{HttpAssetLoader, SharedLoader};
use crate::backend::{AssetCatalog, BackendClient, BackendError, CollageRecord, NewCollage, Visibility};
use crate::command::Command;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::{CollageError, InputError};
use crate::export::{ExportOptions, capture_collage_as_png};
use crate::file_handler::FileHandler;
use crate::layer::LayerId;
use crate::matting::{MattingError, remove_background};
use crate::panels::{self, UiState};
use crate::renderer::Renderer;
use crate::state::{EditorContext, EditorSnapshot, Session};
use crate::texture_manager::TextureManager;
use crate::util::task::{Pending, Spawner};

/// State of the asset library download.
#[derive(Debug, Default)]
pub enum CatalogState {
    #[default]
    NotLoaded,
    Loading(Pending<Result<AssetCatalog, BackendError>>),
    Loaded(AssetCatalog),
    Failed(String),
}

struct MattingJob {
    layer_id: LayerId,
    src: String,
    pending: Pending<Result<String, MattingError>>,
}

pub struct CollageApp {
    pub(crate) config: EditorConfig,
    pub(crate) editor: EditorContext,
    pub(crate) textures: TextureManager,
    pub(crate) ui: UiState,
    pub(crate) catalog: CatalogState,
    backend: BackendClient,
    /// Runs fetches, matting and exports off the UI thread.
    spawner: Spawner,
    file_handler: FileHandler,
    matting: Option<MattingJob>,
    save_task: Option<Pending<Result<CollageRecord, CollageError>>>,
    /// Where the canvas was laid out last frame; exports match it.
    canvas_rect: Rect,
}

impl CollageApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self, CollageError> {
        let config = EditorConfig::load();
        let spawner = Spawner::new().map_err(CollageError::Runtime)?;
        let client = reqwest::Client::new();
        let loader: SharedLoader = Arc::new(HttpAssetLoader::new(client.clone(), config.api_base_url.clone()));
        let backend = BackendClient::new(client, config.api_base_url.clone());

        let mut app = Self::with_parts(config, loader, backend, spawner);
        if let Some(storage) = cc.storage {
            if let Some(snapshot) = EditorSnapshot::load(storage) {
                log::info!("Restoring {} layers from the last session", snapshot.document.layers().len());
                if let Err(err) = snapshot.restore(&mut app.editor) {
                    log::warn!("Could not restore the last session: {err}");
                }
            }
        }
        Ok(app)
    }

    /// Builds the app from explicit collaborators.
    pub fn with_parts(config: EditorConfig, loader: SharedLoader, backend: BackendClient, spawner: Spawner) -> Self {
        let session = match &config.user_id {
            Some(user_id) => Session::signed_in(user_id.clone()),
            None => Session::guest(),
        };
        let editor = EditorContext::new(Document::new(), Renderer::new(config.fallback_color), session);
        let textures = TextureManager::new(loader, spawner.clone(), config.max_textures);
        Self {
            config,
            editor,
            textures,
            ui: UiState::default(),
            catalog: CatalogState::default(),
            backend,
            spawner,
            file_handler: FileHandler::new(),
            matting: None,
            save_task: None,
            canvas_rect: Rect::NOTHING,
        }
    }

    pub fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = rect;
    }

    /// Runs `command` and reports a rejection as an alert.
    pub fn execute(&mut self, command: Command) {
        self.editor.execute(command);
    }

    /// Starts downloading the asset library unless it is loaded or loading.
    pub fn request_catalog(&mut self, ctx: &egui::Context) {
        if matches!(self.catalog, CatalogState::Loading(_) | CatalogState::Loaded(_)) {
            return;
        }
        let backend = self.backend.clone();
        self.catalog = CatalogState::Loading(
            self.spawner
                .spawn(Some(ctx.clone()), async move { backend.fetch_assets().await }),
        );
    }

    pub fn is_removing_background(&self) -> bool {
        self.matting.is_some()
    }

    /// Removes the background of the selected image layer in the background.
    pub fn remove_background_of_selected(&mut self, ctx: &egui::Context) {
        if self.matting.is_some() {
            return;
        }
        let selected = self
            .editor
            .document
            .selected_layer()
            .ok_or(InputError::NoSelection)
            .and_then(|layer| {
                let image = layer.image().ok_or(InputError::NotAnImageLayer)?;
                Ok((layer.id, image.src.clone()))
            });
        let (layer_id, src) = match selected {
            Ok(found) => found,
            Err(err) => {
                self.editor.report(err);
                return;
            }
        };

        log::info!("Removing background of layer {layer_id}");
        let loader = self.textures.loader().clone();
        let threshold = self.config.matte_threshold;
        let task_src = src.clone();
        let pending = self.spawner.spawn(Some(ctx.clone()), async move {
            remove_background(&loader, &task_src, threshold).await
        });
        self.matting = Some(MattingJob { layer_id, src, pending });
    }

    /// Opens the final modal.
    pub fn finish(&mut self) {
        if let Err(err) = self.editor.begin_finish() {
            self.editor.report(err);
        }
    }

    /// Rasterizes a snapshot of the document and uploads it.
    pub fn save_collage(&mut self, ctx: &egui::Context, visibility: Visibility) {
        let request = match self.editor.begin_save(visibility) {
            Ok(request) => request,
            Err(err) => {
                self.editor.report(err);
                return;
            }
        };

        let options = ExportOptions::for_viewport(self.canvas_rect.size(), ctx.pixels_per_point())
            .with_fallback_color(self.config.fallback_color);
        let loader = self.textures.loader().clone();
        let backend = self.backend.clone();
        self.save_task = Some(self.spawner.spawn(Some(ctx.clone()), async move {
            let image_data = capture_collage_as_png(&request.document, &loader, &options).await?;
            let record = backend
                .save_collage(&NewCollage {
                    image_data,
                    visibility: request.visibility,
                    owner_user_id: request.owner_user_id,
                })
                .await?;
            Ok::<_, CollageError>(record)
        }));
    }

    /// Starts a new collage after saving.
    pub fn create_more(&mut self) {
        self.editor.create_more();
        self.ui = UiState::default();
        self.file_handler.clear_processed_files();
    }

    /// Picks up results of background tasks that finished since last frame.
    fn poll_tasks(&mut self) {
        if let CatalogState::Loading(pending) = &self.catalog {
            if let Some(result) = pending.try_take() {
                self.catalog = match result {
                    Ok(catalog) => CatalogState::Loaded(catalog),
                    Err(err) => {
                        log::error!("Failed to load the asset library: {err}");
                        CatalogState::Failed(err.to_string())
                    }
                };
            }
        }

        if let Some(result) = self.matting.as_ref().and_then(|job| job.pending.try_take()) {
            if let Some(job) = self.matting.take() {
                self.finish_matting(job, result);
            }
        }

        if let Some(result) = self.save_task.as_ref().and_then(Pending::try_take) {
            self.save_task = None;
            self.editor.finish_save(result);
        }
    }

    fn finish_matting(&mut self, job: MattingJob, result: Result<String, MattingError>) {
        let src = match result {
            Ok(src) => src,
            Err(err) => {
                self.editor.report(err);
                return;
            }
        };
        let still_current = self
            .editor
            .document
            .layer(job.layer_id)
            .and_then(|layer| layer.image())
            .is_some_and(|image| image.src == job.src);
        if !still_current {
            log::info!("Layer {} changed while removing its background, dropping result", job.layer_id);
            return;
        }
        self.execute(Command::ReplaceImageSource {
            layer_id: job.layer_id,
            src,
        });
    }

    fn import_dropped_files(&mut self, ctx: &egui::Context) {
        for result in self.file_handler.take_dropped_files(ctx) {
            match result {
                Ok(command) => self.execute(command),
                Err(err) => self.editor.report(err),
            }
        }
    }

    /// Whether a window on top of the canvas should swallow canvas input.
    pub fn blocks_canvas(&self) -> bool {
        self.ui.modal.is_some() || self.editor.current_alert().is_some() || !self.editor.flow().is_editing()
    }
}

impl eframe::App for CollageApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        EditorSnapshot::new(&self.editor).save(storage);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.textures.begin_frame(ctx);
        self.poll_tasks();

        if self.editor.flow().is_editing() {
            self.import_dropped_files(ctx);
        }
        self.file_handler.preview_files_being_dropped(ctx);

        panels::tools_panel(self, ctx);
        panels::central_panel(self, ctx);
        panels::modals(self, ctx);
    }
}
