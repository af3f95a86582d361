use egui::load::SizedTexture;
use egui::{Align2, Button, Color32, Vec2, vec2};

use super::Modal;
use crate::CollageApp;
use crate::app::CatalogState;
use crate::backend::{AssetEntry, Visibility};
use crate::command::{Command, FONT_PRESETS, TEXT_SWATCHES, parse_color};
use crate::layer::ImageSource;
use crate::state::EditorFlow;
use crate::texture_manager::{TextureManager, TextureSlot};

const THUMBNAIL_SIZE: f32 = 72.0;

fn modal_window(title: &str) -> egui::Window<'_> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
}

/// Shows whichever window is open: a picker, the final modal, and on top of
/// everything the oldest pending alert.
pub fn modals(app: &mut CollageApp, ctx: &egui::Context) {
    match app.ui.modal.clone() {
        Some(Modal::ImagePicker) => image_picker(app, ctx),
        Some(Modal::BackgroundPicker) => background_picker(app, ctx),
        Some(Modal::TextEditor { draft }) => text_editor(app, ctx, draft),
        Some(Modal::FontPicker) => font_picker(app, ctx),
        Some(Modal::ColorPicker { hex }) => color_picker(app, ctx, hex),
        None => {}
    }

    if !app.editor.flow().is_editing() {
        final_modal(app, ctx);
    }

    alert(app, ctx);
}

/// Thumbnail button for a library entry. Falls back to the label while the
/// bitmap is loading.
fn thumbnail(ui: &mut egui::Ui, textures: &mut TextureManager, entry: &AssetEntry, selected: bool) -> egui::Response {
    let button = match textures.texture(ui.ctx(), &entry.src) {
        TextureSlot::Ready { id, size } => {
            let image = egui::Image::new(SizedTexture::new(id, size)).max_size(Vec2::splat(THUMBNAIL_SIZE));
            Button::image(image)
        }
        TextureSlot::Loading | TextureSlot::Failed => Button::new(entry.label.as_str()),
    };
    ui.add(button.selected(selected).min_size(Vec2::splat(THUMBNAIL_SIZE)))
        .on_hover_text(entry.label.as_str())
}

/// Renders the catalog status for `CatalogState`s other than `Loaded`.
/// Returns `true` when the caller should offer a retry.
fn catalog_status(ui: &mut egui::Ui, catalog: &CatalogState) -> bool {
    match catalog {
        CatalogState::NotLoaded | CatalogState::Loading(_) => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading library…");
            });
            false
        }
        CatalogState::Failed(reason) => {
            ui.colored_label(Color32::from_rgb(0xd9, 0x48, 0x48), "Could not load the library.");
            ui.weak(reason.as_str());
            true
        }
        CatalogState::Loaded(_) => false,
    }
}

fn image_picker(app: &mut CollageApp, ctx: &egui::Context) {
    let mut add = false;
    let mut close = false;
    let mut retry = false;

    modal_window("Add images").show(ctx, |ui| {
        match &app.catalog {
            CatalogState::Loaded(catalog) if catalog.images.is_empty() => {
                ui.label("The library has no images yet.");
            }
            CatalogState::Loaded(catalog) => {
                egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        for entry in &catalog.images {
                            let selected = app.ui.is_picked(&entry.src);
                            if thumbnail(ui, &mut app.textures, entry, selected).clicked() {
                                app.ui.toggle_picked(&entry.src);
                            }
                        }
                    });
                });
            }
            other => retry = catalog_status(ui, other),
        }

        ui.separator();
        ui.horizontal(|ui| {
            let count = app.ui.picked_images.len();
            let label = match count {
                1 => "Add 1 image".to_owned(),
                n => format!("Add {n} images"),
            };
            add = ui.add_enabled(count > 0, Button::new(label)).clicked();
            close = ui.button("Cancel").clicked();
            if retry && ui.button("Retry").clicked() {
                app.catalog = CatalogState::NotLoaded;
            }
        });
    });

    if add {
        for src in std::mem::take(&mut app.ui.picked_images) {
            app.execute(Command::AddImageLayer {
                src,
                source: ImageSource::App,
            });
        }
        close = true;
    }
    if matches!(app.catalog, CatalogState::NotLoaded) {
        app.request_catalog(ctx);
    }
    if close {
        app.ui.picked_images.clear();
        app.ui.close();
    }
}

fn background_picker(app: &mut CollageApp, ctx: &egui::Context) {
    let mut chosen: Option<Option<String>> = None;
    let mut close = false;
    let mut retry = false;

    modal_window("Background").show(ctx, |ui| {
        let current = app.editor.document.background().map(|background| background.src.clone());
        match &app.catalog {
            CatalogState::Loaded(catalog) => {
                egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        for entry in &catalog.backgrounds {
                            let selected = current.as_deref() == Some(entry.src.as_str());
                            if thumbnail(ui, &mut app.textures, entry, selected).clicked() {
                                chosen = Some(Some(entry.src.clone()));
                            }
                        }
                    });
                });
            }
            other => retry = catalog_status(ui, other),
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.add_enabled(current.is_some(), Button::new("No background")).clicked() {
                chosen = Some(None);
            }
            close = ui.button("Cancel").clicked();
            if retry && ui.button("Retry").clicked() {
                app.catalog = CatalogState::NotLoaded;
            }
        });
    });

    if let Some(background) = chosen {
        app.execute(Command::SetBackground(background));
        close = true;
    }
    if matches!(app.catalog, CatalogState::NotLoaded) {
        app.request_catalog(ctx);
    }
    if close {
        app.ui.close();
    }
}

fn text_editor(app: &mut CollageApp, ctx: &egui::Context, mut draft: String) {
    let mut apply = false;
    let mut close = false;

    modal_window("Edit text").show(ctx, |ui| {
        ui.add(egui::TextEdit::multiline(&mut draft).desired_rows(3).desired_width(280.0));
        ui.horizontal(|ui| {
            apply = ui.button("Apply").clicked();
            close = ui.button("Cancel").clicked();
        });
    });

    if apply {
        app.execute(Command::SetText(draft));
        app.ui.close();
    } else if close {
        app.ui.close();
    } else {
        app.ui.modal = Some(Modal::TextEditor { draft });
    }
}

fn font_picker(app: &mut CollageApp, ctx: &egui::Context) {
    let current = app
        .editor
        .document
        .selected_layer()
        .and_then(|layer| layer.text())
        .map(|text| text.font_family.clone());
    let mut chosen = None;
    let mut close = false;

    modal_window("Font").show(ctx, |ui| {
        for (label, family) in FONT_PRESETS {
            if ui.selectable_label(current.as_deref() == Some(*family), *label).clicked() {
                chosen = Some((*family).to_owned());
            }
        }
        ui.separator();
        close = ui.button("Close").clicked();
    });

    if let Some(family) = chosen {
        app.execute(Command::SetFontFamily(family));
        close = true;
    }
    if close {
        app.ui.close();
    }
}

fn color_picker(app: &mut CollageApp, ctx: &egui::Context, mut hex: String) {
    let mut chosen = None;
    let mut apply_hex = false;
    let mut close = false;

    modal_window("Text color").show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            for color in TEXT_SWATCHES {
                let swatch = Button::new("").fill(*color).min_size(vec2(28.0, 28.0));
                if ui.add(swatch).clicked() {
                    chosen = Some(*color);
                }
            }
        });
        ui.horizontal(|ui| {
            ui.label("Hex");
            let response = ui.add(egui::TextEdit::singleline(&mut hex).desired_width(90.0));
            apply_hex = ui.button("Apply").clicked()
                || (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)));
        });
        close = ui.button("Close").clicked();
    });

    if apply_hex {
        match parse_color(&hex) {
            Ok(color) => chosen = Some(color),
            Err(err) => app.editor.report(err),
        }
    }
    if let Some(color) = chosen {
        app.execute(Command::SetTextColor(color));
        close = true;
    }
    if close {
        app.ui.close();
    } else {
        app.ui.modal = Some(Modal::ColorPicker { hex });
    }
}

fn final_modal(app: &mut CollageApp, ctx: &egui::Context) {
    let flow = app.editor.flow().clone();
    let logged_in = app.editor.session.is_logged_in();
    let mut save_as = None;
    let mut back = false;
    let mut create_more = false;

    modal_window("Your collage").show(ctx, |ui| match &flow {
        EditorFlow::Editing => {}
        EditorFlow::Finalizing if logged_in => {
            ui.label("Share it with everyone or keep it to yourself.");
            ui.horizontal(|ui| {
                if ui.button("Publish").clicked() {
                    save_as = Some(Visibility::Public);
                }
                if ui.button("Keep private").clicked() {
                    save_as = Some(Visibility::Private);
                }
            });
            back = ui.button("Keep editing").clicked();
        }
        EditorFlow::Finalizing => {
            ui.label("Log in to save or publish your collage.");
            back = ui.button("Keep editing").clicked();
        }
        EditorFlow::Saving { visibility } => {
            ui.horizontal(|ui| {
                ui.spinner();
                match visibility {
                    Visibility::Public => ui.label("Publishing…"),
                    Visibility::Private => ui.label("Saving…"),
                };
            });
        }
        EditorFlow::Saved { .. } => {
            ui.label("Collage saved!");
            create_more = ui.button("Create more").clicked();
        }
    });

    if let Some(visibility) = save_as {
        app.save_collage(ctx, visibility);
    }
    if back {
        app.editor.cancel_finish();
    }
    if create_more {
        app.create_more();
    }
}

fn alert(app: &mut CollageApp, ctx: &egui::Context) {
    let Some(message) = app.editor.current_alert().map(str::to_owned) else {
        return;
    };
    let mut dismissed = false;
    egui::Window::new("Notice")
        .id(egui::Id::new("collage_alert"))
        .collapsible(false)
        .resizable(false)
        .order(egui::Order::Foreground)
        .anchor(Align2::CENTER_TOP, [0.0, 48.0])
        .show(ctx, |ui| {
            ui.label(message);
            dismissed = ui.button("OK").clicked();
        });
    if dismissed {
        app.editor.dismiss_alert();
    }
}
