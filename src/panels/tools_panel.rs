use egui::{Button, Slider};

use super::Modal;
use crate::CollageApp;
use crate::command::Command;
use crate::error::InputError;
use crate::layer::{MAX_SCALE, MIN_SCALE};

const BUTTON_WIDTH: f32 = 180.0;

fn wide(label: &str) -> Button<'_> {
    Button::new(label).min_size(egui::vec2(BUTTON_WIDTH, 0.0))
}

pub fn tools_panel(app: &mut CollageApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(false)
        .default_width(200.0)
        .show(ctx, |ui| {
            let editing = app.editor.flow().is_editing();
            ui.add_enabled_ui(editing, |ui| {
                ui.heading("Collage");
                ui.add_space(4.0);

                if ui.add(wide("Add images")).clicked() {
                    app.ui.picked_images.clear();
                    app.ui.open(Modal::ImagePicker);
                    app.request_catalog(ctx);
                }
                ui.small("Or drop image files onto the window.");
                if ui.add(wide("Background")).clicked() {
                    app.ui.open(Modal::BackgroundPicker);
                    app.request_catalog(ctx);
                }
                if ui.add(wide("Add text")).clicked() {
                    app.execute(Command::AddTextLayer);
                }

                ui.separator();
                layer_tools(app, ui, ctx);

                ui.separator();
                text_tools(app, ui);

                ui.separator();
                if ui.add(wide("Clear canvas")).clicked() {
                    log::info!("Clearing the canvas");
                    app.execute(Command::Clear);
                }
                if ui.add(wide("Done")).clicked() {
                    app.finish();
                }
            });

            ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                match &app.editor.session.user_id {
                    Some(user_id) => ui.weak(format!("Signed in as {user_id}")),
                    None => ui.weak("Browsing as a guest"),
                };
            });
        });
}

fn layer_tools(app: &mut CollageApp, ui: &mut egui::Ui, ctx: &egui::Context) {
    let selected = app
        .editor
        .document
        .selected_layer()
        .map(|layer| (layer.label(), layer.transform.scale, layer.transform.rotation));

    match selected {
        Some((label, _, _)) => ui.label(format!("Selected: {label}")),
        None => ui.weak("Nothing selected"),
    };

    // Sliders work in percent; a layer's scale is value / 100.
    let (mut percent, mut degrees) = selected
        .map(|(_, scale, rotation)| (scale * 100.0, rotation))
        .unwrap_or((100.0, 0.0));
    let has_selection = selected.is_some();

    let scale_slider = Slider::new(&mut percent, (MIN_SCALE * 100.0)..=(MAX_SCALE * 100.0))
        .text("Scale")
        .suffix("%")
        .fixed_decimals(0);
    if ui.add_enabled(has_selection, scale_slider).changed() {
        app.execute(Command::SetScale(percent / 100.0));
    }
    let rotate_slider = Slider::new(&mut degrees, -180.0..=180.0)
        .text("Rotate")
        .suffix("°")
        .fixed_decimals(0);
    if ui.add_enabled(has_selection, rotate_slider).changed() {
        app.execute(Command::SetRotation(degrees));
    }

    ui.horizontal(|ui| {
        if ui.button("Bring to front").clicked() {
            app.execute(Command::BringToFront);
        }
        if ui.button("Send to back").clicked() {
            app.execute(Command::SendToBack);
        }
    });
    if ui.add(wide("Delete")).clicked() {
        app.execute(Command::DeleteSelected);
    }

    let removing = app.is_removing_background();
    let label = if removing { "Removing background…" } else { "Remove background" };
    if ui.add_enabled(!removing, wide(label)).clicked() {
        app.remove_background_of_selected(ctx);
    }
}

fn text_tools(app: &mut CollageApp, ui: &mut egui::Ui) {
    ui.label("Text");
    ui.horizontal(|ui| {
        if ui.button("Edit").clicked() {
            match selected_text(app) {
                Ok(text) => app.ui.open(Modal::TextEditor { draft: text.text }),
                Err(err) => app.editor.report(err),
            }
        }
        if ui.button("Font").clicked() {
            match selected_text(app) {
                Ok(_) => app.ui.open(Modal::FontPicker),
                Err(err) => app.editor.report(err),
            }
        }
        if ui.button("Color").clicked() {
            match selected_text(app) {
                Ok(text) => app.ui.open(Modal::ColorPicker {
                    hex: text.color.to_hex(),
                }),
                Err(err) => app.editor.report(err),
            }
        }
    });
}

fn selected_text(app: &CollageApp) -> Result<crate::layer::TextContent, InputError> {
    app.editor
        .document
        .selected_layer()
        .ok_or(InputError::NoSelection)?
        .text()
        .cloned()
        .ok_or(InputError::NotATextLayer)
}
