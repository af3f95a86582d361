use crate::CollageApp;
use crate::input::PointerEvent;

pub fn central_panel(app: &mut CollageApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;
            app.set_canvas_rect(canvas_rect);

            let raw_events = ctx.input(|i| i.events.clone());
            let mut events = app.editor.router.collect_events(&raw_events, canvas_rect);
            if app.blocks_canvas() {
                // Still let running gestures end so nothing stays captured.
                events.retain(PointerEvent::is_release);
            }
            if !events.is_empty() && app.editor.handle_pointer_events(&events) {
                ctx.request_repaint();
            }

            let editor = &mut app.editor;
            editor
                .renderer
                .render(&painter, canvas_rect, &editor.document, &mut app.textures);
        });
}
