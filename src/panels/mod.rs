//! The editor's egui panels. Each takes the whole app, the same way the
//! app hands itself to every panel each frame.

mod central_panel;
mod modals;
mod tools_panel;

pub use central_panel::central_panel;
pub use modals::modals;
pub use tools_panel::tools_panel;

/// Which picker or editor window is open. The final modal and alerts are
/// driven by the editor context instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    ImagePicker,
    BackgroundPicker,
    TextEditor { draft: String },
    FontPicker,
    ColorPicker { hex: String },
}

/// Transient UI state that is not part of the document.
#[derive(Debug, Default)]
pub struct UiState {
    pub modal: Option<Modal>,
    /// Sources ticked in the image picker, in the order they were ticked.
    pub picked_images: Vec<String>,
}

impl UiState {
    pub fn open(&mut self, modal: Modal) {
        self.modal = Some(modal);
    }

    pub fn close(&mut self) {
        self.modal = None;
    }

    pub fn toggle_picked(&mut self, src: &str) {
        match self.picked_images.iter().position(|picked| picked == src) {
            Some(index) => {
                self.picked_images.remove(index);
            }
            None => self.picked_images.push(src.to_owned()),
        }
    }

    pub fn is_picked(&self, src: &str) -> bool {
        self.picked_images.iter().any(|picked| picked == src)
    }
}
