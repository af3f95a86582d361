use thiserror::Error;

use crate::assets::AssetError;
use crate::backend::BackendError;
use crate::export::ExportError;
use crate::matting::MattingError;

/// Errors caused by the user invoking a tool the current state does not allow.
///
/// These are reported through a blocking alert and never change the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Select a layer first.")]
    NoSelection,

    #[error("This tool only works on text layers.")]
    NotATextLayer,

    #[error("This tool only works on image layers.")]
    NotAnImageLayer,

    #[error("Add at least one image or background before finishing.")]
    EmptyCollage,

    #[error("You need to be logged in before saving or publishing.")]
    NotLoggedIn,

    #[error("An export is already in progress.")]
    ExportInFlight,

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

/// Top-level error for everything the editor can fail at.
#[derive(Debug, Error)]
pub enum CollageError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Background removal failed: {0}")]
    Matting(#[from] MattingError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Failed to start the task runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl CollageError {
    /// Message suitable for a user-facing alert.
    ///
    /// Input errors are shown verbatim; network failures get the generic
    /// message the editor has always shown.
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(err) => err.to_string(),
            Self::Asset(_) | Self::Matting(_) => {
                "Could not load that image. Try another one.".to_owned()
            }
            Self::Export(_) => "Could not render the collage.".to_owned(),
            Self::Backend(_) => "Failed to save collage. Check the log for details.".to_owned(),
            Self::Runtime(_) => "The editor could not start its background workers.".to_owned(),
        }
    }
}

pub type CollageResult<T> = Result<T, CollageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_shown_verbatim() {
        let err = CollageError::from(InputError::NoSelection);
        assert_eq!(err.user_message(), "Select a layer first.");
    }

    #[test]
    fn backend_errors_use_generic_message() {
        let err = CollageError::from(BackendError::Status {
            status: 500,
            body: "boom".to_owned(),
        });
        assert!(err.user_message().starts_with("Failed to save collage"));
    }
}
