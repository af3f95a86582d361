#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod assets;
pub mod backend;
pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod file_handler;
pub mod geometry;
pub mod input;
pub mod layer;
pub mod matting;
pub mod panels;
pub mod renderer;
pub mod state;
pub mod texture_manager;
pub mod util;

pub use app::CollageApp;
pub use command::Command;
pub use document::Document;
pub use error::{CollageError, InputError};
pub use export::capture_collage_as_png;
pub use layer::{Layer, LayerContent, LayerId};
pub use renderer::Renderer;
pub use state::{EditorContext, EditorFlow};
