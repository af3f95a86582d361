//! Editor actions as data, executed against the document.
//!
//! Every tool in the shell goes through [`Command::execute`], so the rules
//! about what needs a selection or a particular layer kind live in one place
//! and can be tested without any UI.

mod commands;

pub use commands::{Command, CommandOutcome, FONT_PRESETS, TEXT_SWATCHES, parse_color};

use crate::error::InputError;

/// Result type for command operations
pub type CommandResult = Result<CommandOutcome, InputError>;
