use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EditorContext, Session};
use crate::document::Document;

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur during state persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize state: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Snapshot version {found} is not supported (expected {expected})")]
    IncompatibleVersion { found: u32, expected: u32 },
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// The part of the editor that survives a restart: the document being
/// edited and who is editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub version: u32,
    pub document: Document,
    #[serde(default)]
    pub session: Session,
}

impl EditorSnapshot {
    pub fn new(ctx: &EditorContext) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            document: ctx.document.clone(),
            session: ctx.session.clone(),
        }
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> PersistenceResult<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::IncompatibleVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }

    /// Restore this snapshot to an editor context. A session from the host
    /// (config or environment) wins over the persisted one.
    pub fn restore(self, ctx: &mut EditorContext) -> PersistenceResult<()> {
        self.check_version()?;
        ctx.document = self.document;
        if !ctx.session.is_logged_in() {
            ctx.session = self.session;
        }
        ctx.router.reset();
        Ok(())
    }

    /// Writes the snapshot into eframe's app storage.
    pub fn save(&self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Reads the last snapshot from eframe's app storage, if there is a
    /// usable one.
    pub fn load(storage: &dyn eframe::Storage) -> Option<Self> {
        let snapshot: Self = eframe::get_value(storage, eframe::APP_KEY)?;
        match snapshot.check_version() {
            Ok(()) => Some(snapshot),
            Err(err) => {
                log::warn!("Discarding saved editor state: {err}");
                None
            }
        }
    }
}
