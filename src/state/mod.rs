mod editor_state;
pub mod context;
mod persistence;
mod session;

pub use editor_state::EditorFlow;
pub use context::{EditorContext, SaveRequest, StateTransitionError};
pub use persistence::{
    EditorSnapshot,
    PersistenceError,
    PersistenceResult,
    SNAPSHOT_VERSION,
};
pub use session::Session;
