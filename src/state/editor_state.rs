use crate::backend::Visibility;

/// Where the editor is in the finish flow.
///
/// ```text
/// Editing ──done──► Finalizing ──publish/private──► Saving ──ok──► Saved
///    ▲                  │  ▲                           │             │
///    └──────cancel──────┘  └───────────failed──────────┘             │
///    ▲                                                               │
///    └────────────────────────create more────────────────────────────┘
/// ```
///
/// Transitions are validated by [`EditorFlow::can_transition_to`]; the
/// [`EditorContext`](super::EditorContext) is the only place that moves
/// between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditorFlow {
    /// Normal editing.
    #[default]
    Editing,
    /// The final modal is open.
    Finalizing,
    /// Rasterizing and uploading. Only one save runs at a time.
    Saving { visibility: Visibility },
    /// Stored by the backend.
    Saved { collage_id: String },
}

impl EditorFlow {
    /// Validates whether a transition to the new state is allowed
    pub fn can_transition_to(&self, next: &EditorFlow) -> bool {
        match (self, next) {
            (EditorFlow::Editing, EditorFlow::Finalizing) => true,

            (EditorFlow::Finalizing, EditorFlow::Editing) => true,
            (EditorFlow::Finalizing, EditorFlow::Saving { .. }) => true,

            (EditorFlow::Saving { .. }, EditorFlow::Saved { .. }) => true,
            (EditorFlow::Saving { .. }, EditorFlow::Finalizing) => true,

            (EditorFlow::Saved { .. }, EditorFlow::Editing) => true,

            _ => false,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, EditorFlow::Editing)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, EditorFlow::Saving { .. })
    }

    pub fn saved_collage_id(&self) -> Option<&str> {
        match self {
            EditorFlow::Saved { collage_id } => Some(collage_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saving_is_only_reachable_from_the_final_modal() {
        let saving = EditorFlow::Saving {
            visibility: Visibility::Public,
        };
        assert!(!EditorFlow::Editing.can_transition_to(&saving));
        assert!(EditorFlow::Finalizing.can_transition_to(&saving));
        assert!(!saving.can_transition_to(&saving));
    }

    #[test]
    fn saved_returns_to_editing() {
        let saved = EditorFlow::Saved {
            collage_id: "c1".into(),
        };
        assert!(saved.can_transition_to(&EditorFlow::Editing));
        assert!(!saved.can_transition_to(&EditorFlow::Finalizing));
        assert_eq!(saved.saved_collage_id(), Some("c1"));
    }
}
