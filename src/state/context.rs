//! The editor context: the document plus everything that edits or views it.
//!
//! The `CollageApp` owns exactly one `EditorContext`. Panels and background
//! task completions go through it, so input errors always end up in the
//! alert queue and finish-flow transitions are always validated.

use std::collections::VecDeque;

use thiserror::Error;

use super::{EditorFlow, Session};
use crate::backend::{CollageRecord, Visibility};
use crate::command::{Command, CommandOutcome};
use crate::document::Document;
use crate::error::{CollageError, InputError};
use crate::input::{GestureRouter, PointerEvent};
use crate::renderer::Renderer;

/// Errors that can occur during flow transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateTransitionError {
    #[error("cannot go from {from:?} to {to:?}")]
    InvalidTransition { from: EditorFlow, to: EditorFlow },
}

/// Everything a save task needs, detached from the live document.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub document: Document,
    pub owner_user_id: String,
    pub visibility: Visibility,
}

#[derive(Debug)]
pub struct EditorContext {
    pub document: Document,
    pub renderer: Renderer,
    pub router: GestureRouter,
    pub session: Session,
    flow: EditorFlow,
    alerts: VecDeque<String>,
}

impl EditorContext {
    pub fn new(document: Document, renderer: Renderer, session: Session) -> Self {
        Self {
            document,
            renderer,
            router: GestureRouter::new(),
            session,
            flow: EditorFlow::Editing,
            alerts: VecDeque::new(),
        }
    }

    pub fn flow(&self) -> &EditorFlow {
        &self.flow
    }

    pub fn transition_to(&mut self, next: EditorFlow) -> Result<(), StateTransitionError> {
        if !self.flow.can_transition_to(&next) {
            return Err(StateTransitionError::InvalidTransition {
                from: self.flow.clone(),
                to: next,
            });
        }
        log::debug!("Editor flow {:?} -> {:?}", self.flow, next);
        self.flow = next;
        Ok(())
    }

    /// Executes `command`, turning a rejected command into an alert.
    pub fn execute(&mut self, command: Command) -> Option<CommandOutcome> {
        let prunes_layers = matches!(command, Command::DeleteSelected | Command::Clear);
        log::debug!("Executing {command:?}");
        match command.execute(&mut self.document) {
            Ok(outcome) => {
                if prunes_layers {
                    self.router.retain_layers(&self.document);
                }
                Some(outcome)
            }
            Err(err) => {
                self.report(err);
                None
            }
        }
    }

    /// Feeds this frame's pointer events to the gesture router, hit testing
    /// against the last rendered frame. Returns `true` if anything changed.
    ///
    /// Outside editing only releases get through, so gestures that were
    /// running when the final modal opened still end.
    pub fn handle_pointer_events(&mut self, events: &[PointerEvent]) -> bool {
        let editing = self.flow.is_editing();
        let mut changed = false;
        for event in events.iter().filter(|event| editing || event.is_release()) {
            let hit = self.renderer.hit_test(event.pos);
            changed |= self.router.dispatch(&mut self.document, *event, hit);
        }
        changed
    }

    /// Logs `err` and queues its user-facing message.
    pub fn report(&mut self, err: impl Into<CollageError>) {
        let err = err.into();
        match &err {
            CollageError::Input(_) => log::info!("Rejected: {err}"),
            _ => log::error!("{err}"),
        }
        self.push_alert(err.user_message());
    }

    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    /// The alert to show, if any. Alerts are shown one at a time.
    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    /// "Done": opens the final modal when there is something to save.
    pub fn begin_finish(&mut self) -> Result<(), CollageError> {
        if !self.document.has_content() {
            return Err(InputError::EmptyCollage.into());
        }
        self.document.set_selected_layer(None);
        self.transition_to(EditorFlow::Finalizing)
            .map_err(|_| InputError::ExportInFlight)?;
        Ok(())
    }

    pub fn cancel_finish(&mut self) {
        if let Err(err) = self.transition_to(EditorFlow::Editing) {
            log::warn!("{err}");
        }
    }

    /// Starts a save. The returned request carries a snapshot of the
    /// document, so editing can't race the export.
    pub fn begin_save(&mut self, visibility: Visibility) -> Result<SaveRequest, InputError> {
        if self.flow.is_saving() {
            return Err(InputError::ExportInFlight);
        }
        let owner_user_id = self.session.user_id.clone().ok_or(InputError::NotLoggedIn)?;
        if !self.document.has_content() {
            return Err(InputError::EmptyCollage);
        }
        self.transition_to(EditorFlow::Saving { visibility })
            .map_err(|_| InputError::ExportInFlight)?;
        Ok(SaveRequest {
            document: self.document.clone(),
            owner_user_id,
            visibility,
        })
    }

    /// Settles the save started by [`EditorContext::begin_save`].
    ///
    /// On failure the document is untouched and the final modal stays
    /// open so the user can retry.
    pub fn finish_save(&mut self, result: Result<CollageRecord, CollageError>) {
        let next = match result {
            Ok(record) => {
                log::info!("Collage {} saved as {:?}", record.id, record.visibility);
                EditorFlow::Saved { collage_id: record.id }
            }
            Err(err) => {
                self.report(err);
                EditorFlow::Finalizing
            }
        };
        if let Err(err) = self.transition_to(next) {
            log::warn!("Ignoring save result: {err}");
        }
    }

    /// "Create more": starts a fresh collage after a save.
    pub fn create_more(&mut self) {
        self.document.clear();
        self.router.reset();
        self.flow = EditorFlow::Editing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::layer::ImageSource;

    fn context(session: Session) -> EditorContext {
        EditorContext::new(Document::new(), Renderer::default(), session)
    }

    fn record(id: &str) -> CollageRecord {
        CollageRecord {
            id: id.into(),
            owner_user_id: Some("u1".into()),
            image_url: None,
            visibility: Visibility::Private,
            created_at: None,
            updated_at: None,
            like_count: 0,
            liked_by_viewer: false,
        }
    }

    fn with_image(ctx: &mut EditorContext) {
        ctx.execute(Command::AddImageLayer {
            src: "a.png".into(),
            source: ImageSource::App,
        });
    }

    #[test]
    fn rejected_commands_become_alerts() {
        let mut ctx = context(Session::guest());
        assert_eq!(ctx.execute(Command::BringToFront), None);
        assert_eq!(ctx.current_alert(), Some("Select a layer first."));
        ctx.dismiss_alert();
        assert_eq!(ctx.current_alert(), None);
    }

    #[test]
    fn finishing_an_empty_collage_is_rejected() {
        let mut ctx = context(Session::guest());
        let err = ctx.begin_finish().unwrap_err();
        assert!(matches!(err, CollageError::Input(InputError::EmptyCollage)));
        assert!(ctx.flow().is_editing());
    }

    #[test]
    fn guests_cannot_save() {
        let mut ctx = context(Session::guest());
        with_image(&mut ctx);
        ctx.begin_finish().unwrap();
        assert_eq!(ctx.begin_save(Visibility::Public), Err(InputError::NotLoggedIn));
        assert_eq!(ctx.flow(), &EditorFlow::Finalizing);
    }

    #[test]
    fn only_one_save_at_a_time() {
        let mut ctx = context(Session::signed_in("u1"));
        with_image(&mut ctx);
        ctx.begin_finish().unwrap();

        let request = ctx.begin_save(Visibility::Private).unwrap();
        assert_eq!(request.owner_user_id, "u1");
        assert_eq!(request.document.layers().len(), 1);
        assert_eq!(ctx.begin_save(Visibility::Private), Err(InputError::ExportInFlight));
    }

    #[test]
    fn failed_save_keeps_the_document_and_reopens_the_modal() {
        let mut ctx = context(Session::signed_in("u1"));
        with_image(&mut ctx);
        ctx.begin_finish().unwrap();
        ctx.begin_save(Visibility::Public).unwrap();

        ctx.finish_save(Err(BackendError::MalformedImage("bad".into()).into()));
        assert_eq!(ctx.flow(), &EditorFlow::Finalizing);
        assert_eq!(ctx.document.layers().len(), 1);
        assert!(ctx.current_alert().is_some());
    }

    #[test]
    fn create_more_starts_over_after_saving() {
        let mut ctx = context(Session::signed_in("u1"));
        with_image(&mut ctx);
        ctx.begin_finish().unwrap();
        ctx.begin_save(Visibility::Public).unwrap();
        ctx.finish_save(Ok(record("c9")));
        assert_eq!(ctx.flow().saved_collage_id(), Some("c9"));

        ctx.create_more();
        assert!(ctx.flow().is_editing());
        assert!(!ctx.document.has_content());
    }

    #[test]
    fn pointer_events_are_ignored_outside_editing() {
        let mut ctx = context(Session::guest());
        with_image(&mut ctx);
        ctx.begin_finish().unwrap();
        let changed = ctx.handle_pointer_events(&[PointerEvent::down(1, egui::pos2(10.0, 10.0))]);
        assert!(!changed);
    }
}
