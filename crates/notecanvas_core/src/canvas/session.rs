//! Synchronous driver that pairs a `CanvasModel` with a `NoteGateway`.

use super::drag::ScreenPoint;
use super::gateway::{GatewayError, NoteGateway};
use super::model::{CanvasError, CanvasModel, NoteForm};
use crate::model::note::{Note, NoteId, UpdateNotePositionInput};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of a session intent that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Refused locally; nothing was sent.
    Canvas(CanvasError),
    /// Sent and failed; already logged and left unreconciled.
    Gateway(GatewayError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canvas(err) => write!(f, "{err}"),
            Self::Gateway(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Canvas(err) => Some(err),
            Self::Gateway(err) => Some(err),
        }
    }
}

impl From<CanvasError> for SessionError {
    fn from(value: CanvasError) -> Self {
        Self::Canvas(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Canvas state bound to a gateway.
pub struct CanvasSession<G: NoteGateway> {
    gateway: G,
    model: CanvasModel,
}

impl<G: NoteGateway> CanvasSession<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            model: CanvasModel::new(),
        }
    }

    pub fn model(&self) -> &CanvasModel {
        &self.model
    }

    /// Direct access for gesture bookkeeping (drag start/end, edit fields).
    pub fn model_mut(&mut self) -> &mut CanvasModel {
        &mut self.model
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Replaces the local list with the remote one.
    pub fn load(&mut self) -> SessionResult<()> {
        match self.gateway.get_notes() {
            Ok(notes) => {
                self.model.replace_all(notes);
                Ok(())
            }
            Err(err) => {
                warn!("event=canvas_load module=canvas status=error error={err}");
                Err(SessionError::Gateway(err))
            }
        }
    }

    /// Submits the new-note form.
    pub fn create(&mut self, form: &NoteForm) -> SessionResult<Note> {
        let input = self.model.begin_create(form)?;
        let result = self.gateway.create_note(&input);
        let outcome = result.clone();
        self.model.finish_create(result);
        outcome.map_err(SessionError::Gateway)
    }

    /// Saves the active edit session.
    pub fn save_edit(&mut self) -> SessionResult<Note> {
        let input = self.model.begin_save_edit()?;
        let result = self.gateway.update_note(&input);
        let outcome = result.clone();
        self.model.finish_save_edit(result);
        outcome.map_err(SessionError::Gateway)
    }

    pub fn delete(&mut self, id: NoteId) -> SessionResult<()> {
        let result = self.gateway.delete_note(id);
        let outcome = result.clone();
        self.model.finish_delete(id, result);
        outcome.map_err(SessionError::Gateway)
    }

    /// Completes the active drag at `pointer`.
    ///
    /// Returns `Ok(None)` when no drag was active.
    pub fn drop_at(
        &mut self,
        pointer: ScreenPoint,
        canvas_origin: ScreenPoint,
    ) -> SessionResult<Option<Note>> {
        match self.model.drop_at(pointer, canvas_origin) {
            Some(input) => self.send_move(input.id, &input).map(Some),
            None => Ok(None),
        }
    }

    /// Moves a note to `(x, y)`, clamped to the canvas.
    pub fn move_note(&mut self, id: NoteId, x: i64, y: i64) -> SessionResult<Note> {
        let input = self.model.move_note(id, x, y)?;
        self.send_move(id, &input)
    }

    fn send_move(&mut self, id: NoteId, input: &UpdateNotePositionInput) -> SessionResult<Note> {
        let result = self.gateway.update_note_position(input);
        let outcome = result.clone();
        self.model.finish_move(id, result);
        outcome.map_err(SessionError::Gateway)
    }
}
