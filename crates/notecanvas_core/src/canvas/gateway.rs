//! Client-side view of the remote note interface.
//!
//! # Responsibility
//! - Describe the intents the canvas issues, independent of transport.
//! - Carry remote failures back without interpreting them.

use crate::model::note::{
    CreateNoteInput, Note, NoteId, UpdateNoteInput, UpdateNotePositionInput,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The remote side answered with a structured error.
    Rejected { code: String, message: String },
    /// The call did not produce a usable answer.
    Transport(String),
}

impl GatewayError {
    /// Machine-readable code for `Rejected`, `None` for transport failures.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code.as_str()),
            Self::Transport(_) => None,
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { code, message } => write!(f, "{code}: {message}"),
            Self::Transport(message) => write!(f, "transport failure: {message}"),
        }
    }
}

impl Error for GatewayError {}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Remote note operations as seen by the canvas.
pub trait NoteGateway {
    fn get_notes(&mut self) -> GatewayResult<Vec<Note>>;
    fn create_note(&mut self, input: &CreateNoteInput) -> GatewayResult<Note>;
    fn update_note(&mut self, input: &UpdateNoteInput) -> GatewayResult<Note>;
    fn update_note_position(&mut self, input: &UpdateNotePositionInput) -> GatewayResult<Note>;
    fn delete_note(&mut self, id: NoteId) -> GatewayResult<()>;
}
