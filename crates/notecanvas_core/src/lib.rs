//! Core domain logic for NoteCanvas.
//! This crate is the single source of truth for note invariants and the
//! canvas interaction rules.

pub mod canvas;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use canvas::drag::{clamp_position, drop_position, DragState, ScreenPoint};
pub use canvas::gateway::{GatewayError, GatewayResult, NoteGateway};
pub use canvas::model::{CanvasError, CanvasModel, EditSession, NoteForm};
pub use canvas::session::{CanvasSession, SessionError, SessionResult};
pub use db::{close_db, open_db, open_db_in_memory, DbError, DbResult, DbTarget};
pub use logging::{init_logging, LogConfig, LogLevel, LoggingError};
pub use model::note::{
    CreateNoteInput, DeleteNoteInput, Note, NoteDraft, NoteId, NotePatch, NoteValidationError,
    UpdateNoteInput, UpdateNotePositionInput, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH,
};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::note_service::{NoteService, NoteServiceError, NoteServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
