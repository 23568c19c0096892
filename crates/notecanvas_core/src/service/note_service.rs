//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/list/update/update-position/delete note APIs.
//! - Apply default values and title/content trimming before persistence.
//! - Translate request shapes into storage patches.
//!
//! # Invariants
//! - Validation happens before any write; a rejected request changes nothing.
//! - Only fields present in a request are written.
//! - Note list is always sorted by `updated_at DESC`.
//! - `delete_note` never reports `NotFound`.

use crate::model::note::{
    normalize_title, CreateNoteInput, Note, NoteDraft, NoteId, NotePatch, NoteValidationError,
    UpdateNoteInput, UpdateNotePositionInput,
};
use crate::repo::note_repo::{NoteRepository, RepoError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Request violates a field constraint.
    Validation(NoteValidationError),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note with id {id} not found"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NoteNotFound(_) => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note, applying defaults for omitted fields.
    ///
    /// # Errors
    /// - `Validation(EmptyTitle)` when the trimmed title is empty.
    pub fn create_note(&self, input: CreateNoteInput) -> NoteServiceResult<Note> {
        let draft = NoteDraft::from_input(input).inspect_err(|_| {
            warn!("event=note_create module=service status=rejected reason=empty_title");
        })?;
        let note = self.repo.insert_note(&draft)?;
        info!(
            "event=note_create module=service status=ok note_id={}",
            note.id
        );
        Ok(note)
    }

    /// Lists every note, most recently updated first.
    pub fn list_notes(&self) -> NoteServiceResult<Vec<Note>> {
        let notes = self.repo.list_notes()?;
        debug!(
            "event=note_list module=service status=ok count={}",
            notes.len()
        );
        Ok(notes)
    }

    /// Applies a partial field update.
    ///
    /// Omitted fields are untouched; `updated_at` is always refreshed.
    ///
    /// # Errors
    /// - `Validation(EmptyTitle)` when a supplied title trims to empty.
    /// - `NoteNotFound` when `input.id` does not exist.
    pub fn update_note(&self, input: UpdateNoteInput) -> NoteServiceResult<Note> {
        let title = match input.title.as_deref() {
            Some(raw) => Some(normalize_title(raw).inspect_err(|_| {
                warn!(
                    "event=note_update module=service status=rejected note_id={} reason=empty_title",
                    input.id
                );
            })?),
            None => None,
        };
        let patch = NotePatch {
            title,
            content: input.content,
            position_x: input.position_x,
            position_y: input.position_y,
            width: input.width,
            height: input.height,
        };
        self.apply_patch("note_update", input.id, &patch)
    }

    /// Moves (and optionally resizes) a note.
    ///
    /// Coordinates are the full resulting pair; dimensions change only when
    /// supplied.
    ///
    /// # Errors
    /// - `NoteNotFound` when `input.id` does not exist.
    pub fn update_note_position(&self, input: UpdateNotePositionInput) -> NoteServiceResult<Note> {
        let patch = NotePatch {
            position_x: Some(input.position_x),
            position_y: Some(input.position_y),
            width: input.width,
            height: input.height,
            ..NotePatch::default()
        };
        self.apply_patch("note_move", input.id, &patch)
    }

    /// Deletes a note. Succeeds whether or not the note exists.
    pub fn delete_note(&self, id: NoteId) -> NoteServiceResult<()> {
        self.repo.delete_note(id)?;
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(())
    }

    fn apply_patch(
        &self,
        event: &'static str,
        id: NoteId,
        patch: &NotePatch,
    ) -> NoteServiceResult<Note> {
        match self.repo.update_note(id, patch) {
            Ok(note) => {
                info!(
                    "event={event} module=service status=ok note_id={id} touch_only={}",
                    patch.is_empty()
                );
                Ok(note)
            }
            Err(RepoError::NotFound(missing)) => {
                warn!("event={event} module=service status=not_found note_id={missing}");
                Err(NoteServiceError::NoteNotFound(missing))
            }
            Err(err) => {
                warn!("event={event} module=service status=error note_id={id} error={err}");
                Err(err.into())
            }
        }
    }
}
