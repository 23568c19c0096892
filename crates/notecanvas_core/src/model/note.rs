//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical `Note` record and its request shapes.
//! - Own default values and title normalization rules.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused.
//! - `title` is non-empty after trimming for every persisted note.
//! - `updated_at >= created_at`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Stable identifier assigned by storage on insert.
pub type NoteId = i64;

/// Default note width in canvas pixels.
pub const DEFAULT_NOTE_WIDTH: i64 = 300;
/// Default note height in canvas pixels.
pub const DEFAULT_NOTE_HEIGHT: i64 = 200;

/// Canonical persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Top-left x coordinate on the canvas.
    pub position_x: i64,
    /// Top-left y coordinate on the canvas.
    pub position_y: i64,
    pub width: i64,
    pub height: i64,
    /// Unix epoch milliseconds. Set once on insert.
    pub created_at: i64,
    /// Unix epoch milliseconds. Refreshed by every successful mutation.
    pub updated_at: i64,
}

impl Note {
    /// Validates invariants that must hold for any persisted note.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// Validation error for note field constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Persisted timestamps are out of order.
    UpdatedBeforeCreated { created_at: i64, updated_at: i64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// Trims a title and rejects empty results.
pub fn normalize_title(raw: &str) -> Result<String, NoteValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Input for `createNote`. Every field but `title` is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteInput {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

impl CreateNoteInput {
    /// Creates an input carrying only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Input for `updateNote`. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteInput {
    pub id: NoteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

/// Input for `updateNotePosition`, the drag fast-path.
///
/// Coordinates are absolute, never deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNotePositionInput {
    pub id: NoteId,
    pub position_x: i64,
    pub position_y: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
}

/// Input for `deleteNote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteNoteInput {
    pub id: NoteId,
}

/// Fully-defaulted field set handed to storage on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub position_x: i64,
    pub position_y: i64,
    pub width: i64,
    pub height: i64,
}

impl NoteDraft {
    /// Builds a draft with default content, position and size.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            position_x: 0,
            position_y: 0,
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
        }
    }

    /// Applies defaults and trimming to a create request.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is empty after trimming.
    pub fn from_input(input: CreateNoteInput) -> Result<Self, NoteValidationError> {
        let title = normalize_title(&input.title)?;
        Ok(Self {
            title,
            content: input
                .content
                .map(|content| content.trim().to_string())
                .unwrap_or_default(),
            position_x: input.position_x.unwrap_or(0),
            position_y: input.position_y.unwrap_or(0),
            width: input.width.unwrap_or(DEFAULT_NOTE_WIDTH),
            height: input.height.unwrap_or(DEFAULT_NOTE_HEIGHT),
        })
    }
}

/// Partial update where every field is independently optional.
///
/// `None` means "leave unchanged"; there is no way to clear a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl NotePatch {
    /// Returns whether no field is set. An empty patch still refreshes
    /// `updated_at` when applied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.position_x.is_none()
            && self.position_y.is_none()
            && self.width.is_none()
            && self.height.is_none()
    }

    /// Applies the patch to an in-memory note copy.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = self.title.as_ref() {
            note.title = title.clone();
        }
        if let Some(content) = self.content.as_ref() {
            note.content = content.clone();
        }
        if let Some(x) = self.position_x {
            note.position_x = x;
        }
        if let Some(y) = self.position_y {
            note.position_y = y;
        }
        if let Some(width) = self.width {
            note.width = width;
        }
        if let Some(height) = self.height {
            note.height = height;
        }
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Clocks set before the epoch report `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
