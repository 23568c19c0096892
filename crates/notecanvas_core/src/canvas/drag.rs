//! Drag state machine and drop-coordinate transform.
//!
//! # Invariants
//! - At most one note is dragged at a time.
//! - Committed coordinates are never negative.
//! - The drop offset is fixed at half the default note size, independent of
//!   the dragged note's actual size.

use crate::model::note::{NoteId, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH};
use serde::{Deserialize, Serialize};

/// Horizontal distance from the cursor to a dropped note's left edge.
pub const DROP_OFFSET_X: i64 = DEFAULT_NOTE_WIDTH / 2;
/// Vertical distance from the cursor to a dropped note's top edge.
pub const DROP_OFFSET_Y: i64 = DEFAULT_NOTE_HEIGHT / 2;

/// Stacking level of the note being dragged.
pub const STACK_ELEVATED: u8 = 50;
/// Stacking level of every other note.
pub const STACK_RESTING: u8 = 10;

/// Point in screen pixels. Fractional values come from high-DPI pointers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drag gesture state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        note_id: NoteId,
    },
}

impl DragState {
    /// Id of the note being dragged, if any.
    pub fn dragged_note(&self) -> Option<NoteId> {
        match self {
            Self::Idle => None,
            Self::Dragging { note_id } => Some(*note_id),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}

/// Clamps a position so neither coordinate is negative.
pub fn clamp_position(x: i64, y: i64) -> (i64, i64) {
    (x.max(0), y.max(0))
}

/// Computes the committed top-left position for a drop.
///
/// The pointer is made canvas-relative, rounded to whole pixels, shifted so
/// the note is centered under the cursor, then clamped to the canvas.
pub fn drop_position(pointer: ScreenPoint, canvas_origin: ScreenPoint) -> (i64, i64) {
    let relative_x = (pointer.x - canvas_origin.x).round() as i64;
    let relative_y = (pointer.y - canvas_origin.y).round() as i64;
    clamp_position(
        relative_x.saturating_sub(DROP_OFFSET_X),
        relative_y.saturating_sub(DROP_OFFSET_Y),
    )
}
