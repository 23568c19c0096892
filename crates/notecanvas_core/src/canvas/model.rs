//! Local canvas state: note list, drag/edit modes and reconciliation.
//!
//! # Responsibility
//! - Turn user gestures into intents (request shapes) for the gateway.
//! - Apply optimistic changes and reconcile with canonical server records.
//!
//! # Invariants
//! - A note being edited cannot be dragged, and nothing can be edited while
//!   a drag is active.
//! - Drop coordinates are clamped before the intent leaves this module.
//! - Failed intents are logged and never rolled back.
//!
//! Every intent is a `begin_*`/`finish_*` pair so asynchronous callers can
//! keep other gestures responsive while one call is in flight.

use super::drag::{
    clamp_position, drop_position, DragState, ScreenPoint, STACK_ELEVATED, STACK_RESTING,
};
use super::gateway::GatewayResult;
use crate::model::note::{
    normalize_title, CreateNoteInput, Note, NoteId, NoteValidationError, UpdateNoteInput,
    UpdateNotePositionInput, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH,
};
use log::{debug, warn};
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Gesture refused by the local model before any intent is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    UnknownNote(NoteId),
    /// The note is in text-edit mode.
    EditInProgress(NoteId),
    /// Another drag is active.
    DragInProgress(NoteId),
    /// A create or save call for this affordance is still pending.
    SubmitPending,
    NotEditing,
    Invalid(NoteValidationError),
}

impl Display for CanvasError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNote(id) => write!(f, "note {id} is not on the canvas"),
            Self::EditInProgress(id) => write!(f, "note {id} is being edited"),
            Self::DragInProgress(id) => write!(f, "note {id} is being dragged"),
            Self::SubmitPending => write!(f, "a submit is already pending"),
            Self::NotEditing => write!(f, "no note is being edited"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CanvasError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for CanvasError {
    fn from(value: NoteValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Upper bound (exclusive) of the random initial position on each axis.
pub const FORM_SCATTER_RANGE: i64 = 200;

/// New-note form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteForm {
    pub title: String,
    pub content: String,
    pub position_x: i64,
    pub position_y: i64,
    pub width: i64,
    pub height: i64,
}

impl Default for NoteForm {
    fn default() -> Self {
        Self::scattered(&mut rand::thread_rng())
    }
}

impl NoteForm {
    /// Empty form placed at a random point in `[0, FORM_SCATTER_RANGE)` on
    /// both axes, so successive new notes do not stack exactly.
    pub fn scattered<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::at(
            rng.gen_range(0..FORM_SCATTER_RANGE),
            rng.gen_range(0..FORM_SCATTER_RANGE),
        )
    }

    /// Empty form whose note will be placed at `(x, y)`.
    pub fn at(x: i64, y: i64) -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            position_x: x,
            position_y: y,
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
        }
    }

    /// Trims the text fields and builds the create request.
    pub fn to_input(&self) -> Result<CreateNoteInput, NoteValidationError> {
        Ok(CreateNoteInput {
            title: normalize_title(&self.title)?,
            content: Some(self.content.trim().to_string()),
            position_x: Some(self.position_x),
            position_y: Some(self.position_y),
            width: Some(self.width),
            height: Some(self.height),
        })
    }
}

/// In-place text edit of one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub note_id: NoteId,
    pub title: String,
    pub content: String,
    saving: bool,
}

impl EditSession {
    pub fn is_saving(&self) -> bool {
        self.saving
    }
}

/// Local view of the canvas.
#[derive(Debug, Clone, Default)]
pub struct CanvasModel {
    notes: Vec<Note>,
    drag: DragState,
    edit: Option<EditSession>,
    create_pending: bool,
}

impl CanvasModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes in display order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Replaces the local list with a freshly loaded one.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        if let Some(id) = self.drag.dragged_note() {
            if self.note(id).is_none() {
                self.drag = DragState::Idle;
            }
        }
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Whether the create affordance is disabled by an in-flight call.
    pub fn is_create_pending(&self) -> bool {
        self.create_pending
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    /// Mutable access to the edit fields while editing.
    pub fn edit_session_mut(&mut self) -> Option<&mut EditSession> {
        self.edit.as_mut()
    }

    /// Stacking level for rendering; the dragged note sits above the rest.
    pub fn stacking_level(&self, id: NoteId) -> u8 {
        if self.drag.dragged_note() == Some(id) {
            STACK_ELEVATED
        } else {
            STACK_RESTING
        }
    }

    /// Whether the canvas should show its drop affordance.
    pub fn shows_drop_affordance(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Idle → Dragging.
    pub fn drag_start(&mut self, id: NoteId) -> Result<(), CanvasError> {
        if self.note(id).is_none() {
            return Err(CanvasError::UnknownNote(id));
        }
        if let Some(dragged) = self.drag.dragged_note() {
            return Err(CanvasError::DragInProgress(dragged));
        }
        if let Some(edit) = self.edit.as_ref() {
            if edit.note_id == id {
                return Err(CanvasError::EditInProgress(id));
            }
        }
        self.drag = DragState::Dragging { note_id: id };
        debug!("event=canvas_drag module=canvas status=start note_id={id}");
        Ok(())
    }

    /// Dragging → Idle without committing anything.
    pub fn drag_end(&mut self) {
        if let Some(id) = self.drag.dragged_note() {
            debug!("event=canvas_drag module=canvas status=cancelled note_id={id}");
        }
        self.drag = DragState::Idle;
    }

    /// Dragging → Idle, committing the drop position.
    ///
    /// Returns `None` when no drag is active. Otherwise the local note is
    /// moved immediately and the position intent is returned.
    pub fn drop_at(
        &mut self,
        pointer: ScreenPoint,
        canvas_origin: ScreenPoint,
    ) -> Option<UpdateNotePositionInput> {
        let id = self.drag.dragged_note()?;
        self.drag = DragState::Idle;
        let (x, y) = drop_position(pointer, canvas_origin);
        debug!("event=canvas_drag module=canvas status=drop note_id={id} x={x} y={y}");
        self.move_note(id, x, y).ok()
    }

    /// Moves a note optimistically and returns the position intent.
    ///
    /// Coordinates are clamped to the canvas before they are applied.
    pub fn move_note(
        &mut self,
        id: NoteId,
        x: i64,
        y: i64,
    ) -> Result<UpdateNotePositionInput, CanvasError> {
        let (x, y) = clamp_position(x, y);
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or(CanvasError::UnknownNote(id))?;
        note.position_x = x;
        note.position_y = y;
        Ok(UpdateNotePositionInput {
            id,
            position_x: x,
            position_y: y,
            width: None,
            height: None,
        })
    }

    /// Reconciles a position intent outcome. Failures keep the optimistic
    /// position.
    pub fn finish_move(&mut self, id: NoteId, result: GatewayResult<Note>) {
        match result {
            Ok(note) => self.apply_server_note(note),
            Err(err) => warn!(
                "event=canvas_move module=canvas status=error note_id={id} error={err}"
            ),
        }
    }

    /// Validates the form and marks the create affordance pending.
    pub fn begin_create(&mut self, form: &NoteForm) -> Result<CreateNoteInput, CanvasError> {
        if self.create_pending {
            return Err(CanvasError::SubmitPending);
        }
        let input = form.to_input()?;
        self.create_pending = true;
        Ok(input)
    }

    /// Appends the created note, or logs the failure.
    ///
    /// Returns whether the create succeeded so the caller can reset its form.
    pub fn finish_create(&mut self, result: GatewayResult<Note>) -> bool {
        self.create_pending = false;
        match result {
            Ok(note) => {
                self.notes.push(note);
                true
            }
            Err(err) => {
                warn!("event=canvas_create module=canvas status=error error={err}");
                false
            }
        }
    }

    /// Enters text-edit mode for a note, seeding the fields from it.
    pub fn begin_edit(&mut self, id: NoteId) -> Result<(), CanvasError> {
        if let Some(dragged) = self.drag.dragged_note() {
            return Err(CanvasError::DragInProgress(dragged));
        }
        let note = self.note(id).ok_or(CanvasError::UnknownNote(id))?;
        self.edit = Some(EditSession {
            note_id: id,
            title: note.title.clone(),
            content: note.content.clone(),
            saving: false,
        });
        Ok(())
    }

    /// Leaves edit mode, discarding unsaved text.
    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Builds the update intent from the edit fields.
    ///
    /// Title and content are trimmed; an empty title keeps the session open.
    pub fn begin_save_edit(&mut self) -> Result<UpdateNoteInput, CanvasError> {
        let edit = self.edit.as_mut().ok_or(CanvasError::NotEditing)?;
        if edit.saving {
            return Err(CanvasError::SubmitPending);
        }
        let title = normalize_title(&edit.title)?;
        edit.saving = true;
        Ok(UpdateNoteInput {
            id: edit.note_id,
            title: Some(title),
            content: Some(edit.content.trim().to_string()),
            ..UpdateNoteInput::default()
        })
    }

    /// Closes the session on success; stays in edit mode on failure.
    pub fn finish_save_edit(&mut self, result: GatewayResult<Note>) {
        match result {
            Ok(note) => {
                self.edit = None;
                self.apply_server_note(note);
            }
            Err(err) => {
                if let Some(edit) = self.edit.as_mut() {
                    edit.saving = false;
                    warn!(
                        "event=canvas_edit module=canvas status=error note_id={} error={err}",
                        edit.note_id
                    );
                }
            }
        }
    }

    /// Removes a note locally once the delete call succeeded.
    pub fn finish_delete(&mut self, id: NoteId, result: GatewayResult<()>) {
        match result {
            Ok(()) => {
                self.notes.retain(|note| note.id != id);
                if self.edit.as_ref().is_some_and(|edit| edit.note_id == id) {
                    self.edit = None;
                }
                if self.drag.dragged_note() == Some(id) {
                    self.drag = DragState::Idle;
                }
            }
            Err(err) => {
                warn!("event=canvas_delete module=canvas status=error note_id={id} error={err}")
            }
        }
    }

    /// Replaces the local copy of a note with the canonical record.
    ///
    /// Records for notes no longer on the canvas are ignored.
    pub fn apply_server_note(&mut self, note: Note) {
        if let Some(slot) = self.notes.iter_mut().find(|local| local.id == note.id) {
            *slot = note;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CanvasError, CanvasModel, NoteForm, FORM_SCATTER_RANGE};
    use crate::canvas::drag::{DragState, ScreenPoint, STACK_ELEVATED, STACK_RESTING};
    use crate::canvas::gateway::GatewayError;
    use crate::model::note::{Note, NoteValidationError};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn note(id: i64, x: i64, y: i64) -> Note {
        Note {
            id,
            title: format!("note {id}"),
            content: String::new(),
            position_x: x,
            position_y: y,
            width: 300,
            height: 200,
            created_at: 1,
            updated_at: 1,
        }
    }

    fn canvas_with(notes: Vec<Note>) -> CanvasModel {
        let mut model = CanvasModel::new();
        model.replace_all(notes);
        model
    }

    fn rejected() -> GatewayError {
        GatewayError::Transport("connection refused".to_string())
    }

    #[test]
    fn drop_moves_note_optimistically_and_returns_to_idle() {
        let mut model = canvas_with(vec![note(1, 0, 0), note(2, 5, 5)]);
        model.drag_start(1).unwrap();
        assert_eq!(model.stacking_level(1), STACK_ELEVATED);
        assert_eq!(model.stacking_level(2), STACK_RESTING);
        assert!(model.shows_drop_affordance());

        let intent = model
            .drop_at(ScreenPoint::new(410.0, 320.0), ScreenPoint::new(10.0, 20.0))
            .unwrap();
        assert_eq!((intent.id, intent.position_x, intent.position_y), (1, 250, 200));
        assert_eq!(intent.width, None);
        assert_eq!(model.note(1).unwrap().position_x, 250);
        assert_eq!(model.drag_state(), DragState::Idle);
        assert!(!model.shows_drop_affordance());
    }

    #[test]
    fn drag_end_commits_nothing() {
        let mut model = canvas_with(vec![note(1, 30, 40)]);
        model.drag_start(1).unwrap();
        model.drag_end();
        assert_eq!(model.drag_state(), DragState::Idle);
        assert!(model
            .drop_at(ScreenPoint::new(500.0, 500.0), ScreenPoint::default())
            .is_none());
        assert_eq!(model.note(1).unwrap().position_x, 30);
    }

    #[test]
    fn move_note_clamps_before_issuing_intent() {
        let mut model = canvas_with(vec![note(1, 0, 0)]);
        let intent = model.move_note(1, -50, 10).unwrap();
        assert_eq!((intent.position_x, intent.position_y), (0, 10));
        assert_eq!(model.note(1).unwrap().position_y, 10);
    }

    #[test]
    fn failed_move_keeps_optimistic_position() {
        let mut model = canvas_with(vec![note(1, 0, 0)]);
        model.move_note(1, 80, 90).unwrap();
        model.finish_move(1, Err(rejected()));
        let local = model.note(1).unwrap();
        assert_eq!((local.position_x, local.position_y), (80, 90));
    }

    #[test]
    fn editing_and_dragging_exclude_each_other() {
        let mut model = canvas_with(vec![note(1, 0, 0), note(2, 0, 0)]);
        model.begin_edit(1).unwrap();
        assert_eq!(model.drag_start(1), Err(CanvasError::EditInProgress(1)));

        model.cancel_edit();
        model.drag_start(2).unwrap();
        assert_eq!(model.begin_edit(1), Err(CanvasError::DragInProgress(2)));
        assert_eq!(model.drag_start(1), Err(CanvasError::DragInProgress(2)));
    }

    #[test]
    fn create_form_is_trimmed_and_blocks_double_submit() {
        let mut model = CanvasModel::new();
        let mut form = NoteForm::at(12, 34);
        form.title = "  Title ".to_string();
        form.content = " body ".to_string();

        let input = model.begin_create(&form).unwrap();
        assert_eq!(input.title, "Title");
        assert_eq!(input.content.as_deref(), Some("body"));
        assert_eq!((input.position_x, input.position_y), (Some(12), Some(34)));
        assert!(model.is_create_pending());
        assert_eq!(model.begin_create(&form), Err(CanvasError::SubmitPending));

        let mut created = note(9, 12, 34);
        created.title = "Title".to_string();
        assert!(model.finish_create(Ok(created)));
        assert!(!model.is_create_pending());
        assert_eq!(model.notes().len(), 1);
    }

    #[test]
    fn default_form_scatters_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let forms: Vec<NoteForm> = (0..64).map(|_| NoteForm::scattered(&mut rng)).collect();
        for form in &forms {
            assert!((0..FORM_SCATTER_RANGE).contains(&form.position_x));
            assert!((0..FORM_SCATTER_RANGE).contains(&form.position_y));
            assert_eq!((form.width, form.height), (300, 200));
            assert!(form.title.is_empty());
        }
        assert!(forms.iter().any(|form| form != &forms[0]));

        let form = NoteForm::default();
        assert!((0..FORM_SCATTER_RANGE).contains(&form.position_x));
        assert!((0..FORM_SCATTER_RANGE).contains(&form.position_y));
    }

    #[test]
    fn create_form_rejects_blank_title() {
        let mut model = CanvasModel::new();
        let err = model.begin_create(&NoteForm::default()).unwrap_err();
        assert_eq!(err, CanvasError::Invalid(NoteValidationError::EmptyTitle));
        assert!(!model.is_create_pending());
    }

    #[test]
    fn failed_save_stays_in_edit_mode() {
        let mut model = canvas_with(vec![note(1, 0, 0)]);
        model.begin_edit(1).unwrap();
        model.edit_session_mut().unwrap().title = " renamed ".to_string();

        let intent = model.begin_save_edit().unwrap();
        assert_eq!(intent.title.as_deref(), Some("renamed"));
        assert!(model.edit_session().unwrap().is_saving());

        model.finish_save_edit(Err(rejected()));
        let session = model.edit_session().unwrap();
        assert!(!session.is_saving());
        assert_eq!(model.note(1).unwrap().title, "note 1");
    }

    #[test]
    fn successful_save_replaces_note_and_closes_session() {
        let mut model = canvas_with(vec![note(1, 0, 0)]);
        model.begin_edit(1).unwrap();
        model.edit_session_mut().unwrap().title = "renamed".to_string();
        model.begin_save_edit().unwrap();

        let mut server = note(1, 0, 0);
        server.title = "renamed".to_string();
        server.updated_at = 2;
        model.finish_save_edit(Ok(server));
        assert!(model.edit_session().is_none());
        assert_eq!(model.note(1).unwrap().updated_at, 2);
    }

    #[test]
    fn delete_removes_only_on_success() {
        let mut model = canvas_with(vec![note(1, 0, 0), note(2, 0, 0)]);
        model.finish_delete(1, Err(rejected()));
        assert_eq!(model.notes().len(), 2);
        model.finish_delete(1, Ok(()));
        assert!(model.note(1).is_none());
        assert_eq!(model.notes().len(), 1);
    }
}
