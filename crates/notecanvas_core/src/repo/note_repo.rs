//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/list/patch/delete persistence APIs over the `notes` table.
//! - Own timestamp bookkeeping (`created_at`, `updated_at`).
//!
//! # Invariants
//! - Inserts persist a fully-defaulted `NoteDraft`; no column defaults apply.
//! - Patches touch only supplied columns and always advance `updated_at`.
//! - `updated_at` advances strictly, even within the same millisecond.
//! - Deletes are idempotent.

use crate::db::DbError;
use crate::model::note::{now_epoch_ms, Note, NoteDraft, NoteId, NotePatch};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    position_x,
    position_y,
    width,
    height,
    created_at,
    updated_at
FROM notes";

const NOTE_COLUMNS: [&str; 9] = [
    "id",
    "title",
    "content",
    "position_x",
    "position_y",
    "width",
    "height",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Inserts a new note and returns the stored record.
    fn insert_note(&self, draft: &NoteDraft) -> RepoResult<Note>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists all notes, most recently updated first.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Applies a partial update and returns the stored record.
    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<Note>;
    /// Removes one note. Absent ids are not an error.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
#[derive(Debug)]
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema is
    ///   not the one produced by migrations.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, draft: &NoteDraft) -> RepoResult<Note> {
        let now = now_epoch_ms();
        self.conn.execute(
            "INSERT INTO notes (
                title,
                content,
                position_x,
                position_y,
                width,
                height,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
            params![
                draft.title.as_str(),
                draft.content.as_str(),
                draft.position_x,
                draft.position_y,
                draft.width,
                draft.height,
                now,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_note(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted note {id} not found in read-back"))
        })
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let note = stmt
            .query_row([id], |row| Ok(read_note_row(row)))
            .optional()?;
        note.transpose()
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} ORDER BY updated_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(read_note_row(row)?);
        }
        Ok(notes)
    }

    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<Note> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        for (column, value) in [
            ("position_x = ?", patch.position_x),
            ("position_y = ?", patch.position_y),
            ("width = ?", patch.width),
            ("height = ?", patch.height),
        ] {
            if let Some(value) = value {
                assignments.push(column);
                bind_values.push(Value::Integer(value));
            }
        }

        assignments.push("updated_at = MAX(?, updated_at + 1)");
        bind_values.push(Value::Integer(now_epoch_ms()));
        bind_values.push(Value::Integer(id));

        let sql = format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", "));

        // Write and read-back share one transaction.
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        let updated = {
            let mut stmt = tx.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
            stmt.query_row([id], |row| Ok(read_note_row(row)))??
        };
        tx.commit()?;

        Ok(updated)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(())
    }
}

fn read_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let note = Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        position_x: row.get("position_x")?,
        position_y: row.get("position_y")?,
        width: row.get("width")?,
        height: row.get("height")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    note.validate()
        .map_err(|err| RepoError::InvalidData(format!("note {}: {err}", note.id)))?;
    Ok(note)
}

fn ensure_note_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }

    for column in NOTE_COLUMNS {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
