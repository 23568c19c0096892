//! Domain model for canvas notes.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep request shapes next to the record they produce.
//!
//! # Invariants
//! - Every note is identified by a storage-assigned `NoteId`.
//! - Deletion is a hard delete; ids are never recycled.

pub mod note;
