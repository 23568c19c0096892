//! Client-side canvas interaction model.
//!
//! # Responsibility
//! - Translate drag gestures into absolute position-update intents.
//! - Keep a local note list that is updated optimistically and reconciled
//!   with canonical records returned by the remote interface.
//!
//! # Invariants
//! - Drops land at `(max(0, px - 150), max(0, py - 100))` in canvas space.
//! - Failed intents are logged; optimistic changes are not rolled back.

pub mod drag;
pub mod gateway;
pub mod model;
pub mod session;
