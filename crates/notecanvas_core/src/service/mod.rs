//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep RPC/UI layers decoupled from storage details.

pub mod note_service;
