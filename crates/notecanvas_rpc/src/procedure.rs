//! Wire envelope and procedure catalog.
//!
//! Requests are `{"procedure": "...", "input": ...}`; responses are either
//! `{"result": ...}` or `{"error": {"code": "...", "message": "..."}}`.

use crate::error::RpcError;
use notecanvas_core::model::note::now_epoch_ms;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound call envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcRequest {
    pub procedure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl RpcRequest {
    pub fn new(procedure: Procedure, input: Option<Value>) -> Self {
        Self {
            procedure: procedure.name().to_string(),
            input,
        }
    }
}

/// Outbound envelope; exactly one of `result` or `error` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcResponse {
    Result(Value),
    Error(RpcError),
}

impl From<Result<Value, RpcError>> for RpcResponse {
    fn from(value: Result<Value, RpcError>) -> Self {
        match value {
            Ok(result) => Self::Result(result),
            Err(err) => Self::Error(err),
        }
    }
}

/// Procedures served over the remote interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    Healthcheck,
    CreateNote,
    GetNotes,
    UpdateNote,
    DeleteNote,
    UpdateNotePosition,
}

impl Procedure {
    pub const ALL: [Procedure; 6] = [
        Procedure::Healthcheck,
        Procedure::CreateNote,
        Procedure::GetNotes,
        Procedure::UpdateNote,
        Procedure::DeleteNote,
        Procedure::UpdateNotePosition,
    ];

    /// Wire name of the procedure.
    pub fn name(self) -> &'static str {
        match self {
            Self::Healthcheck => "healthcheck",
            Self::CreateNote => "createNote",
            Self::GetNotes => "getNotes",
            Self::UpdateNote => "updateNote",
            Self::DeleteNote => "deleteNote",
            Self::UpdateNotePosition => "updateNotePosition",
        }
    }

    /// Resolves a wire name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|procedure| procedure.name() == name)
    }

    /// Whether the procedure changes stored notes.
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::Healthcheck | Self::GetNotes)
    }
}

/// `healthcheck` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// Server wall clock in Unix epoch milliseconds.
    pub timestamp: i64,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: now_epoch_ms(),
        }
    }
}

/// `deleteNote` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub success: bool,
}
