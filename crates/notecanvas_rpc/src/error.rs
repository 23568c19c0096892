//! Wire error model.

use notecanvas_core::{NoteServiceError, RepoError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Machine-readable error category carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcErrorCode {
    /// Body or input does not have the expected shape.
    InvalidInput,
    UnknownProcedure,
    NotFound,
    /// Input is well-formed but breaks a business rule.
    ValidationFailed,
    StoreFailure,
}

impl RpcErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::UnknownProcedure => "unknown_procedure",
            Self::NotFound => "not_found",
            Self::ValidationFailed => "validation_failed",
            Self::StoreFailure => "store_failure",
        }
    }
}

impl Display for RpcErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned to remote callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidInput, message)
    }

    pub fn unknown_procedure(name: &str) -> Self {
        Self::new(
            RpcErrorCode::UnknownProcedure,
            format!("unknown procedure `{name}`"),
        )
    }

    pub fn store_failure(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::StoreFailure, message)
    }
}

impl Display for RpcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl Error for RpcError {}

impl From<NoteServiceError> for RpcError {
    fn from(value: NoteServiceError) -> Self {
        let code = match &value {
            NoteServiceError::Validation(_) => RpcErrorCode::ValidationFailed,
            NoteServiceError::NoteNotFound(_) => RpcErrorCode::NotFound,
            NoteServiceError::Repo(_) => RpcErrorCode::StoreFailure,
        };
        Self::new(code, value.to_string())
    }
}

impl From<RepoError> for RpcError {
    fn from(value: RepoError) -> Self {
        NoteServiceError::from(value).into()
    }
}
