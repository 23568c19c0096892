//! Transport-independent procedure dispatcher.
//!
//! # Responsibility
//! - Decode procedure input and reject malformed shapes as `invalid_input`
//!   before the note service runs.
//! - Run each call against the shared connection under one lock scope.
//! - Encode canonical records for the response envelope.
//!
//! # Invariants
//! - A rejected input never reaches storage.
//! - Calls are serialized on the single SQLite connection.

use crate::error::RpcError;
use crate::procedure::{DeleteResult, HealthStatus, Procedure, RpcRequest};
use log::{debug, info, warn};
use notecanvas_core::db::close_db;
use notecanvas_core::{
    CreateNoteInput, DeleteNoteInput, NoteService, NoteServiceResult, SqliteNoteRepository,
    UpdateNoteInput, UpdateNotePositionInput,
};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Routes procedure calls to the note service.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone)]
pub struct RpcDispatcher {
    conn: Arc<Mutex<Connection>>,
}

impl RpcDispatcher {
    /// Takes ownership of a migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Decodes a raw request body and dispatches it.
    pub fn dispatch_slice(&self, body: &[u8]) -> Result<Value, RpcError> {
        let request: RpcRequest = serde_json::from_slice(body).map_err(|err| {
            warn!("event=rpc_call module=rpc status=rejected error_code=invalid_input reason=malformed_envelope");
            RpcError::invalid_input(format!("malformed request body: {err}"))
        })?;
        self.dispatch(request)
    }

    /// Dispatches one decoded request.
    ///
    /// # Errors
    /// - `unknown_procedure` when the name is not served.
    /// - `invalid_input` when the input does not match the procedure shape.
    /// - `validation_failed`, `not_found`, `store_failure` from the service.
    pub fn dispatch(&self, request: RpcRequest) -> Result<Value, RpcError> {
        let Some(procedure) = Procedure::from_name(&request.procedure) else {
            warn!("event=rpc_call module=rpc status=rejected error_code=unknown_procedure");
            return Err(RpcError::unknown_procedure(&request.procedure));
        };

        let started_at = Instant::now();
        let outcome = self.run(procedure, request.input);
        let duration_ms = started_at.elapsed().as_millis();
        match &outcome {
            Ok(_) if procedure.is_mutation() => info!(
                "event=rpc_call module=rpc status=ok procedure={} duration_ms={duration_ms}",
                procedure.name()
            ),
            Ok(_) => debug!(
                "event=rpc_call module=rpc status=ok procedure={} duration_ms={duration_ms}",
                procedure.name()
            ),
            Err(err) => warn!(
                "event=rpc_call module=rpc status=error procedure={} error_code={} duration_ms={duration_ms}",
                procedure.name(),
                err.code
            ),
        }
        outcome
    }

    /// Closes the underlying connection.
    ///
    /// # Errors
    /// - `store_failure` when other clones are still alive or SQLite refuses
    ///   to close.
    pub fn close(self) -> Result<(), RpcError> {
        let mutex = Arc::try_unwrap(self.conn).map_err(|_| {
            RpcError::store_failure("connection is still shared by another dispatcher")
        })?;
        let conn = mutex
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        close_db(conn).map_err(|err| RpcError::store_failure(err.to_string()))
    }

    fn run(&self, procedure: Procedure, input: Option<Value>) -> Result<Value, RpcError> {
        match procedure {
            Procedure::Healthcheck => encode(&HealthStatus::ok()),
            Procedure::GetNotes => encode(&self.with_service(|service| service.list_notes())?),
            Procedure::CreateNote => {
                let input: CreateNoteInput = decode(procedure, input)?;
                encode(&self.with_service(|service| service.create_note(input))?)
            }
            Procedure::UpdateNote => {
                let input: UpdateNoteInput = decode(procedure, input)?;
                encode(&self.with_service(|service| service.update_note(input))?)
            }
            Procedure::UpdateNotePosition => {
                let input: UpdateNotePositionInput = decode(procedure, input)?;
                encode(&self.with_service(|service| service.update_note_position(input))?)
            }
            Procedure::DeleteNote => {
                let input: DeleteNoteInput = decode(procedure, input)?;
                self.with_service(|service| service.delete_note(input.id))?;
                encode(&DeleteResult { success: true })
            }
        }
    }

    fn with_service<T>(
        &self,
        f: impl FnOnce(&NoteService<SqliteNoteRepository<'_>>) -> NoteServiceResult<T>,
    ) -> Result<T, RpcError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| RpcError::store_failure("note store lock poisoned"))?;
        let repo = SqliteNoteRepository::try_new(&conn)?;
        let service = NoteService::new(repo);
        Ok(f(&service)?)
    }
}

fn decode<T: DeserializeOwned>(procedure: Procedure, input: Option<Value>) -> Result<T, RpcError> {
    serde_json::from_value(input.unwrap_or(Value::Null)).map_err(|err| {
        RpcError::invalid_input(format!("invalid input for `{}`: {err}", procedure.name()))
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value)
        .map_err(|err| RpcError::store_failure(format!("failed to encode result: {err}")))
}

#[cfg(test)]
mod tests {
    use super::RpcDispatcher;
    use crate::error::RpcErrorCode;
    use crate::procedure::RpcRequest;
    use notecanvas_core::db::open_db_in_memory;
    use serde_json::{json, Value};

    fn dispatcher() -> RpcDispatcher {
        RpcDispatcher::new(open_db_in_memory().unwrap())
    }

    fn call(dispatcher: &RpcDispatcher, procedure: &str, input: Value) -> Result<Value, RpcErrorCode> {
        let input = if input.is_null() { None } else { Some(input) };
        dispatcher
            .dispatch(RpcRequest {
                procedure: procedure.to_string(),
                input,
            })
            .map_err(|err| err.code)
    }

    #[test]
    fn healthcheck_reports_ok() {
        let result = call(&dispatcher(), "healthcheck", Value::Null).unwrap();
        assert_eq!(result["status"], "ok");
        assert!(result["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn create_returns_full_record() {
        let result = call(&dispatcher(), "createNote", json!({"title": "A"})).unwrap();
        assert_eq!(result["id"], 1);
        assert_eq!(result["title"], "A");
        assert_eq!(result["content"], "");
        assert_eq!(result["width"], 300);
        assert_eq!(result["height"], 200);
        assert_eq!(result["created_at"], result["updated_at"]);
    }

    #[test]
    fn shape_errors_are_invalid_input() {
        let dispatcher = dispatcher();
        for (procedure, input) in [
            ("createNote", Value::Null),
            ("createNote", json!({"content": "no title"})),
            ("createNote", json!({"title": 5})),
            ("updateNote", json!({"title": "missing id"})),
            ("updateNotePosition", json!({"id": 1, "position_x": 10})),
            ("updateNotePosition", json!({"id": 1, "position_x": "10", "position_y": 0})),
            ("deleteNote", json!({"id": "1"})),
        ] {
            assert_eq!(
                call(&dispatcher, procedure, input.clone()),
                Err(RpcErrorCode::InvalidInput),
                "{procedure} {input}"
            );
        }
        assert_eq!(call(&dispatcher, "getNotes", Value::Null).unwrap(), json!([]));
    }

    #[test]
    fn unknown_input_keys_are_ignored() {
        let dispatcher = dispatcher();
        let created = call(&dispatcher, "createNote", json!({"title": "A", "color": "red"})).unwrap();
        assert_eq!(created["title"], "A");
        assert!(created.get("color").is_none());

        let moved = call(
            &dispatcher,
            "updateNotePosition",
            json!({"id": 1, "position_x": 5, "position_y": 6, "z": 1}),
        )
        .unwrap();
        assert_eq!((moved["position_x"].as_i64(), moved["position_y"].as_i64()), (Some(5), Some(6)));
    }

    #[test]
    fn business_errors_keep_their_own_codes() {
        let dispatcher = dispatcher();
        assert_eq!(
            call(&dispatcher, "createNote", json!({"title": "   "})),
            Err(RpcErrorCode::ValidationFailed)
        );
        assert_eq!(
            call(&dispatcher, "updateNote", json!({"id": 3, "title": "x"})),
            Err(RpcErrorCode::NotFound)
        );
        assert_eq!(
            call(&dispatcher, "nope", Value::Null),
            Err(RpcErrorCode::UnknownProcedure)
        );
    }

    #[test]
    fn delete_always_reports_success() {
        let dispatcher = dispatcher();
        assert_eq!(
            call(&dispatcher, "deleteNote", json!({"id": 999})).unwrap(),
            json!({"success": true})
        );
    }

    #[test]
    fn malformed_body_is_invalid_input() {
        let err = dispatcher().dispatch_slice(b"{not json").unwrap_err();
        assert_eq!(err.code, RpcErrorCode::InvalidInput);
        let err = dispatcher().dispatch_slice(b"{\"input\": {}}").unwrap_err();
        assert_eq!(err.code, RpcErrorCode::InvalidInput);
    }

    #[test]
    fn close_requires_sole_owner() {
        let dispatcher = dispatcher();
        let clone = dispatcher.clone();
        let err = dispatcher.close().unwrap_err();
        assert_eq!(err.code, RpcErrorCode::StoreFailure);
        clone.close().unwrap();
    }
}
