//! In-process `NoteGateway` speaking the JSON wire contract.

use crate::dispatch::RpcDispatcher;
use crate::procedure::{DeleteResult, Procedure, RpcRequest, RpcResponse};
use notecanvas_core::{
    CreateNoteInput, DeleteNoteInput, GatewayError, GatewayResult, Note, NoteGateway, NoteId,
    UpdateNoteInput, UpdateNotePositionInput,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Gateway that serializes every call into a request envelope, dispatches
/// it, and decodes the serialized response.
#[derive(Clone)]
pub struct RpcGateway {
    dispatcher: RpcDispatcher,
}

impl RpcGateway {
    pub fn new(dispatcher: RpcDispatcher) -> Self {
        Self { dispatcher }
    }

    fn call<O: DeserializeOwned>(
        &self,
        procedure: Procedure,
        input: Option<Value>,
    ) -> GatewayResult<O> {
        let body = serde_json::to_vec(&RpcRequest::new(procedure, input))
            .map_err(|err| GatewayError::Transport(format!("failed to encode request: {err}")))?;
        let response = RpcResponse::from(self.dispatcher.dispatch_slice(&body));
        let wire = serde_json::to_vec(&response)
            .map_err(|err| GatewayError::Transport(format!("failed to encode response: {err}")))?;

        match serde_json::from_slice::<RpcResponse>(&wire) {
            Ok(RpcResponse::Result(result)) => serde_json::from_value(result).map_err(|err| {
                GatewayError::Transport(format!(
                    "unexpected `{}` result: {err}",
                    procedure.name()
                ))
            }),
            Ok(RpcResponse::Error(err)) => Err(GatewayError::Rejected {
                code: err.code.as_str().to_string(),
                message: err.message,
            }),
            Err(err) => Err(GatewayError::Transport(format!(
                "failed to decode response: {err}"
            ))),
        }
    }
}

fn input_of<I: Serialize>(input: &I) -> GatewayResult<Option<Value>> {
    serde_json::to_value(input)
        .map(Some)
        .map_err(|err| GatewayError::Transport(format!("failed to encode input: {err}")))
}

impl NoteGateway for RpcGateway {
    fn get_notes(&mut self) -> GatewayResult<Vec<Note>> {
        self.call(Procedure::GetNotes, None)
    }

    fn create_note(&mut self, input: &CreateNoteInput) -> GatewayResult<Note> {
        self.call(Procedure::CreateNote, input_of(input)?)
    }

    fn update_note(&mut self, input: &UpdateNoteInput) -> GatewayResult<Note> {
        self.call(Procedure::UpdateNote, input_of(input)?)
    }

    fn update_note_position(&mut self, input: &UpdateNotePositionInput) -> GatewayResult<Note> {
        self.call(Procedure::UpdateNotePosition, input_of(input)?)
    }

    fn delete_note(&mut self, id: NoteId) -> GatewayResult<()> {
        let input = input_of(&DeleteNoteInput { id })?;
        let result: DeleteResult = self.call(Procedure::DeleteNote, input)?;
        if result.success {
            Ok(())
        } else {
            Err(GatewayError::Transport(format!(
                "delete of note {id} was not acknowledged"
            )))
        }
    }
}
