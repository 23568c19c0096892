//! axum transport over `RpcDispatcher`.
//!
//! # Responsibility
//! - Serve `POST /rpc` and the `GET /rpc/healthcheck` probe.
//! - Map wire error codes to HTTP statuses.
//! - Apply the configured CORS policy.
//!
//! # Invariants
//! - Storage work runs on the blocking pool, never on the async workers.

use crate::dispatch::RpcDispatcher;
use crate::error::{RpcError, RpcErrorCode};
use crate::procedure::{Procedure, RpcRequest, RpcResponse};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{self, HeaderValue, InvalidHeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use serde_json::Value;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// HTTP status for a wire error code.
pub fn status_for(code: RpcErrorCode) -> StatusCode {
    match code {
        RpcErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
        RpcErrorCode::UnknownProcedure | RpcErrorCode::NotFound => StatusCode::NOT_FOUND,
        RpcErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        RpcErrorCode::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for RpcResponse {
    fn into_response(self) -> Response {
        let status = match &self {
            RpcResponse::Result(_) => StatusCode::OK,
            RpcResponse::Error(err) => status_for(err.code),
        };
        (status, Json(self)).into_response()
    }
}

/// Builds the CORS policy.
///
/// An empty origin list allows any origin.
///
/// # Errors
/// - Returns the parse error of the first origin that is not a valid header
///   value.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, InvalidHeaderValue> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let values = origins
            .iter()
            .map(|origin| HeaderValue::from_str(origin.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Builds the router serving the remote interface.
pub fn router(dispatcher: RpcDispatcher, cors: CorsLayer) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/rpc/healthcheck", get(healthcheck_handler))
        .layer(cors)
        .with_state(dispatcher)
}

/// Serves the remote interface on `listener` until `shutdown` resolves.
///
/// # Errors
/// - Returns I/O errors from the accept loop.
pub async fn serve(
    listener: TcpListener,
    dispatcher: RpcDispatcher,
    cors: CorsLayer,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("event=rpc_serve module=rpc status=start addr={addr}");

    let app = router(dispatcher, cors);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    match &result {
        Ok(()) => info!("event=rpc_serve module=rpc status=stopped addr={addr}"),
        Err(err) => error!("event=rpc_serve module=rpc status=error addr={addr} error={err}"),
    }
    result
}

async fn rpc_handler(State(dispatcher): State<RpcDispatcher>, body: Bytes) -> RpcResponse {
    run_blocking(move || dispatcher.dispatch_slice(&body))
        .await
        .into()
}

async fn healthcheck_handler(State(dispatcher): State<RpcDispatcher>) -> RpcResponse {
    run_blocking(move || dispatcher.dispatch(RpcRequest::new(Procedure::Healthcheck, None)))
        .await
        .into()
}

async fn run_blocking(
    call: impl FnOnce() -> Result<Value, RpcError> + Send + 'static,
) -> Result<Value, RpcError> {
    match tokio::task::spawn_blocking(call).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("event=rpc_call module=rpc status=error error_code=worker_failed error={err}");
            Err(RpcError::store_failure("request worker failed"))
        }
    }
}
