//! Remote interface for the note store.
//!
//! One procedure-style endpoint carries every note operation as a JSON
//! envelope. The dispatcher is transport-independent; `http` adapts it to
//! axum and `gateway` adapts it to the canvas `NoteGateway` seam.

pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod http;
pub mod procedure;

pub use dispatch::RpcDispatcher;
pub use error::{RpcError, RpcErrorCode};
pub use gateway::RpcGateway;
pub use http::{cors_layer, router, serve, status_for};
pub use procedure::{DeleteResult, HealthStatus, Procedure, RpcRequest, RpcResponse};
