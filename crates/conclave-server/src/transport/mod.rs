//! Wire-level transport: JSON-RPC envelope plus the axum HTTP surface.

pub mod http;
pub mod jsonrpc;
