//! Transport framing over [`crate::server::QueryServer`]: newline-delimited
//! JSON on stdio, or a single HTTP endpoint (spec §6 `MCP_SERVER_TRANSPORT_TYPE`).

pub mod http;
pub mod stdio;
pub mod websocket;
