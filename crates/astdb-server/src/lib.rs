//! C10 Query Server: line-delimited JSON request/response protocol over a
//! pluggable transport, independent of the parse/annotate/embed pipeline.

pub mod auth;
pub mod concurrency;
pub mod handler;
pub mod protocol;
pub mod rate_limit;
pub mod server;
pub mod transport;

pub use handler::DefaultQueryHandler;
pub use server::{run, QueryServer};
