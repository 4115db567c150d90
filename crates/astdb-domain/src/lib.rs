//! # Domain Layer
//!
//! Core types, ports and error taxonomy for the AST-aware semantic code
//! index. Contains only domain entities and the trait boundaries other
//! crates implement; no I/O, no async runtime wiring.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Core records: positions, node types, ASTNode, annotations, embeddings, file/snapshot state, queries |
//! | [`value_objects`] | Small tagged-union configuration types |
//! | [`ports`] | Trait boundaries for parsing, annotation, embedding, vector storage, watch state, snapshots and the query server |
//! | [`error`] | Closed error-kind taxonomy |
//! | [`retry`] | Retry-with-backoff, circuit breaker, bounded-concurrency error collection |

pub mod error;
pub mod model;
pub mod ports;
pub mod retry;
pub mod value_objects;

pub use error::{Error, ErrorKind, Result};
