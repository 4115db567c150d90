//! Core domain records shared across every component.

mod annotation;
mod ast_node;
mod embedding;
mod file_state;
mod node_type;
mod position;
mod query;
mod significance;
mod snapshot;

pub use annotation::{Annotation, AnnotationQuality, DEFAULT_CONFIDENCE_THRESHOLD};
pub use ast_node::{compute_node_id, truncate_source_text, AstNode, NodeMetadata, SOURCE_TEXT_MAX_LEN};
pub use embedding::{EmbeddingVector, VectorMetadata};
pub use file_state::{FileState, FileStatus, StagesCompleted};
pub use node_type::NodeType;
pub use position::Position;
pub use query::{is_ordered_best_first, Query, QueryResult};
pub use significance::SignificanceLevel;
pub use snapshot::{RepositoryInfo, SnapshotMetadata, SnapshotSize};
