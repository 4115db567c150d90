//! Concrete implementations of the domain ports: parsing, annotation,
//! embedding and vector storage.

pub mod annotation;
pub mod embedding;
pub mod parsing;
pub mod vector_store;

pub use annotation::HeuristicAnnotationGenerator;
pub use embedding::{FastEmbedProvider, DEFAULT_MODEL_ID};
pub use parsing::TreeSitterParserOrchestrator;
pub use vector_store::EdgevecVectorStore;
