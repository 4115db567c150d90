//! Error taxonomy
//!
//! A closed set of error kinds as required by spec §4.C2. Every variant
//! carries a human message, a structured context map and a sequence of
//! user-directed suggestions, and maps to exactly one [`ErrorKind`].

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The closed taxonomy of error kinds from spec §4.C2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid or missing configuration.
    Configuration,
    /// Git/VCS operation failure.
    Git,
    /// Glob pattern compilation/matching failure.
    Glob,
    /// Path resolution failure (outside workspace, non-UTF8, ...).
    Path,
    /// Filesystem I/O failure.
    Filesystem,
    /// Input validation failure.
    Validation,
    /// Parser backend failure.
    Parser,
    /// Embedding provider failure.
    Embedding,
    /// Vector store failure.
    VectorStore,
    /// Query protocol failure.
    Protocol,
    /// Operation exceeded its deadline.
    Timeout,
}

impl ErrorKind {
    /// Stable lowercase name, used in wire-protocol error codes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Git => "git",
            Self::Glob => "glob",
            Self::Path => "path",
            Self::Filesystem => "filesystem",
            Self::Validation => "validation",
            Self::Parser => "parser",
            Self::Embedding => "embedding",
            Self::VectorStore => "vectorStore",
            Self::Protocol => "protocol",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured key/value context attached to an error.
pub type ErrorContext = BTreeMap<String, String>;

/// The main error type for the indexing/query pipeline.
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    /// Which closed-taxonomy kind this error belongs to.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Structured context for programmatic handling.
    pub context: ErrorContext,
    /// User-directed suggestions for resolving the error.
    pub suggestions: Vec<String>,
    /// Underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Start building an error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: ErrorContext::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Attach a context key/value pair.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach a user-directed suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Distinguishes a tagged [`Error`] from an unknown/foreign failure.
    #[must_use]
    pub fn is_ast_error(&self) -> bool {
        true
    }

    /// Shorthand constructors, one per kind.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
    /// Git error constructor.
    pub fn git(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Git, message)
    }
    /// Glob error constructor.
    pub fn glob(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Glob, message)
    }
    /// Path error constructor.
    pub fn path(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Path, message)
    }
    /// Filesystem error constructor.
    pub fn filesystem(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Filesystem, message)
    }
    /// Validation error constructor.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }
    /// Parser error constructor.
    pub fn parser(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parser, message)
    }
    /// Embedding error constructor.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Embedding, message)
    }
    /// Vector store error constructor.
    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VectorStore, message)
    }
    /// Protocol error constructor.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }
    /// Timeout error constructor.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            _ => ErrorKind::Filesystem,
        };
        Self::new(kind, source.to_string()).with_source(source)
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::new(ErrorKind::Validation, source.to_string()).with_source(source)
    }
}

/// Returns whether `err` is one of our tagged errors, mirroring the
/// source system's `isAstError` predicate for callers working with
/// `dyn std::error::Error`.
#[must_use]
pub fn is_ast_error(err: &(dyn std::error::Error + 'static)) -> bool {
    err.downcast_ref::<Error>().is_some()
}
