//! Error type shared by every generation phase.
use std::path::PathBuf;
use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

#[derive(Error, Debug)]
pub enum GenError {
    /// `type` is missing a known value (or is not a string at all).
    #[error("unrecognized type `{declared}` at {pointer}")]
    UnrecognizedType { pointer: String, declared: String },

    /// A key outside the set recognized for the node's kind.
    #[error("unknown key `{key}` on {kind} node at {pointer}")]
    UnknownKey { pointer: String, kind: &'static str, key: String },

    /// Structurally malformed node (wrong value shape, missing `items`, ...).
    #[error("invalid schema at {pointer}: {reason}")]
    InvalidSchema { pointer: String, reason: String },

    #[error("pointer registered twice: {0}")]
    DuplicatePointer(String),

    #[error("pointer not found: {0}")]
    PointerNotFound(String),

    #[error("cyclic reference through {0}")]
    CyclicReference(String),

    /// Operation requested on a node kind that cannot perform it.
    #[error("unsupported operation `{operation}` on {kind} node at {pointer}")]
    Unsupported { pointer: String, kind: &'static str, operation: &'static str },

    #[error("failed to select schema document: {0}")]
    Select(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GenError {
    pub(crate) fn invalid(pointer: &str, reason: impl Into<String>) -> Self {
        GenError::InvalidSchema { pointer: pointer.to_string(), reason: reason.into() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io { path: path.into(), source }
    }

    /// True for errors raised while classifying nodes.
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            GenError::UnrecognizedType { .. }
                | GenError::UnknownKey { .. }
                | GenError::InvalidSchema { .. }
                | GenError::DuplicatePointer(_)
        )
    }

    /// True for errors raised while resolving `$ref` targets.
    pub fn is_resolution(&self) -> bool {
        matches!(self, GenError::PointerNotFound(_) | GenError::CyclicReference(_))
    }
}
