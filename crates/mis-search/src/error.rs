use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    // Input errors
    #[error("Invalid container dimensions: {length} x {width}")]
    InvalidDimensions { length: f64, width: f64 },

    #[error("Malformed instance {}: {reason}", path.display())]
    MalformedInstance { path: PathBuf, reason: String },

    #[error("Instance {} is named '{name}' like {}; their outputs would overlap", path.display(), first.display())]
    DuplicateInstance { name: String, path: PathBuf, first: PathBuf },

    // Oracle errors
    #[error("Oracle call exceeded its time budget")]
    OracleTimeout,

    #[error("Oracle failed: {0}")]
    OracleError(String),

    // Store errors
    #[error("Feasibility cache {} is unreadable: {reason}", path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Execution errors
    #[error("Search cancelled")]
    Cancelled,

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SearchError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SearchError::MalformedInstance {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
