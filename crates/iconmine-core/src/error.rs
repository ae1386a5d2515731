//! Error types for iconmine-core.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The document store refused a single document.
    #[error("Document rejected: {0}")]
    BadRequest(String),

    /// The document store could not be reached or answered with a server error.
    #[error("Sink error: {0}")]
    Sink(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MineError>;
