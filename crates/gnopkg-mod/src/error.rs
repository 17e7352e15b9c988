//! Error types for module file parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModFileError>;

#[derive(Debug, Error)]
pub enum ModFileError {
    // Syntax errors, positioned at the offending line
    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("{file}: {message}")]
    Toml { file: String, message: String },

    // Semantic validation errors
    #[error("invalid module path {path:?}: {reason}")]
    InvalidModulePath { path: String, reason: String },

    #[error("{file}: missing module path")]
    MissingModule { file: String },

    #[error("no module file found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModFileError {
    pub(crate) fn parse(file: &str, line: usize, message: impl Into<String>) -> Self {
        ModFileError::Parse {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }
}
