//! Application layer errors.
//!
//! These errors represent failures in orchestration and I/O, not in the
//! documents themselves. Document errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while resolving, generating or cleaning.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// A file the run depends on does not exist.
    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: PathBuf },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// A JSON document could not be parsed.
    #[error("Invalid JSON in {path}: {reason}")]
    InvalidJson { path: PathBuf, reason: String },

    /// Template rendering failed.
    #[error("Rendering '{template}' failed: {reason}")]
    RenderingFailed { template: String, reason: String },

    /// A formatter rejected the rendered output.
    #[error("Formatter '{formatter}' failed on {path}: {reason}")]
    FormattingFailed {
        formatter: String,
        path: PathBuf,
        reason: String,
    },

    /// The `.clay` index is unreadable even after merge repair.
    #[error("Generation index {path} is corrupt: {reason}")]
    IndexCorrupt { path: PathBuf, reason: String },

    /// A subprocess could not be started.
    #[error("Command '{command}' could not be run: {reason}")]
    CommandFailed { command: String, reason: String },

    /// A shared index entry lock was poisoned by a panicking worker.
    #[error("Generation state lock poisoned")]
    LockPoisoned,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound { what, path } => vec![
                format!("Missing {}: {}", what, path.display()),
                "Paths in models and generators are relative to the file that names them".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::InvalidJson { path, .. } => vec![
                format!("Fix the JSON syntax in {}", path.display()),
            ],
            Self::RenderingFailed { template, .. } => vec![
                format!("Check the template syntax of {}", template),
                "Nothing after the failing step was generated".into(),
            ],
            Self::IndexCorrupt { path, .. } => vec![
                format!("Inspect {} for a half-resolved merge", path.display()),
                "Deleting the file forgets what was generated; files are kept".into(),
            ],
            Self::CommandFailed { command, .. } => vec![
                format!("Ensure '{}' is installed and on your PATH", command),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidJson { .. } | Self::IndexCorrupt { .. } => ErrorCategory::Configuration,
            Self::RenderingFailed { .. } | Self::FormattingFailed { .. } => {
                ErrorCategory::Rendering
            }
            Self::FilesystemError { .. } | Self::CommandFailed { .. } | Self::LockPoisoned => {
                ErrorCategory::Internal
            }
        }
    }
}
