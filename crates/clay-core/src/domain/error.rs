// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Raised by pure logic: parsing path expressions, validating generator
/// manifests and model documents. Never carries I/O details.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Path expressions
    // ========================================================================
    #[error("Invalid path expression '{expression}' at offset {offset}: {reason}")]
    InvalidQuery {
        expression: String,
        offset: usize,
        reason: String,
    },

    #[error("'{expression}' is not a normalized path")]
    NotNormalizedPath { expression: String },

    // ========================================================================
    // Documents
    // ========================================================================
    #[error("Invalid generator manifest:\n  {}", .errors.join("\n  "))]
    InvalidGenerator { errors: Vec<String> },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid include at {location}: {reason}")]
    InvalidInclude { location: String, reason: String },

    #[error("Invalid mixin '{name}': {reason}")]
    InvalidMixin { name: String, reason: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidQuery { expression, .. } => vec![
                format!("Check the path expression: {}", expression),
                "Expressions start at '$', e.g. $.model.types[*]".into(),
                "Try: clay test-path <model> <expression>".into(),
            ],
            Self::InvalidGenerator { .. } => vec![
                "Each step needs exactly one of 'generate', 'copy' or 'runCommand'".into(),
                "Check generator.json against the fields listed above".into(),
            ],
            Self::InvalidModel(_) => vec![
                "A model needs a 'name', a 'generators' list and a 'model' object".into(),
            ],
            Self::InvalidInclude { .. } => {
                vec!["'include' must be a path relative to the including file".into()]
            }
            Self::InvalidMixin { name, .. } => vec![
                format!("Check the body of mixin '{}'", name),
                "A mixin body must render to a JSON object".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidQuery { .. } | Self::NotNormalizedPath { .. } => {
                ErrorCategory::Validation
            }
            Self::InvalidGenerator { .. }
            | Self::InvalidModel(_)
            | Self::InvalidInclude { .. }
            | Self::InvalidMixin { .. } => ErrorCategory::Configuration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
}
