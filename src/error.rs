use std::io;

use thiserror::Error;

/// Error type for taxonomy normalization, label resolution, query building and
/// table output.
#[derive(Debug, Error)]
pub enum WegError {
    /// Required input was missing or blank.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A label, identifier or tier key had no match in scope.
    #[error("{kind} not found: {value}")]
    NotFound { kind: &'static str, value: String },
    /// A node was found but cannot be used in a query clause.
    #[error("category '{label}' has no identifier and cannot be queried")]
    Unqueryable { label: String },
    /// Structurally invalid external payload.
    #[error("malformed {what}: {details}")]
    MalformedInput { what: &'static str, details: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("table output failed: {0}")]
    Table(#[from] arrow2::error::Error),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl WegError {
    pub(crate) fn not_found(kind: &'static str, value: impl Into<String>) -> Self {
        WegError::NotFound {
            kind,
            value: value.into(),
        }
    }

    /// True for every failure that means "nothing matched".
    pub fn is_not_found(&self) -> bool {
        matches!(self, WegError::NotFound { .. } | WegError::Unqueryable { .. })
    }
}

pub type Result<T> = std::result::Result<T, WegError>;
