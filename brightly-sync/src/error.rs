//! Error types for brightly-sync.

use std::path::PathBuf;

use thiserror::Error;

use brightly_core::ReconcileError;
use brightly_project::ProjectError;

/// All errors that can arise from a reconciliation run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required setting was absent or empty.
    #[error("required setting {var} is not set")]
    MissingSetting { var: &'static str },

    /// The project files failed validation.
    #[error("project error: {0}")]
    Project(#[from] ProjectError),

    /// OLD and NEW could not be merged.
    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored archive exists but cannot be read back.
    #[error("archive at {path} is corrupt: {source}")]
    CorruptArchive {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (archive encode path).
    #[error("archive JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A storage backend failed for a reason other than I/O.
    #[error("archive storage error: {0}")]
    Storage(String),

    #[error("secret '{name}' not found")]
    SecretNotFound { name: String },

    #[error("secret '{name}' is empty")]
    EmptySecret { name: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
