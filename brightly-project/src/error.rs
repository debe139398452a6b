//! Error types for brightly-project.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that makes a set of project files unusable.
///
/// Each variant names the file and, where one is known, the key at fault so
/// the author can fix the input directly.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Underlying I/O failure while reading project files.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project root has no `project.yaml`.
    #[error("project file not found at {path}")]
    ProjectFileNotFound { path: PathBuf },

    /// YAML parse or schema error, with line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A key that must be non-empty was empty.
    #[error("{path}: {what} key must not be empty")]
    EmptyKey { path: PathBuf, what: &'static str },

    /// A key with characters outside `[A-Za-z0-9._-]`, or a leading `.`.
    #[error("{path}: {what} key '{key}' may only contain letters, digits, '.', '_' and '-' and must not start with '.'")]
    InvalidKey {
        path: PathBuf,
        what: &'static str,
        key: String,
    },

    #[error("{path}: environment '{key}' is declared more than once")]
    DuplicateEnvironment { path: PathBuf, key: String },

    #[error("flag '{key}' is defined in both {first} and {second}")]
    DuplicateFlag {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{path}: flag '{key}' has unknown kind '{kind}' (expected boolean, string or number)")]
    UnknownFlagKind {
        path: PathBuf,
        key: String,
        kind: String,
    },

    #[error("{path}: flag '{key}' sets a value for undeclared environment '{env}'")]
    UndeclaredEnvironment {
        path: PathBuf,
        key: String,
        env: String,
    },

    #[error("{path}: flag '{key}' in environment '{env}' must be a {expected} value")]
    InvalidValue {
        path: PathBuf,
        key: String,
        env: String,
        expected: &'static str,
    },
}

/// Convenience constructor for [`ProjectError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ProjectError {
    ProjectError::Io {
        path: path.into(),
        source,
    }
}
