//! Run settings.
//!
//! Every setting comes from the environment (the CLI maps each one to a flag
//! with an env fallback). Required settings have no default; an empty value
//! counts as unset.

use std::path::PathBuf;

use brightly_project::DEFAULT_PROJECT_ROOT;

use crate::error::SyncError;

pub const PROJECT_ROOT_VAR: &str = "BRIGHTLY_YAML";
pub const ENDPOINT_VAR: &str = "BRIGHTLY_ENDPOINT";
pub const BUCKET_VAR: &str = "BRIGHTLY_S3_BUCKET";
pub const SECRETS_DIR_VAR: &str = "BRIGHTLY_SECRETS_DIR";

/// Validated settings for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub project_root: PathBuf,
    pub endpoint: String,
    pub bucket: PathBuf,
    pub secrets_dir: PathBuf,
}

impl Settings {
    /// Validate raw values. `project_root` falls back to `project`.
    pub fn new(
        project_root: Option<String>,
        endpoint: Option<String>,
        bucket: Option<String>,
        secrets_dir: Option<String>,
    ) -> Result<Self, SyncError> {
        let project_root = non_empty(project_root).unwrap_or_else(|| {
            tracing::debug!(
                "{PROJECT_ROOT_VAR} not set, using default: {DEFAULT_PROJECT_ROOT}"
            );
            DEFAULT_PROJECT_ROOT.to_owned()
        });
        Ok(Self {
            project_root: PathBuf::from(project_root),
            endpoint: required(endpoint, ENDPOINT_VAR)?,
            bucket: PathBuf::from(required(bucket, BUCKET_VAR)?),
            secrets_dir: PathBuf::from(required(secrets_dir, SECRETS_DIR_VAR)?),
        })
    }

    /// Resolve from any variable lookup, e.g. `|k| std::env::var(k).ok()`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        Self::new(
            lookup(PROJECT_ROOT_VAR),
            lookup(ENDPOINT_VAR),
            lookup(BUCKET_VAR),
            lookup(SECRETS_DIR_VAR),
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, var: &'static str) -> Result<String, SyncError> {
    non_empty(value).ok_or(SyncError::MissingSetting { var })
}
