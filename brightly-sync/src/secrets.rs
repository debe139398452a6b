//! SDK and mobile credential lookup.
//!
//! Secret names follow a fixed convention that must stay in sync with the
//! infrastructure provisioning them:
//!
//! ```text
//! brightly-<project>-<env>-sdk-key
//! brightly-<project>-<env>-mob-key
//! ```

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{io_err, SyncError};

const SECRET_PREFIX: &str = "brightly";

pub fn sdk_key_secret_name(project: &str, env: &str) -> String {
    format!("{SECRET_PREFIX}-{project}-{env}-sdk-key")
}

pub fn mobile_key_secret_name(project: &str, env: &str) -> String {
    format!("{SECRET_PREFIX}-{project}-{env}-mob-key")
}

/// Source of per-environment credentials.
pub trait SecretsProvider: fmt::Display {
    /// Resolve a secret by its full name.
    fn secret(&self, name: &str) -> Result<String, SyncError>;

    fn sdk_key(&self, project: &str, env: &str) -> Result<String, SyncError> {
        self.secret(&sdk_key_secret_name(project, env))
    }

    fn mobile_key(&self, project: &str, env: &str) -> Result<String, SyncError> {
        self.secret(&mobile_key_secret_name(project, env))
    }
}

/// Secrets mounted as files: the value of `name` is the trimmed content of
/// `<dir>/<name>`.
#[derive(Debug, Clone)]
pub struct FileSecretsProvider {
    dir: PathBuf,
}

impl FileSecretsProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl fmt::Display for FileSecretsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "files:{}", self.dir.display())
    }
}

impl SecretsProvider for FileSecretsProvider {
    fn secret(&self, name: &str) -> Result<String, SyncError> {
        let path = self.dir.join(name);
        tracing::debug!(secret = name, "fetching secret");
        let value = match std::fs::read_to_string(&path) {
            Ok(value) => value,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SyncError::SecretNotFound {
                    name: name.to_owned(),
                })
            }
            Err(err) => return Err(io_err(path, err)),
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(SyncError::EmptySecret {
                name: name.to_owned(),
            });
        }
        Ok(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn secret_names_follow_convention() {
        assert_eq!(sdk_key_secret_name("shop", "staging"), "brightly-shop-staging-sdk-key");
        assert_eq!(mobile_key_secret_name("shop", "staging"), "brightly-shop-staging-mob-key");
    }

    #[test]
    fn file_secrets_are_trimmed() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("brightly-shop-staging-sdk-key"), "sdk-123\n").unwrap();
        let provider = FileSecretsProvider::new(tmp.path());
        assert_eq!(provider.sdk_key("shop", "staging").unwrap(), "sdk-123");
    }

    #[test]
    fn missing_secret_names_the_secret() {
        let tmp = TempDir::new().unwrap();
        let provider = FileSecretsProvider::new(tmp.path());
        let err = provider.mobile_key("shop", "prod").unwrap_err();
        assert!(matches!(err, SyncError::SecretNotFound { .. }), "got: {err}");
        assert!(err.to_string().contains("brightly-shop-prod-mob-key"));
    }

    #[test]
    fn blank_secret_is_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("brightly-shop-prod-sdk-key"), "  \n").unwrap();
        let provider = FileSecretsProvider::new(tmp.path());
        let err = provider.sdk_key("shop", "prod").unwrap_err();
        assert!(matches!(err, SyncError::EmptySecret { .. }), "got: {err}");
    }
}
