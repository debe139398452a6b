//! # brightly-project
//!
//! Desired-state provider: loads the YAML project files an author maintains
//! and turns them into the NEW [`brightly_core::Archive`] for reconciliation.
//!
//! ```text
//! project/
//!   project.yaml        key, name, environments
//!   flags/*.yaml        one flag per file
//! ```

pub mod error;
pub mod loader;
pub mod model;

pub use error::ProjectError;
pub use loader::{load_project_at, DEFAULT_PROJECT_ROOT};
pub use model::{EnvironmentSpec, FlagSpec, Project};
