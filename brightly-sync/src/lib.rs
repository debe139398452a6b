//! # brightly-sync
//!
//! Everything around the reconciliation core: where the published archive
//! lives, where credentials come from, and the run that ties them together.
//!
//! Call [`pipeline::Reconciler::run`] to load the project files, reconcile
//! them against the published archive and store the result.

pub mod error;
pub mod pipeline;
pub mod secrets;
pub mod settings;
pub mod store;

pub use error::SyncError;
pub use pipeline::{render_diff, EnvSummary, Reconciler, RunOutcome, RunSummary};
pub use secrets::{FileSecretsProvider, SecretsProvider};
pub use settings::Settings;
pub use store::{ArchiveLocation, ArchiveStore, FsArchiveStore, MemoryArchiveStore, StoreOutcome};
