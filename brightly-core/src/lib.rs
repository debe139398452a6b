//! Brightly core library — relay archive model and the reconciliation engine.
//!
//! Public API surface:
//! - [`types`] — archive, environment and flag model
//! - [`diff`] — key-set differ shared by every level of the archive
//! - [`reconcile`] — flag / environment / archive reconcilers
//! - [`error`] — [`ReconcileError`]
//!
//! Everything here is pure: no I/O, no logging, no shared state.

pub mod diff;
pub mod error;
pub mod reconcile;
pub mod types;

pub use diff::{diff_keys, KeyDiff, KeySpace};
pub use error::ReconcileError;
pub use reconcile::{adopt_env, reconcile_archives, reconcile_env, reconcile_flag, FlagOutcome};
pub use types::{Archive, DataId, Env, EnvData, EnvMetadata, Flag, FlagKind};
