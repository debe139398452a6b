//! Error types for brightly-core.

use thiserror::Error;

use crate::types::DataId;

/// Structural inconsistencies that stop a reconciliation run.
///
/// Ordinary additions, changes and removals are never errors; these only
/// arise when OLD and NEW disagree about identity in a way no merge resolves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// An environment is stored under a map key that differs from its own key.
    #[error("environment stored under '{map_key}' declares key '{env_key}'")]
    EnvKeyMismatch { map_key: String, env_key: String },

    /// The same environment key refers to two different environment ids.
    #[error("environment '{env_key}' has id '{old_id}' in the published archive but '{new_id}' in the desired state")]
    EnvIdentityConflict {
        env_key: String,
        old_id: String,
        new_id: String,
    },

    /// A flag is stored under a map key that differs from its own key.
    #[error("environment '{env_key}': flag stored under '{map_key}' declares key '{flag_key}'")]
    FlagKeyMismatch {
        env_key: String,
        map_key: String,
        flag_key: String,
    },

    /// The published data identifier cannot be advanced.
    #[error("environment '{env_key}': data id '{data_id}' has no successor")]
    InvalidDataId { env_key: String, data_id: DataId },
}
