//! Reconciliation of a published archive (OLD) against a desired state (NEW).
//!
//! ```text
//! reconcile_archives ── diff env keys ──┬─ added    → adopt_env
//!                                       ├─ retained → reconcile_env ── diff flag keys → reconcile_flag
//!                                       └─ removed  → carried forward unchanged
//! ```
//!
//! Versions and data ids in NEW are ignored; only content matters. OLD and NEW
//! are borrowed immutably and the result is built from fresh clones.

use std::collections::BTreeMap;

use crate::diff::diff_keys;
use crate::error::ReconcileError;
use crate::types::{Archive, DataId, Env, EnvData, Flag};

// ---------------------------------------------------------------------------
// Flag level
// ---------------------------------------------------------------------------

/// Merged flag plus whether it counts as a change of the environment's data.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagOutcome {
    pub flag: Flag,
    pub changed: bool,
}

impl FlagOutcome {
    fn unchanged(flag: &Flag) -> Self {
        Self {
            flag: flag.clone(),
            changed: false,
        }
    }

    fn changed(flag: Flag) -> Self {
        Self {
            flag,
            changed: true,
        }
    }
}

/// Merge one flag key. Returns `None` only when the key is in neither side.
///
/// - added: NEW content at version 1.
/// - retained, same content, live: OLD verbatim.
/// - retained otherwise: NEW content at `old.version + 1`, live. A tombstoned
///   flag that reappears is revived even when its content is unchanged.
/// - removed, live: OLD content at `old.version + 1`, tombstoned.
/// - removed, already tombstoned: OLD verbatim.
pub fn reconcile_flag(old: Option<&Flag>, new: Option<&Flag>) -> Option<FlagOutcome> {
    let outcome = match (old, new) {
        (None, None) => return None,
        (None, Some(new)) => FlagOutcome::changed(Flag {
            key: new.key.clone(),
            version: 1,
            deleted: false,
            kind: new.kind.clone(),
        }),
        (Some(old), Some(new)) if !old.deleted && old.same_content(new) => {
            FlagOutcome::unchanged(old)
        }
        (Some(old), Some(new)) => FlagOutcome::changed(Flag {
            key: old.key.clone(),
            version: old.version + 1,
            deleted: false,
            kind: new.kind.clone(),
        }),
        (Some(old), None) if old.deleted => FlagOutcome::unchanged(old),
        (Some(old), None) => FlagOutcome::changed(Flag {
            version: old.version + 1,
            deleted: true,
            ..old.clone()
        }),
    };
    Some(outcome)
}

// ---------------------------------------------------------------------------
// Environment level
// ---------------------------------------------------------------------------

/// Merge an environment present in both OLD and NEW.
///
/// Metadata is carried from OLD. The data id advances once if any flag
/// changed, no matter how many did.
pub fn reconcile_env(old: &Env, new: &Env) -> Result<Env, ReconcileError> {
    let env_key = old.key();
    let new_id = &new.metadata.env_id;
    if !new_id.is_empty() && *new_id != old.metadata.env_id {
        return Err(ReconcileError::EnvIdentityConflict {
            env_key: env_key.to_owned(),
            old_id: old.metadata.env_id.clone(),
            new_id: new_id.clone(),
        });
    }
    check_flag_keys(env_key, &old.data)?;
    check_flag_keys(env_key, &new.data)?;

    let diff = diff_keys(Some(&old.data.flags), Some(&new.data.flags));
    let mut flags = BTreeMap::new();
    let mut any_changed = false;
    for key in diff.iter_all() {
        let merged = reconcile_flag(old.data.flags.get(key), new.data.flags.get(key));
        if let Some(FlagOutcome { flag, changed }) = merged {
            any_changed |= changed;
            flags.insert(key.clone(), flag);
        }
    }

    let mut metadata = old.metadata.clone();
    if any_changed {
        metadata.data_id =
            metadata
                .data_id
                .successor()
                .ok_or_else(|| ReconcileError::InvalidDataId {
                    env_key: env_key.to_owned(),
                    data_id: old.metadata.data_id.clone(),
                })?;
    }

    Ok(Env {
        metadata,
        data: EnvData { flags },
    })
}

/// Take an environment that only exists in NEW: version 1, initial data id,
/// every flag treated as added.
pub fn adopt_env(new: &Env) -> Result<Env, ReconcileError> {
    check_flag_keys(new.key(), &new.data)?;

    let flags = new
        .data
        .flags
        .iter()
        .filter_map(|(key, flag)| {
            reconcile_flag(None, Some(flag)).map(|outcome| (key.clone(), outcome.flag))
        })
        .collect();

    let mut metadata = new.metadata.clone();
    metadata.version = 1;
    metadata.data_id = DataId::initial();

    Ok(Env {
        metadata,
        data: EnvData { flags },
    })
}

fn check_flag_keys(env_key: &str, data: &EnvData) -> Result<(), ReconcileError> {
    match data.flags.iter().find(|(map_key, flag)| **map_key != flag.key) {
        Some((map_key, flag)) => Err(ReconcileError::FlagKeyMismatch {
            env_key: env_key.to_owned(),
            map_key: map_key.clone(),
            flag_key: flag.key.clone(),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Archive level
// ---------------------------------------------------------------------------

/// Merge a whole archive.
///
/// Environments missing from NEW are carried forward unchanged. Any error
/// aborts the run; no partially merged archive is returned.
pub fn reconcile_archives(old: &Archive, new: &Archive) -> Result<Archive, ReconcileError> {
    check_env_keys(old)?;
    check_env_keys(new)?;

    let diff = diff_keys(Some(&old.envs), Some(&new.envs));
    let mut envs = BTreeMap::new();

    for key in &diff.added {
        envs.insert(key.clone(), adopt_env(&new.envs[key])?);
    }
    for key in &diff.retained {
        envs.insert(key.clone(), reconcile_env(&old.envs[key], &new.envs[key])?);
    }
    for key in &diff.removed {
        envs.insert(key.clone(), old.envs[key].clone());
    }

    Ok(Archive { envs })
}

fn check_env_keys(archive: &Archive) -> Result<(), ReconcileError> {
    match archive.envs.iter().find(|(map_key, env)| **map_key != env.key()) {
        Some((map_key, env)) => Err(ReconcileError::EnvKeyMismatch {
            map_key: map_key.clone(),
            env_key: env.key().to_owned(),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
