//! Relay archive model.
//!
//! An [`Archive`] maps environment keys to [`Env`]s; each environment carries
//! its metadata (identity, version, data identifier) and a map of flag key to
//! [`Flag`]. All maps are `BTreeMap` so serialized output is stable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DataId
// ---------------------------------------------------------------------------

/// Opaque token identifying which snapshot of flag data an environment holds.
///
/// Tokens are compared for equality only. The observed format is a decimal
/// counter; [`DataId::successor`] is the single place that knows this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataId(pub String);

impl DataId {
    /// Data identifier of an environment that has never been published.
    pub fn initial() -> Self {
        Self("1".to_owned())
    }

    /// The token that follows this one, or `None` if this token is not a
    /// decimal counter and therefore cannot be advanced.
    pub fn successor(&self) -> Option<Self> {
        let current: u64 = self.0.trim().parse().ok()?;
        current.checked_add(1).map(|next| Self(next.to_string()))
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DataId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DataId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// Kind-specific evaluable payload of a flag.
///
/// Reconciliation only ever compares two kinds for equality, so new variants
/// can be added here without touching [`crate::reconcile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FlagKind {
    Boolean { variation: bool },
    String { variation: String },
    Number { variation: f64 },
}

impl FlagKind {
    /// Tag name as written in project files and the archive.
    pub fn name(&self) -> &'static str {
        match self {
            FlagKind::Boolean { .. } => "boolean",
            FlagKind::String { .. } => "string",
            FlagKind::Number { .. } => "number",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagKind::Boolean { variation } => write!(f, "boolean({variation})"),
            FlagKind::String { variation } => write!(f, "string({variation:?})"),
            FlagKind::Number { variation } => write!(f, "number({variation})"),
        }
    }
}

/// A single feature flag as published in the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub key: String,
    /// Bumped by one on every content change or tombstone transition.
    pub version: u64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(flatten)]
    pub kind: FlagKind,
}

impl Flag {
    /// A flag with unassigned bookkeeping, as produced by the desired state.
    pub fn new(key: impl Into<String>, kind: FlagKind) -> Self {
        Self {
            key: key.into(),
            version: 0,
            deleted: false,
            kind,
        }
    }

    /// `true` when both flags would evaluate identically. Version and
    /// tombstone state are bookkeeping and take no part in the comparison.
    pub fn same_content(&self, other: &Flag) -> bool {
        self.kind == other.kind
    }
}

// ---------------------------------------------------------------------------
// Environments
// ---------------------------------------------------------------------------

/// Identity and bookkeeping for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvMetadata {
    pub env_id: String,
    pub env_key: String,
    pub env_name: String,
    /// Version of the identity attributes above, not of the flag data.
    pub version: u64,
    pub data_id: DataId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mob_key: Option<String>,
}

/// Flag data of one environment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvData {
    #[serde(default)]
    pub flags: BTreeMap<String, Flag>,
}

/// One deployment target with its own flag set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Env {
    pub metadata: EnvMetadata,
    #[serde(default)]
    pub data: EnvData,
}

impl Env {
    /// An environment whose id and key are both `key`, with no flags.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            metadata: EnvMetadata {
                env_id: key.clone(),
                env_key: key,
                env_name: name.into(),
                ..EnvMetadata::default()
            },
            data: EnvData::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.metadata.env_key
    }

    /// Insert `flag` under its own key, replacing any previous entry.
    pub fn insert_flag(&mut self, flag: Flag) {
        self.data.flags.insert(flag.key.clone(), flag);
    }
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Full published configuration state of one project, keyed by environment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Archive {
    #[serde(default)]
    pub envs: BTreeMap<String, Env>,
}

impl Archive {
    /// The archive a project has before its first reconciliation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert `env` under its own key, replacing any previous entry.
    pub fn insert_env(&mut self, env: Env) {
        self.envs.insert(env.metadata.env_key.clone(), env);
    }

    pub fn env(&self, key: &str) -> Option<&Env> {
        self.envs.get(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
