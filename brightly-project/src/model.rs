//! Validated project structure.
//!
//! A [`Project`] only exists once every file has passed validation, so
//! converting it into an archive cannot fail.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use brightly_core::{Archive, Env, Flag, FlagKind};

/// One declared deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSpec {
    pub key: String,
    pub name: String,
}

/// One flag and its value in each environment that sets it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagSpec {
    pub key: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File the flag was read from.
    pub source: PathBuf,
    /// Environment key → evaluable payload.
    pub values: BTreeMap<String, FlagKind>,
}

/// The parsed contents of a project root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub key: String,
    pub name: String,
    pub environments: Vec<EnvironmentSpec>,
    pub flags: Vec<FlagSpec>,
}

impl Project {
    /// Desired-state archive: one environment per declaration, holding every
    /// flag that sets a value there. Bookkeeping fields are left unassigned.
    pub fn to_archive(&self) -> Archive {
        let mut archive = Archive::empty();
        for spec in &self.environments {
            let mut env = Env::new(spec.key.clone(), spec.name.clone());
            for flag in &self.flags {
                if let Some(kind) = flag.values.get(&spec.key) {
                    env.insert_flag(Flag::new(flag.key.clone(), kind.clone()));
                }
            }
            archive.insert_env(env);
        }
        archive
    }

    pub fn environment_keys(&self) -> impl Iterator<Item = &str> {
        self.environments.iter().map(|e| e.key.as_str())
    }
}
