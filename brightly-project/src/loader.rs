//! Project file loading and validation.
//!
//! # File layout
//!
//! ```text
//! <root>/
//!   project.yaml           key, name, environments: [{ key, name }]
//!   flags/
//!     <any>.yaml | .yml    key, kind, description?, environments: { <env>: <value> }
//! ```
//!
//! Flag files are visited in sorted path order, so the first error reported
//! for a broken project is always the same one.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;

use brightly_core::FlagKind;

use crate::error::{io_err, ProjectError};
use crate::model::{EnvironmentSpec, FlagSpec, Project};

/// Root used when `BRIGHTLY_YAML` is not set.
pub const DEFAULT_PROJECT_ROOT: &str = "project";

const PROJECT_FILE: &str = "project.yaml";
const FLAGS_DIR: &str = "flags";

// ---------------------------------------------------------------------------
// Raw file schemas
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    key: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    environments: Vec<RawEnvironment>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEnvironment {
    key: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFlag {
    key: String,
    kind: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    environments: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load and validate the project rooted at `root`.
pub fn load_project_at(root: &Path) -> Result<Project, ProjectError> {
    let project_path = root.join(PROJECT_FILE);
    if !project_path.exists() {
        return Err(ProjectError::ProjectFileNotFound { path: project_path });
    }
    let raw: RawProject = read_yaml(&project_path)?;
    let (key, name, environments) = validate_project(&project_path, raw)?;

    let declared: HashSet<&str> = environments.iter().map(|e| e.key.as_str()).collect();
    let mut flags: Vec<FlagSpec> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for path in flag_files(&root.join(FLAGS_DIR))? {
        let raw: RawFlag = read_yaml(&path)?;
        let flag = validate_flag(&path, raw, &declared)?;
        if let Some(first) = seen.get(&flag.key) {
            return Err(ProjectError::DuplicateFlag {
                key: flag.key,
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(flag.key.clone(), path);
        flags.push(flag);
    }

    Ok(Project {
        key,
        name,
        environments,
        flags,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Flag kinds a project file may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Boolean,
    String,
    Number,
}

impl ValueKind {
    fn parse(path: &Path, key: &str, kind: &str) -> Result<Self, ProjectError> {
        match kind {
            "boolean" => Ok(Self::Boolean),
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            other => Err(ProjectError::UnknownFlagKind {
                path: path.to_path_buf(),
                key: key.to_owned(),
                kind: other.to_owned(),
            }),
        }
    }
}

/// Keys end up in storage paths and secret names, so they are limited to
/// `[A-Za-z0-9._-]` and may not start with `.`.
fn check_key(path: &Path, what: &'static str, key: &str) -> Result<(), ProjectError> {
    if key.trim().is_empty() {
        return Err(ProjectError::EmptyKey {
            path: path.to_path_buf(),
            what,
        });
    }
    let safe = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !safe || key.starts_with('.') {
        return Err(ProjectError::InvalidKey {
            path: path.to_path_buf(),
            what,
            key: key.to_owned(),
        });
    }
    Ok(())
}

fn validate_project(
    path: &Path,
    raw: RawProject,
) -> Result<(String, String, Vec<EnvironmentSpec>), ProjectError> {
    check_key(path, "project", &raw.key)?;

    let mut seen = HashSet::new();
    let mut environments = Vec::with_capacity(raw.environments.len());
    for env in raw.environments {
        check_key(path, "environment", &env.key)?;
        if !seen.insert(env.key.clone()) {
            return Err(ProjectError::DuplicateEnvironment {
                path: path.to_path_buf(),
                key: env.key,
            });
        }
        let name = env.name.unwrap_or_else(|| env.key.clone());
        environments.push(EnvironmentSpec { key: env.key, name });
    }

    let name = raw.name.unwrap_or_else(|| raw.key.clone());
    Ok((raw.key, name, environments))
}

fn validate_flag(
    path: &Path,
    raw: RawFlag,
    declared: &HashSet<&str>,
) -> Result<FlagSpec, ProjectError> {
    check_key(path, "flag", &raw.key)?;
    let kind = ValueKind::parse(path, &raw.key, &raw.kind)?;

    let mut values = BTreeMap::new();
    for (env, value) in raw.environments {
        if !declared.contains(env.as_str()) {
            return Err(ProjectError::UndeclaredEnvironment {
                path: path.to_path_buf(),
                key: raw.key,
                env,
            });
        }
        let variation = parse_value(path, &raw.key, kind, &env, value)?;
        values.insert(env, variation);
    }

    Ok(FlagSpec {
        key: raw.key,
        kind: raw.kind,
        description: raw.description,
        source: path.to_path_buf(),
        values,
    })
}

/// Interpret one environment value according to the flag's declared kind.
fn parse_value(
    path: &Path,
    key: &str,
    kind: ValueKind,
    env: &str,
    value: Value,
) -> Result<FlagKind, ProjectError> {
    let invalid = |expected: &'static str| ProjectError::InvalidValue {
        path: path.to_path_buf(),
        key: key.to_owned(),
        env: env.to_owned(),
        expected,
    };

    match kind {
        ValueKind::Boolean => match value {
            Value::Bool(variation) => Ok(FlagKind::Boolean { variation }),
            _ => Err(invalid("boolean")),
        },
        ValueKind::String => match value {
            Value::String(variation) => Ok(FlagKind::String { variation }),
            _ => Err(invalid("string")),
        },
        ValueKind::Number => match value.as_f64() {
            Some(variation) if variation.is_finite() => Ok(FlagKind::Number { variation }),
            _ => Err(invalid("number")),
        },
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ProjectError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ProjectError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// `*.yaml` / `*.yml` files directly under `dir`, sorted. A missing directory
/// means the project has no flags yet.
fn flag_files(dir: &Path) -> Result<Vec<PathBuf>, ProjectError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
