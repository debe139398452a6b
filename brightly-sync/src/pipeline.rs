//! Reconciliation run: project files + published archive → new archive.
//!
//! ## `Reconciler::run` — 6-step protocol
//!
//! 1. Load and validate the project files (the desired state).
//! 2. Fetch the published archive; "not found" means first run (empty OLD).
//! 3. Reconcile OLD against NEW.
//! 4. Refresh SDK and mobile keys on every declared environment.
//! 5. Summarize what changed.
//! 6. Store the merged archive (skipped in dry-run mode).
//!
//! Any failure aborts the run before anything is stored.

use std::path::PathBuf;

use similar::TextDiff;
use tracing::Span;

use brightly_core::{reconcile_archives, Archive, DataId};
use brightly_project::load_project_at;

use crate::error::SyncError;
use crate::secrets::SecretsProvider;
use crate::store::{encode, ArchiveLocation, ArchiveStore, StoreOutcome};

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// What one run did to one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSummary {
    pub env_key: String,
    pub data_id: DataId,
    /// The data id moved forward during this run.
    pub advanced: bool,
    /// `false` for environments missing from the project files and carried
    /// forward from the published archive.
    pub declared: bool,
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
}

/// Per-environment summary of a run, sorted by environment key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub project: String,
    pub first_run: bool,
    pub envs: Vec<EnvSummary>,
}

impl RunSummary {
    /// `true` when no environment's flag data moved.
    pub fn is_noop(&self) -> bool {
        self.envs.iter().all(|e| !e.advanced)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub old: Archive,
    pub merged: Archive,
    /// `None` in dry-run mode.
    pub stored: Option<StoreOutcome>,
}

fn summarize(
    project: &str,
    first_run: bool,
    old: &Archive,
    merged: &Archive,
    declared: &[&str],
) -> RunSummary {
    let envs = merged
        .envs
        .iter()
        .map(|(env_key, env)| {
            let prev = old.envs.get(env_key);
            let mut summary = EnvSummary {
                env_key: env_key.clone(),
                data_id: env.metadata.data_id.clone(),
                advanced: prev.map_or(true, |p| p.metadata.data_id != env.metadata.data_id),
                declared: declared.contains(&env_key.as_str()),
                added: 0,
                changed: 0,
                removed: 0,
            };
            for (flag_key, flag) in &env.data.flags {
                match prev.and_then(|p| p.data.flags.get(flag_key)) {
                    None => summary.added += 1,
                    Some(before) if before.version == flag.version => {}
                    Some(_) if flag.deleted => summary.removed += 1,
                    Some(_) => summary.changed += 1,
                }
            }
            summary
        })
        .collect();

    RunSummary {
        project: project.to_owned(),
        first_run,
        envs,
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// One project, one relay endpoint, one store and one secrets source.
///
/// Logging goes through the `span` handed in by the caller; nothing here
/// reaches for process-wide state.
pub struct Reconciler<S, P> {
    store: S,
    secrets: P,
    project_root: PathBuf,
    endpoint: String,
    span: Span,
}

impl<S: ArchiveStore, P: SecretsProvider> Reconciler<S, P> {
    pub fn new(
        store: S,
        secrets: P,
        project_root: impl Into<PathBuf>,
        endpoint: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            store,
            secrets,
            project_root: project_root.into(),
            endpoint: endpoint.into(),
            span,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the full pipeline. With `dry_run` nothing is stored.
    pub fn run(&self, dry_run: bool) -> Result<RunOutcome, SyncError> {
        let _entered = self.span.enter();

        // Step 1: desired state.
        let project = load_project_at(&self.project_root)?;
        tracing::info!(
            project = %project.key,
            root = %self.project_root.display(),
            environments = project.environments.len(),
            flags = project.flags.len(),
            "project files loaded"
        );
        let location = ArchiveLocation::new(project.key.clone(), self.endpoint.clone());

        // Step 2: published state.
        let (old, first_run) = match self.store.fetch(&location)? {
            Some(archive) => (archive, false),
            None => {
                tracing::info!(
                    %location,
                    store = %self.store,
                    "no published archive, starting from empty"
                );
                (Archive::empty(), true)
            }
        };

        // Step 3: merge.
        let new = project.to_archive();
        let mut merged = reconcile_archives(&old, &new)?;

        // Step 4: credentials. Carried-forward environments keep what they had.
        for env_key in project.environment_keys() {
            if let Some(env) = merged.envs.get_mut(env_key) {
                env.metadata.sdk_key = Some(self.secrets.sdk_key(&project.key, env_key)?);
                env.metadata.mob_key = Some(self.secrets.mobile_key(&project.key, env_key)?);
            }
        }

        // Step 5: summary.
        let declared: Vec<&str> = project.environment_keys().collect();
        let summary = summarize(&project.key, first_run, &old, &merged, &declared);
        for env in &summary.envs {
            tracing::info!(
                env = %env.env_key,
                data_id = %env.data_id,
                advanced = env.advanced,
                added = env.added,
                changed = env.changed,
                removed = env.removed,
                "environment reconciled"
            );
            if !env.declared {
                tracing::warn!(
                    env = %env.env_key,
                    "environment missing from project files, carried forward"
                );
            }
        }

        // Step 6: publish.
        let stored = if dry_run {
            tracing::info!(%location, "[dry-run] archive not stored");
            None
        } else {
            Some(self.store.store(&location, &merged)?)
        };

        Ok(RunOutcome {
            summary,
            old,
            merged,
            stored,
        })
    }
}

// ---------------------------------------------------------------------------
// Diff rendering
// ---------------------------------------------------------------------------

/// Unified diff between two archives' serialized forms. Empty when equal.
pub fn render_diff(old: &Archive, new: &Archive) -> Result<String, SyncError> {
    let old_text = String::from_utf8_lossy(&encode(old)?).into_owned();
    let new_text = String::from_utf8_lossy(&encode(new)?).into_owned();
    if old_text == new_text {
        return Ok(String::new());
    }
    Ok(TextDiff::from_lines(&old_text, &new_text)
        .unified_diff()
        .header("a/archive.json", "b/archive.json")
        .context_radius(3)
        .to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
