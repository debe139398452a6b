//! `brightly reconcile` — publish project files as a relay archive.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use brightly_sync::{
    render_diff,
    settings::{BUCKET_VAR, ENDPOINT_VAR, PROJECT_ROOT_VAR, SECRETS_DIR_VAR},
    FileSecretsProvider, FsArchiveStore, Reconciler, RunOutcome, Settings, StoreOutcome,
};

/// Arguments for `brightly reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Project files root (defaults to `project`).
    #[arg(long, env = PROJECT_ROOT_VAR)]
    pub project_root: Option<String>,

    /// Relay endpoint the archive is published for. Required.
    #[arg(long, env = ENDPOINT_VAR)]
    pub endpoint: Option<String>,

    /// Bucket directory holding published archives. Required.
    #[arg(long, env = BUCKET_VAR)]
    pub bucket: Option<String>,

    /// Directory of mounted SDK / mobile key secrets. Required.
    #[arg(long, env = SECRETS_DIR_VAR)]
    pub secrets_dir: Option<String>,

    /// Reconcile and report without storing the archive.
    #[arg(long)]
    pub dry_run: bool,

    /// Print a unified diff of the published archive against the result.
    #[arg(long)]
    pub diff: bool,
}

impl ReconcileArgs {
    pub fn run(self) -> Result<()> {
        let settings = Settings::new(self.project_root, self.endpoint, self.bucket, self.secrets_dir)
            .context("invalid configuration")?;
        tracing::debug!(?settings, "settings resolved");

        let span = tracing::info_span!("reconcile", endpoint = %settings.endpoint);
        let reconciler = Reconciler::new(
            FsArchiveStore::new(&settings.bucket),
            FileSecretsProvider::new(&settings.secrets_dir),
            &settings.project_root,
            settings.endpoint.clone(),
            span,
        );

        let outcome = reconciler.run(self.dry_run).with_context(|| {
            format!(
                "reconciliation failed for project files at {}",
                settings.project_root.display()
            )
        })?;

        if self.diff {
            let diff = render_diff(&outcome.old, &outcome.merged)
                .context("failed to render archive diff")?;
            if diff.is_empty() {
                println!("No differences.");
            } else {
                print!("{diff}");
            }
        }
        print_outcome(&outcome, self.dry_run);
        Ok(())
    }
}

#[derive(Tabled)]
struct EnvRow {
    #[tabled(rename = "environment")]
    env: String,
    #[tabled(rename = "data id")]
    data_id: String,
    #[tabled(rename = "added")]
    added: usize,
    #[tabled(rename = "changed")]
    changed: usize,
    #[tabled(rename = "removed")]
    removed: usize,
}

fn print_outcome(outcome: &RunOutcome, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let summary = &outcome.summary;

    let status = match &outcome.stored {
        None => "not stored".to_string(),
        Some(StoreOutcome::Written { digest }) => format!("stored (sha256 {})", short(digest)),
        Some(StoreOutcome::Unchanged { digest }) => format!("unchanged (sha256 {})", short(digest)),
    };
    let first = if summary.first_run { ", first publish" } else { "" };
    println!(
        "{prefix}{} '{}' reconciled{first}: {status}",
        "✓".green().bold(),
        summary.project
    );

    let rows: Vec<EnvRow> = summary
        .envs
        .iter()
        .map(|e| EnvRow {
            env: if e.declared {
                e.env_key.clone()
            } else {
                format!("{} (carried forward)", e.env_key)
            },
            data_id: if e.advanced {
                format!("{} ↑", e.data_id)
            } else {
                e.data_id.to_string()
            },
            added: e.added,
            changed: e.changed,
            removed: e.removed,
        })
        .collect();
    if rows.is_empty() {
        println!("  no environments");
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
