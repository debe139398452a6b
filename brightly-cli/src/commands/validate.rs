//! `brightly validate` — parse and type-check project files only.
//!
//! Touches neither the archive store nor the secrets source.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use brightly_project::{load_project_at, DEFAULT_PROJECT_ROOT};
use brightly_sync::settings::PROJECT_ROOT_VAR;

/// Arguments for `brightly validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project files root.
    #[arg(long, env = PROJECT_ROOT_VAR, default_value = DEFAULT_PROJECT_ROOT)]
    pub project_root: PathBuf,

    /// Emit the parsed project as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let project = load_project_at(&self.project_root).with_context(|| {
            format!(
                "failed to validate project files at {}",
                self.project_root.display()
            )
        })?;
        tracing::info!(
            root = %self.project_root.display(),
            project = %project.key,
            "project files validated"
        );

        if self.json {
            let json =
                serde_json::to_string_pretty(&project).context("failed to serialize project JSON")?;
            println!("{json}");
            return Ok(());
        }

        println!(
            "{} '{}' is valid ({} environments, {} flags)",
            "✓".green().bold(),
            project.key,
            project.environments.len(),
            project.flags.len()
        );
        for env in &project.environments {
            println!("  env  {} ({})", env.key, env.name);
        }
        for flag in &project.flags {
            let envs: Vec<&str> = flag.values.keys().map(String::as_str).collect();
            println!("  flag {} [{}] → {}", flag.key, flag.kind, envs.join(", "));
        }
        Ok(())
    }
}
