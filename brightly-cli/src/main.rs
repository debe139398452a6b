//! Brightly — publish declarative feature flags as a relay archive.
//!
//! # Usage
//!
//! ```text
//! brightly reconcile [--dry-run] [--diff]
//! brightly validate [--project-root <dir>] [--json]
//! ```
//!
//! Settings come from flags or their environment variables:
//! `BRIGHTLY_YAML`, `BRIGHTLY_ENDPOINT`, `BRIGHTLY_S3_BUCKET`,
//! `BRIGHTLY_SECRETS_DIR`. Logs go to stderr; `RUST_LOG` overrides the level.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{reconcile::ReconcileArgs, validate::ValidateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "brightly",
    version,
    about = "Reconcile feature flag project files into a relay archive",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile project files against the published archive and store the result.
    Reconcile(ReconcileArgs),

    /// Parse and type-check project files without reconciling.
    Validate(ValidateArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Reconcile(args) => args.run(),
        Commands::Validate(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
