//! tagspec - declarative image tag policy reconciliation CLI
//!
//! ## Commands
//!
//! - `spec gen`: print an example spec document
//! - `spec apply SPEC_FILE`: check every image in the spec against its policy

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use tagspec_core::{render_example, CommandInspector, InspectorConfig, SpecApplier};

#[derive(Parser)]
#[command(name = "tagspec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile container image tags against a declarative spec", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spec document operations
    Spec {
        #[command(subcommand)]
        action: SpecAction,
    },
}

#[derive(Subcommand)]
enum SpecAction {
    /// Generate example spec
    Gen,

    /// Apply a spec
    Apply {
        /// Spec file to apply (exactly one)
        #[arg(value_name = "SPEC_FILE")]
        files: Vec<PathBuf>,

        /// Inspection program (default: $TAGSPEC_INSPECT_PROGRAM or skopeo)
        #[arg(long)]
        inspect_program: Option<String>,

        /// Argument passed to the inspection program before the image reference (repeatable)
        #[arg(long = "inspect-arg", allow_hyphen_values = true)]
        inspect_args: Vec<String>,

        /// Per-image inspection timeout in seconds, 0 disables it
        #[arg(long)]
        inspect_timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tagspec_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Spec { action } => match action {
            SpecAction::Gen => cmd_spec_gen(),
            SpecAction::Apply {
                files,
                inspect_program,
                inspect_args,
                inspect_timeout_secs,
            } => {
                let config =
                    inspector_config(inspect_program, inspect_args, inspect_timeout_secs);
                cmd_spec_apply(&files, config).await
            }
        },
    }
}

/// Print the example spec document
fn cmd_spec_gen() -> Result<()> {
    let yaml = render_example()?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(yaml.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Apply a spec file, printing each image as it is processed
async fn cmd_spec_apply(files: &[PathBuf], config: InspectorConfig) -> Result<()> {
    let path = exactly_one(files)?;
    info!(spec = %path.display(), program = %config.program, "Applying spec");

    let applier = SpecApplier::new(CommandInspector::new(config));
    let mut stdout = std::io::stdout();
    let report = applier
        .apply_file(path, &mut stdout)
        .await
        .with_context(|| format!("Failed to apply spec {}", path.display()))?;

    info!(
        images = report.images.len(),
        checked = report.checked_count(),
        enforcing = report.enforcing,
        "Spec applied"
    );
    Ok(())
}

fn exactly_one(files: &[PathBuf]) -> Result<&Path> {
    match files {
        [path] => Ok(path.as_path()),
        _ => bail!("exactly one argument expected"),
    }
}

/// Flags win over `TAGSPEC_INSPECT_*` variables, which win over defaults
fn inspector_config(
    program: Option<String>,
    args: Vec<String>,
    timeout_secs: Option<u64>,
) -> InspectorConfig {
    let mut config = InspectorConfig::from_env();
    if let Some(program) = program {
        config.program = program;
    }
    if !args.is_empty() {
        config.args = args;
    }
    if let Some(secs) = timeout_secs {
        config.timeout_secs = secs;
    }
    config
}
