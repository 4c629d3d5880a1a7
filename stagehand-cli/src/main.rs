//! stagehand: incremental script and asset sync into a content store.
//!
//! # Usage
//!
//! ```text
//! stagehand sync [INSTALL_ROOT] [--json]
//! stagehand plan [INSTALL_ROOT] [--json]
//! stagehand reconcile [INSTALL_ROOT] [--json]
//! stagehand status [INSTALL_ROOT] [--json]
//! stagehand init [--install-root <path>] [--user] [--force]
//! ```
//!
//! Every command accepts `--config <file>` and `--verbose`.

mod commands;
mod exit;
mod progress;
mod session;
mod signal;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{
    init::InitArgs, plan::PlanArgs, reconcile::ReconcileArgs, status::StatusArgs,
    sync::SyncArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stagehand",
    version,
    about = "Stage changed scripts and assets into the content store",
    long_about = None,
)]
struct Cli {
    /// Configuration file (default: ./stagehand.yaml, then ~/.stagehand/config.yaml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stage every unit changed since the last sync and commit it.
    Sync(SyncArgs),

    /// Show what `sync` would stage, without touching anything.
    Plan(PlanArgs),

    /// Retry commits for assets left open for editing.
    Reconcile(ReconcileArgs),

    /// Show the watermark and the number of pending units.
    Status(StatusArgs),

    /// Write a default configuration file.
    Init(InitArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Sync(args) => args.run(config),
        Commands::Plan(args) => args.run(config),
        Commands::Reconcile(args) => args.run(config),
        Commands::Status(args) => args.run(config),
        Commands::Init(args) => args.run(config),
    };

    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            let code = exit::code_for_error(&err);
            if code != exit::CANCELLED {
                eprintln!("{} {err:#}", "error:".red().bold());
            }
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
