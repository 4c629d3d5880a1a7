//! `stagehand sync`: stage every changed unit and commit it.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use stagehand_daemon::SystemProcesses;
use stagehand_sync::{CancelToken, NoProgress, Orchestrator, ProgressSink, SyncReport};

use crate::exit::Outcome;
use crate::progress::TerminalProgress;
use crate::session::{Session, TargetArgs};
use crate::signal;

/// Arguments for `stagehand sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Emit the run report as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self, config: Option<&Path>) -> Result<Outcome> {
        let session = Session::open(config, &self.target)?;
        let processes = SystemProcesses::new();
        session.ensure_host_closed(&processes)?;
        let store = session.store()?;

        let cancel = CancelToken::new();
        signal::cancel_on_ctrl_c(cancel.clone());

        let terminal = TerminalProgress::default();
        let progress: &dyn ProgressSink = if self.json { &NoProgress } else { &terminal };

        let report = Orchestrator::new(&session.config, &session.layout, &store, &processes)
            .with_progress(progress)
            .with_cancel(cancel)
            .run()
            .context("sync failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            print_report(&report, &session);
        }

        Ok(match &report {
            SyncReport::NothingToDo { .. } => Outcome::NothingToDo,
            SyncReport::Completed(summary) if !summary.failures.is_empty() => {
                Outcome::FailuresRecorded
            }
            SyncReport::Completed(_) => Outcome::Success,
        })
    }
}

fn print_report(report: &SyncReport, session: &Session) {
    match report {
        SyncReport::NothingToDo { .. } => {
            println!("✓ nothing to do; no script or asset changed since the last sync");
        }
        SyncReport::Completed(summary) => {
            if !summary.failures.is_empty() {
                println!(
                    "{} some assets could not be committed. Check them in the store's open-for-edit area ({}) before starting the application:",
                    "!".red().bold(),
                    session.layout.open_edits.display()
                );
                for id in summary.failures.iter() {
                    println!("  <{id}>");
                }
            }
            println!(
                "{} sync complete. Scripts: {}, Assets: {}",
                "✓".green().bold(),
                summary.scripts,
                summary.assets
            );
        }
    }
}
