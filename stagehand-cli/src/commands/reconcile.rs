//! `stagehand reconcile`: retry commits for assets left open for editing.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use stagehand_core::FailureLedger;
use stagehand_sync::reconcile;

use crate::exit::Outcome;
use crate::session::{Session, TargetArgs};

/// Arguments for `stagehand reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Override the configured number of commit attempts per asset.
    #[arg(long, value_name = "N")]
    pub attempts: Option<u32>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ReconcileJson<'a> {
    open_edits: &'a Path,
    failures: &'a FailureLedger,
}

impl ReconcileArgs {
    pub fn run(self, config: Option<&Path>) -> Result<Outcome> {
        let session = Session::open(config, &self.target)?;
        let store = session.store()?;
        let attempts = self
            .attempts
            .unwrap_or(session.config.reconcile.max_attempts);

        let open_edits = &session.layout.open_edits;
        let ledger = reconcile(open_edits, &store, attempts).context("reconciliation failed")?;

        if self.json {
            let payload = ReconcileJson {
                open_edits,
                failures: &ledger,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize report")?
            );
        } else if ledger.is_empty() {
            println!("{} no assets left open for editing", "✓".green().bold());
        } else {
            println!(
                "{} {} asset(s) still open in {}:",
                "!".red().bold(),
                ledger.len(),
                open_edits.display()
            );
            for id in ledger.iter() {
                println!("  <{id}>");
            }
        }

        Ok(if ledger.is_empty() {
            Outcome::Success
        } else {
            Outcome::FailuresRecorded
        })
    }
}
