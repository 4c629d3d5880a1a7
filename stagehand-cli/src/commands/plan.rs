//! `stagehand plan`: preview what `sync` would stage.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use stagehand_sync::{plan, SyncPlan};

use crate::exit::Outcome;
use crate::session::{Session, TargetArgs};

/// Arguments for `stagehand plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "kind")]
    kind: &'static str,
    #[tabled(rename = "unit")]
    label: String,
    #[tabled(rename = "path")]
    path: String,
}

impl PlanArgs {
    pub fn run(self, config: Option<&Path>) -> Result<Outcome> {
        let session = Session::open(config, &self.target)?;
        let preview = plan(&session.layout, &session.config.patch).context("plan failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&preview).context("failed to serialize plan")?
            );
        } else {
            print_plan(&preview);
        }

        Ok(if preview.changes.is_empty() {
            Outcome::NothingToDo
        } else {
            Outcome::Success
        })
    }
}

fn print_plan(preview: &SyncPlan) {
    let changes = &preview.changes;
    if changes.is_empty() {
        println!("✓ nothing to do; no script or asset changed since {}", preview.watermark);
    } else {
        println!(
            "{} script(s) and {} asset(s) would be staged ({} progress unit(s))",
            changes.scripts.len(),
            changes.assets.len(),
            changes.total_units()
        );
        let rows: Vec<UnitRow> = changes
            .units()
            .map(|unit| UnitRow {
                kind: unit.kind(),
                label: unit.label(),
                path: unit.path().display().to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    match &preview.patch_diff {
        Some(diff) => {
            println!("{}", "configuration patch:".bold());
            for line in diff.lines() {
                if line.starts_with('+') && !line.starts_with("+++") {
                    println!("{}", line.green());
                } else if line.starts_with('-') && !line.starts_with("---") {
                    println!("{}", line.red());
                } else {
                    println!("{line}");
                }
            }
        }
        None => println!("configuration patch: nothing to change"),
    }
}
