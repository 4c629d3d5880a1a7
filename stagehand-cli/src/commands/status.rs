//! `stagehand status`: watermark and pending work at a glance.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stagehand_sync::plan;

use crate::exit::Outcome;
use crate::session::{Session, TargetArgs};

/// Arguments for `stagehand status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusJson {
    config: Option<PathBuf>,
    install_root: PathBuf,
    store_executable: PathBuf,
    store_present: bool,
    last_sync_at: Option<String>,
    last_sync_age: String,
    pending_scripts: usize,
    pending_assets: usize,
    patch_pending: bool,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "")]
    key: &'static str,
    #[tabled(rename = "")]
    value: String,
}

impl StatusArgs {
    pub fn run(self, config: Option<&Path>) -> Result<Outcome> {
        let session = Session::open(config, &self.target)?;
        let preview = plan(&session.layout, &session.config.patch).context("status check failed")?;

        let synced_at = (preview.watermark.as_secs() > 0)
            .then(|| preview.watermark.to_datetime())
            .flatten();
        let status = StatusJson {
            config: session.config_path.clone(),
            install_root: session.install_root.clone(),
            store_executable: session.layout.store_executable.clone(),
            store_present: session.layout.store_executable.is_file(),
            last_sync_at: synced_at.map(|t| t.to_rfc3339()),
            last_sync_age: synced_at.map_or_else(|| "never".to_string(), format_age),
            pending_scripts: preview.changes.scripts.len(),
            pending_assets: preview.changes.assets.len(),
            patch_pending: preview.patch_diff.is_some(),
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to serialize status")?
            );
        } else {
            print_table(&status);
        }

        Ok(if preview.changes.is_empty() {
            Outcome::NothingToDo
        } else {
            Outcome::Success
        })
    }
}

fn print_table(status: &StatusJson) {
    println!("stagehand v{}", env!("CARGO_PKG_VERSION"));

    let store = if status.store_present {
        status.store_executable.display().to_string()
    } else {
        format!("{} (missing)", status.store_executable.display())
    };
    let last_sync = match &status.last_sync_at {
        Some(at) => format!("{at} ({} ago)", status.last_sync_age),
        None => "never".to_string(),
    };
    let rows = vec![
        StatusRow {
            key: "config",
            value: status
                .config
                .as_ref()
                .map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string()),
        },
        StatusRow {
            key: "install root",
            value: status.install_root.display().to_string(),
        },
        StatusRow {
            key: "store",
            value: store,
        },
        StatusRow {
            key: "last sync",
            value: last_sync,
        },
        StatusRow {
            key: "pending scripts",
            value: status.pending_scripts.to_string(),
        },
        StatusRow {
            key: "pending assets",
            value: status.pending_assets.to_string(),
        },
        StatusRow {
            key: "config patch",
            value: if status.patch_pending { "pending" } else { "applied" }.to_string(),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if status.pending_scripts + status.pending_assets > 0 {
        println!("{}", "Run 'stagehand sync' to stage pending changes.".yellow());
    }
}

fn format_age(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
