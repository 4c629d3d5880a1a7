//! Commit retries for assets the store still holds open for editing.

use std::fs;
use std::path::{Path, PathBuf};

use stagehand_core::descriptor::{self, DESCRIPTOR_FILE};
use stagehand_core::FailureLedger;
use stagehand_store::AssetStore;

use crate::error::{io_err, SyncError};

/// Try to commit every asset left in `open_edits`.
///
/// Each subdirectory carrying a descriptor gets up to `max_attempts` commit
/// calls; the store removes the directory once a commit lands. A directory
/// that survives the last attempt puts its asset id in the returned ledger.
/// Store rejections are logged and retried. Timeouts and launch failures end
/// the pass.
pub fn reconcile(
    open_edits: &Path,
    store: &dyn AssetStore,
    max_attempts: u32,
) -> Result<FailureLedger, SyncError> {
    let mut ledger = FailureLedger::new();
    if !open_edits.is_dir() {
        tracing::debug!("no open-edit area at {}", open_edits.display());
        return Ok(ledger);
    }

    let attempts = max_attempts.max(1);
    for dir in subdirectories(open_edits)? {
        let descriptor_path = dir.join(DESCRIPTOR_FILE);
        if !descriptor_path.is_file() {
            continue;
        }
        let parsed = match descriptor::read_at(&descriptor_path) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("skipping open edit {}: {err}", dir.display());
                continue;
            }
        };
        let Some(id) = parsed.id else {
            tracing::warn!(
                "skipping open edit {}: descriptor has no {} line",
                dir.display(),
                descriptor::ID_KEY
            );
            continue;
        };
        let name = parsed.name.unwrap_or_default();

        for attempt in 1..=attempts {
            match store.commit(&id) {
                Ok(_) => {}
                Err(err) if err.is_rejection() => {
                    tracing::warn!(
                        "failed to commit asset \"{name}\" <{id}> (attempt {attempt}/{attempts}): {err}"
                    );
                }
                Err(err) => return Err(err.into()),
            }

            if !dir.exists() {
                tracing::info!("committed leftover asset \"{name}\" <{id}>");
                break;
            }
            if attempt == attempts {
                tracing::warn!("asset \"{name}\" <{id}> is still open after {attempts} attempt(s)");
                ledger.record(id.clone());
            }
        }
    }

    Ok(ledger)
}

fn subdirectories(root: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| io_err(root, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}
