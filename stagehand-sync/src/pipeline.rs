//! Sync orchestration.
//!
//! ## One run
//!
//! 1. Load the watermark and detect changed units. Nothing changed: stop.
//! 2. Scripts: stop the indexing daemon if it runs, replace every changed
//!    script, then ask the store to echo the daemon's ready line.
//! 3. Assets, one at a time: open for edit and overwrite the edit directory,
//!    or install from the source path when the store refuses; then commit.
//! 4. Copy settings overrides and patch the module configuration.
//! 5. Reconcile leftover open edits.
//! 6. Persist the new watermark.
//!
//! Cancellation is observed after every script and every asset. A cancelled
//! run stops where it is and leaves the watermark untouched.

use serde::Serialize;

use stagehand_core::config::PatchSettings;
use stagehand_core::{Asset, ChangeSet, Config, FailureLedger, Layout, Script, Watermark};
use stagehand_daemon::ProcessControl;
use stagehand_store::AssetStore;

use crate::error::SyncError;
use crate::progress::{CancelToken, NoProgress, Phase, ProgressSink};
use crate::{patch, reconcile, stage, watermark};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncReport {
    /// No unit changed since `watermark`; nothing was touched.
    NothingToDo { watermark: Watermark },
    Completed(RunSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub scripts: usize,
    pub assets: usize,
    /// Assets still open for edit after reconciliation.
    pub failures: FailureLedger,
    /// Whether the store echoed the daemon's ready line. `None` when no
    /// script was staged.
    pub daemon_ready: Option<bool>,
    pub watermark: Watermark,
}

/// Read-only preview of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub watermark: Watermark,
    pub changes: ChangeSet,
    /// Unified diff of the configuration patch, if it would change anything.
    pub patch_diff: Option<String>,
}

/// Detect what a run would stage without touching the store or the disk.
pub fn plan(layout: &Layout, patch_settings: &PatchSettings) -> Result<SyncPlan, SyncError> {
    let watermark = watermark::load_at(&layout.watermark_file)?;
    let changes = stagehand_detector::detect(
        &layout.source_scripts,
        &layout.source_assets,
        watermark,
    )?;
    let patch_diff = patch::preview_at(&layout.patch_file, patch_settings)?;
    Ok(SyncPlan {
        watermark,
        changes,
        patch_diff,
    })
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives one sync run against a store and the local process table.
pub struct Orchestrator<'a> {
    config: &'a Config,
    layout: &'a Layout,
    store: &'a dyn AssetStore,
    processes: &'a dyn ProcessControl,
    progress: &'a dyn ProgressSink,
    cancel: CancelToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        layout: &'a Layout,
        store: &'a dyn AssetStore,
        processes: &'a dyn ProcessControl,
    ) -> Self {
        Self {
            config,
            layout,
            store,
            processes,
            progress: &NoProgress,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the full workflow.
    ///
    /// Returns [`SyncError::Cancelled`] when the cancel token fired; the
    /// watermark is then left as it was.
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        self.progress.on_phase(Phase::LoadingWatermark);
        let previous = watermark::load_at(&self.layout.watermark_file)?;

        self.progress.on_phase(Phase::Detecting);
        let changes = stagehand_detector::detect(
            &self.layout.source_scripts,
            &self.layout.source_assets,
            previous,
        )?;
        if changes.is_empty() {
            tracing::info!("nothing changed since {previous}");
            self.progress.on_phase(Phase::Done);
            return Ok(SyncReport::NothingToDo {
                watermark: previous,
            });
        }

        let total = changes.total_units();
        let mut completed = 0;

        let daemon_ready = if changes.scripts.is_empty() {
            None
        } else {
            let ready = self.stage_scripts(&changes.scripts)?;
            completed += 1;
            self.progress.on_progress(completed, total);
            Some(ready)
        };

        if !changes.assets.is_empty() {
            self.progress.on_phase(Phase::StagingAssets);
        }
        for asset in &changes.assets {
            self.progress.on_unit(&format!("\"{}\" <{}>", asset.name, asset.id));
            self.stage_asset(asset)?;
            self.check_cancelled()?;
            completed += 1;
            self.progress.on_progress(completed, total);
        }

        self.progress.on_phase(Phase::FinalizingSettings);
        stage::copy_settings(&self.layout.source_settings, &self.layout.target_settings)?;

        self.progress.on_phase(Phase::PatchingConfig);
        patch::patch_file_at(&self.layout.patch_file, &self.config.patch)?;

        self.progress.on_phase(Phase::ReconcilingOpenEdits);
        let failures = reconcile(
            &self.layout.open_edits,
            self.store,
            self.config.reconcile.max_attempts,
        )?;

        self.progress.on_phase(Phase::PersistingWatermark);
        let next = Watermark::now();
        watermark::save_at(&self.layout.watermark_file, next)?;

        self.progress.on_phase(Phase::Done);
        tracing::info!(
            "sync complete: {} script(s), {} asset(s), {} failure(s)",
            changes.scripts.len(),
            changes.assets.len(),
            failures.len()
        );
        Ok(SyncReport::Completed(RunSummary {
            scripts: changes.scripts.len(),
            assets: changes.assets.len(),
            failures,
            daemon_ready,
            watermark: next,
        }))
    }

    fn check_cancelled(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            tracing::warn!("cancellation requested, stopping");
            self.progress.on_phase(Phase::Cancelling);
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Scripts
    // -----------------------------------------------------------------------

    fn stage_scripts(&self, scripts: &[Script]) -> Result<bool, SyncError> {
        let daemon = &self.config.daemon.process_name;
        if self.processes.is_running(daemon)? {
            self.progress.on_phase(Phase::AwaitingDaemonShutdown);
            tracing::info!("stopping {daemon} before replacing scripts");
            self.processes.terminate(daemon)?;
            self.processes.wait_for_exit(daemon)?;
        }

        self.progress.on_phase(Phase::StagingScripts);
        for script in scripts {
            stage::replace_file(&script.path, &self.layout.target_scripts)?;
            self.check_cancelled()?;
        }
        tracing::info!("staged {} script(s)", scripts.len());

        let ready = self.store.echo(&self.config.daemon.ready_echo)?;
        if ready {
            tracing::info!("{daemon} restarted");
        } else {
            tracing::warn!("store did not echo {:?}", self.config.daemon.ready_echo);
        }
        Ok(ready)
    }

    // -----------------------------------------------------------------------
    // Assets
    // -----------------------------------------------------------------------

    /// Stage one asset and always attempt its commit afterwards.
    ///
    /// Permission refusals and store faults (timeout, launch) end the run
    /// without a commit. Other staging errors are returned after the commit
    /// attempt.
    fn stage_asset(&self, asset: &Asset) -> Result<(), SyncError> {
        tracing::info!("staging asset \"{}\" <{}>", asset.name, asset.id);

        let staged = self.open_and_replace(asset);
        if let Err(err) = &staged {
            if !matches!(err, SyncError::Io { .. }) {
                return staged;
            }
        }

        let committed = self.commit(asset);
        staged?;
        committed
    }

    fn open_and_replace(&self, asset: &Asset) -> Result<(), SyncError> {
        match self.store.open_for_edit(&asset.id) {
            Ok(Some(edit_dir)) => stage::replace_dir(&asset.path, &edit_dir),
            Ok(None) => {
                tracing::debug!("no edit directory for <{}>, installing", asset.id);
                self.install(asset)
            }
            Err(err) if err.is_rejection() => {
                tracing::debug!("{err}; installing <{}> from source", asset.id);
                self.install(asset)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn install(&self, asset: &Asset) -> Result<(), SyncError> {
        match self.store.install_from_path(&asset.path) {
            Ok(Some(id)) if id != asset.id => {
                tracing::warn!(
                    "installed {} as <{id}>, expected <{}>",
                    asset.path.display(),
                    asset.id
                );
                Ok(())
            }
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                tracing::warn!("store reported no id for {}", asset.path.display());
                Ok(())
            }
            Err(err) if err.is_rejection() => {
                tracing::warn!("install of \"{}\" <{}> rejected: {err}", asset.name, asset.id);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn commit(&self, asset: &Asset) -> Result<(), SyncError> {
        match self.store.commit(&asset.id) {
            Ok(true) => {
                tracing::debug!("committed <{}>", asset.id);
                Ok(())
            }
            Ok(false) => {
                tracing::warn!("commit of <{}> gave no result", asset.id);
                Ok(())
            }
            // Left open; reconciliation retries it.
            Err(err) if err.is_rejection() => {
                tracing::warn!("commit of \"{}\" <{}> rejected: {err}", asset.name, asset.id);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
