//! Progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Orchestration states, in the order a full run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    LoadingWatermark,
    Detecting,
    AwaitingDaemonShutdown,
    StagingScripts,
    StagingAssets,
    FinalizingSettings,
    PatchingConfig,
    ReconcilingOpenEdits,
    PersistingWatermark,
    Done,
    Cancelling,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::LoadingWatermark => "loading watermark",
            Phase::Detecting => "detecting changes",
            Phase::AwaitingDaemonShutdown => "waiting for the indexing daemon to exit",
            Phase::StagingScripts => "staging scripts",
            Phase::StagingAssets => "staging assets",
            Phase::FinalizingSettings => "copying settings",
            Phase::PatchingConfig => "patching configuration",
            Phase::ReconcilingOpenEdits => "committing leftover open edits",
            Phase::PersistingWatermark => "saving watermark",
            Phase::Done => "done",
            Phase::Cancelling => "cancelling",
        }
    }
}

/// Receives orchestration events. All methods default to no-ops.
pub trait ProgressSink {
    fn on_phase(&self, _phase: Phase) {}

    /// Called after each completed unit. `completed` only grows.
    fn on_progress(&self, _completed: usize, _total: usize) {}

    /// Called before an asset is staged, with its display label.
    fn on_unit(&self, _label: &str) {}
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Shared cancellation flag, checked by the orchestrator at unit boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Rounded percentage for display; an empty total counts as complete.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (completed as f64 * 100.0 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_shared_between_clones() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(5, 5), 100);
    }
}
