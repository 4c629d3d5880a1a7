//! # stagehand-sync
//!
//! Incremental staging of changed scripts and assets into the content store.
//!
//! [`Orchestrator::run`] drives one full sync: watermark, detection, script
//! and asset staging, settings finalization, configuration patch,
//! reconciliation of leftover open edits and finally the new watermark.
//! [`plan`] performs the read-only half of that for previews.

pub mod error;
pub mod patch;
pub mod pipeline;
pub mod progress;
pub mod reconcile;
pub mod stage;
pub mod watermark;

pub use error::SyncError;
pub use pipeline::{plan, Orchestrator, RunSummary, SyncPlan, SyncReport};
pub use progress::{CancelToken, NoProgress, Phase, ProgressSink};
pub use reconcile::reconcile;
