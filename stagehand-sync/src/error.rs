//! Error types for stagehand-sync.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use stagehand_core::CoreError;
use stagehand_daemon::DaemonError;
use stagehand_detector::DetectError;
use stagehand_store::StoreError;

/// All errors that can end a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The OS refused access while staging. Fatal; nothing further is written.
    #[error("permission denied at {path}: {source}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("daemon control error: {0}")]
    Daemon(#[from] DaemonError),

    #[error("change detection failed: {0}")]
    Detect(#[from] DetectError),

    #[error("configuration error: {0}")]
    Core(#[from] CoreError),

    /// The user asked to stop; observed at a unit boundary.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn is_permission_denied(&self) -> bool {
        match self {
            SyncError::PermissionDenied { .. } => true,
            SyncError::Detect(err) => err.is_permission_denied(),
            _ => false,
        }
    }
}

/// Build an I/O error for `path`, routing permission refusals to
/// [`SyncError::PermissionDenied`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    let path = path.into();
    if source.kind() == ErrorKind::PermissionDenied {
        SyncError::PermissionDenied { path, source }
    } else {
        SyncError::Io { path, source }
    }
}

pub(crate) fn walk_err(err: walkdir::Error) -> SyncError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    io_err(path, err.into())
}
