use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::Verb;

/// Error surface for store invocations.
///
/// A call that produced no decisive output line is not an error; see
/// [`crate::Outcome::NoResult`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with a `-` line.
    #[error("store rejected {verb}: {message}")]
    Rejected { verb: Verb, message: String },

    #[error("store {verb} timed out after {}s", after.as_secs())]
    Timeout { verb: Verb, after: Duration },

    #[error("failed to launch store executable {program}: {source}")]
    LaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::Rejected { .. })
    }
}
