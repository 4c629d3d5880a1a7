//! Process exit codes.

use std::process::ExitCode;

use stagehand_sync::SyncError;

pub const SUCCESS: u8 = 0;
pub const FAILURE: u8 = 1;
pub const FAILURES_RECORDED: u8 = 2;
pub const NOTHING_TO_DO: u8 = 3;
pub const PERMISSION_DENIED: u8 = 77;
pub const CANCELLED: u8 = 130;

/// How a command finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The run completed but some assets could not be committed.
    FailuresRecorded,
    NothingToDo,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(match self {
            Outcome::Success => SUCCESS,
            Outcome::FailuresRecorded => FAILURES_RECORDED,
            Outcome::NothingToDo => NOTHING_TO_DO,
        })
    }
}

/// Exit code for a failed command, looking through `anyhow` context for the
/// underlying [`SyncError`].
pub fn code_for_error(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SyncError>() {
        Some(SyncError::Cancelled) => CANCELLED,
        Some(sync) if sync.is_permission_denied() => PERMISSION_DENIED,
        _ => FAILURE,
    }
}
