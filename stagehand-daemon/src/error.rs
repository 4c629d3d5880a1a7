use thiserror::Error;

/// Error surface for process inspection and control.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed (status {status}): {detail}")]
    ToolFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
        detail: String,
    },
}
