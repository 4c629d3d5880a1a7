//! Control of named companion processes.
//!
//! The sync pipeline must stop the indexing daemon before it replaces script
//! files, and the CLI refuses to run while the host application is open. Both
//! go through [`ProcessControl`]; [`SystemProcesses`] is the OS-backed
//! implementation.

mod error;
mod system;
pub mod tasklist;

pub use error::DaemonError;
pub use system::SystemProcesses;

/// Detect, terminate and await processes by image name.
pub trait ProcessControl {
    /// `true` if at least one process named `name` is running.
    fn is_running(&self, name: &str) -> Result<bool, DaemonError>;

    /// Forcefully stop every process named `name`. No match is not an error.
    fn terminate(&self, name: &str) -> Result<(), DaemonError>;

    /// Block until no process named `name` is running.
    fn wait_for_exit(&self, name: &str) -> Result<(), DaemonError>;
}
