//! Transport: run the store executable once and collect its output.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::runtime::Runtime;

use crate::error::StoreError;
use crate::protocol::Verb;

/// Runs one store command and returns its standard output.
///
/// Output interpretation lives in [`crate::StoreClient`]; implementors only
/// move bytes.
pub trait Invoker {
    fn run(&self, verb: Verb, args: &[&OsStr]) -> Result<String, StoreError>;
}

/// Spawns the store executable as a child process.
///
/// Each call blocks on a private current-thread runtime so the caller stays
/// synchronous. A child still running when the timeout elapses is killed.
pub struct ProcessInvoker {
    program: PathBuf,
    timeout: Duration,
    runtime: Runtime,
}

impl ProcessInvoker {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            program: program.into(),
            timeout,
            runtime,
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn run_async(&self, verb: Verb, args: &[&OsStr]) -> Result<String, StoreError> {
        let child = Command::new(&self.program)
            .arg(verb.as_str())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StoreError::LaunchFailed {
                program: self.program.clone(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(StoreError::Timeout {
                    verb,
                    after: self.timeout,
                })
            }
        };

        if !output.status.success() {
            tracing::debug!(verb = %verb, status = %output.status, "store exited unsuccessfully");
        }
        if !output.stderr.is_empty() {
            tracing::debug!(
                verb = %verb,
                stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
                "store wrote to stderr"
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Invoker for ProcessInvoker {
    fn run(&self, verb: Verb, args: &[&OsStr]) -> Result<String, StoreError> {
        let started = Instant::now();
        let result = self.runtime.block_on(self.run_async(verb, args));
        tracing::debug!(
            verb = %verb,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "store call finished"
        );
        result
    }
}
