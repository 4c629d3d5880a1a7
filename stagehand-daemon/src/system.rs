use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use crate::error::DaemonError;
use crate::ProcessControl;

/// [`ProcessControl`] backed by the platform's process tools: `pgrep`/`pkill`
/// on Unix, `tasklist`/`taskkill` on Windows.
#[derive(Debug, Clone)]
pub struct SystemProcesses {
    poll_interval: Duration,
}

impl Default for SystemProcesses {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl SystemProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interval between checks in [`ProcessControl::wait_for_exit`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl ProcessControl for SystemProcesses {
    fn is_running(&self, name: &str) -> Result<bool, DaemonError> {
        let running = platform::is_running(name)?;
        tracing::debug!(process = name, running, "process lookup");
        Ok(running)
    }

    fn terminate(&self, name: &str) -> Result<(), DaemonError> {
        tracing::info!(process = name, "terminating process");
        platform::terminate(name)
    }

    fn wait_for_exit(&self, name: &str) -> Result<(), DaemonError> {
        while platform::is_running(name)? {
            tracing::debug!(process = name, "waiting for process to exit");
            thread::sleep(self.poll_interval);
        }
        tracing::info!(process = name, "process exited");
        Ok(())
    }
}

fn run_tool(tool: &'static str, args: &[&str]) -> Result<Output, DaemonError> {
    Command::new(tool)
        .args(args)
        .output()
        .map_err(|source| DaemonError::Spawn { tool, source })
}

fn tool_failed(tool: &'static str, output: &Output) -> DaemonError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    DaemonError::ToolFailed {
        tool,
        status: output.status,
        detail: format!("{stdout} {stderr}").trim().to_string(),
    }
}

#[cfg(unix)]
mod platform {
    use super::{run_tool, tool_failed};
    use crate::error::DaemonError;

    // pgrep/pkill: 0 = matched, 1 = nothing matched, anything else = error.
    pub fn is_running(name: &str) -> Result<bool, DaemonError> {
        let output = run_tool("pgrep", &["-x", name])?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(tool_failed("pgrep", &output)),
        }
    }

    /// `pkill` arguments for a SIGTERM request.
    pub fn terminate_args(name: &str) -> [&str; 3] {
        ["-TERM", "-x", name]
    }

    pub fn terminate(name: &str) -> Result<(), DaemonError> {
        let output = run_tool("pkill", &terminate_args(name))?;
        match output.status.code() {
            Some(0) | Some(1) => Ok(()),
            _ => Err(tool_failed("pkill", &output)),
        }
    }
}

#[cfg(windows)]
mod platform {
    use super::{run_tool, tool_failed};
    use crate::error::DaemonError;
    use crate::tasklist::{contains_image, image_name};

    pub fn is_running(name: &str) -> Result<bool, DaemonError> {
        let image = image_name(name);
        let filter = format!("IMAGENAME eq {image}");
        let output = run_tool("tasklist", &["/FI", &filter, "/FO", "CSV", "/NH"])?;
        if !output.status.success() {
            return Err(tool_failed("tasklist", &output));
        }
        Ok(contains_image(&String::from_utf8_lossy(&output.stdout), &image))
    }

    pub fn terminate(name: &str) -> Result<(), DaemonError> {
        if !is_running(name)? {
            return Ok(());
        }
        // Without /F this is a close request, not a forced kill.
        let image = image_name(name);
        let output = run_tool("taskkill", &["/IM", &image])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(tool_failed("taskkill", &output))
        }
    }
}
