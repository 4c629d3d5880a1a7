//! Configuration and layout shared by every command that touches a product
//! installation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use stagehand_core::{config, Config, Layout};
use stagehand_daemon::{ProcessControl, SystemProcesses};
use stagehand_store::{ProcessInvoker, StoreClient};

/// Positional install root shared by the installation-facing commands.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Product installation directory (overrides `install_root` in the config).
    #[arg(value_name = "INSTALL_ROOT")]
    pub install_root: Option<PathBuf>,
}

/// Resolved configuration for one invocation.
#[derive(Debug)]
pub struct Session {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub install_root: PathBuf,
    pub layout: Layout,
}

impl Session {
    pub fn open(config_arg: Option<&Path>, target: &TargetArgs) -> Result<Self> {
        let (config, config_path) =
            config::resolve(config_arg).context("failed to load configuration")?;
        if let Some(path) = &config_path {
            tracing::debug!(config = %path.display(), "configuration loaded");
        }

        let Some(install_root) = target
            .install_root
            .clone()
            .or_else(|| config.install_root.clone())
        else {
            bail!("no installation directory: pass INSTALL_ROOT or set `install_root` in the configuration");
        };
        if !install_root.is_dir() {
            bail!("installation directory {} does not exist", install_root.display());
        }

        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let layout = config.layout(&cwd, &install_root);
        Ok(Self {
            config,
            config_path,
            install_root,
            layout,
        })
    }

    /// Store client for the configured executable. Fails if it is missing.
    pub fn store(&self) -> Result<StoreClient<ProcessInvoker>> {
        let exe = &self.layout.store_executable;
        if !exe.is_file() {
            bail!(
                "store executable not found at {}; is {} a product installation?",
                exe.display(),
                self.install_root.display()
            );
        }
        let invoker = ProcessInvoker::new(exe, self.config.store.timeout())
            .context("failed to start store runtime")?;
        Ok(StoreClient::new(invoker))
    }

    /// Refuse to continue while the host application is running.
    pub fn ensure_host_closed(&self, processes: &SystemProcesses) -> Result<()> {
        let Some(host) = self.config.host_process.as_deref() else {
            return Ok(());
        };
        if processes
            .is_running(host)
            .with_context(|| format!("failed to check whether {host} is running"))?
        {
            bail!("{host} is running; close it before syncing");
        }
        Ok(())
    }
}
