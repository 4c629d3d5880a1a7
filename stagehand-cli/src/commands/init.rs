//! `stagehand init`: write a default configuration file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use stagehand_core::{config, Config};

use crate::exit::Outcome;

/// Arguments for `stagehand init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Product installation directory to record in the file.
    #[arg(long, value_name = "PATH")]
    pub install_root: Option<PathBuf>,

    /// Write ~/.stagehand/config.yaml instead of ./stagehand.yaml.
    #[arg(long)]
    pub user: bool,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, config_arg: Option<&Path>) -> Result<Outcome> {
        let path = match (config_arg, self.user) {
            (Some(explicit), _) => explicit.to_path_buf(),
            (None, true) => {
                config::user_config_path_at(&config::home().context("cannot locate home")?)
            }
            (None, false) => std::env::current_dir()
                .context("cannot determine current directory")?
                .join(config::LOCAL_CONFIG_FILE),
        };
        if path.exists() && !self.force {
            bail!("{} already exists; pass --force to overwrite", path.display());
        }

        let config = Config {
            install_root: self.install_root,
            host_process: Some("trainz".to_string()),
            ..Config::default()
        };
        config::save_at(&path, &config)
            .with_context(|| format!("failed to write {}", path.display()))?;

        println!("✓ wrote {}", path.display());
        Ok(Outcome::Success)
    }
}
