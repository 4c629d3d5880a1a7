//! YAML configuration and the resolved filesystem layout of a run.
//!
//! # Lookup order
//!
//! 1. an explicit path (`--config`), which must exist
//! 2. `<cwd>/stagehand.yaml`
//! 3. `<home>/.stagehand/config.yaml`
//! 4. built-in defaults
//!
//! Every field is optional in the file; missing fields take the defaults below,
//! which describe the classic layout of an installer shipped next to its
//! content:
//!
//! ```text
//! <source root>/                     <install root>/
//!   .lastinstall                       bin/TrainzUtil(.exe)
//!   scripts/*.gs          ──copy──▶    scripts/
//!   UserData/editing/<bundle>/  ─────▶ UserData/editing/<open-for-edit>/
//!   UserData/settings/*   ──copy──▶    UserData/settings/ (globalmodule.txt patched)
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "stagehand.yaml";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Installation directory of the product owning the store. Usually given on
    /// the command line instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_root: Option<PathBuf>,
    /// Application that must not be running while a sync is in progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_process: Option<String>,
    pub source: SourceLayout,
    pub target: TargetLayout,
    pub store: StoreSettings,
    pub daemon: DaemonSettings,
    pub patch: PatchSettings,
    pub reconcile: ReconcileSettings,
}

/// Locally-authored content, relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    pub root: PathBuf,
    pub scripts: PathBuf,
    pub assets: PathBuf,
    pub settings: PathBuf,
    pub watermark: PathBuf,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            scripts: PathBuf::from("scripts"),
            assets: PathBuf::from("UserData").join("editing"),
            settings: PathBuf::from("UserData").join("settings"),
            watermark: PathBuf::from(".lastinstall"),
        }
    }
}

/// Store-owned directories, relative to the install root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetLayout {
    pub scripts: PathBuf,
    pub open_edits: PathBuf,
    pub settings: PathBuf,
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self {
            scripts: PathBuf::from("scripts"),
            open_edits: PathBuf::from("UserData").join("editing"),
            settings: PathBuf::from("UserData").join("settings"),
        }
    }
}

/// External store command-line tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Executable, relative to the install root unless absolute.
    pub executable: PathBuf,
    /// Hard bound on a single invocation.
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        let exe = if cfg!(windows) {
            "TrainzUtil.exe"
        } else {
            "TrainzUtil"
        };
        Self {
            executable: PathBuf::from("bin").join(exe),
            timeout_secs: 300,
        }
    }
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Indexing daemon that must be stopped before scripts are replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    pub process_name: String,
    /// Text echoed through the store once scripts are staged.
    pub ready_echo: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            process_name: "TADDaemon".to_string(),
            ready_echo: "TADDaemon started!".to_string(),
        }
    }
}

/// Line-offset patch applied to one configuration file after staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchSettings {
    /// File to patch, relative to the install root.
    pub file: PathBuf,
    pub marker: String,
    /// Distance in lines from the marker line to the rewritten line.
    pub offset: usize,
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("UserData")
                .join("settings")
                .join("globalmodule.txt"),
            marker: "legacy-support-mode".to_string(),
            offset: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSettings {
    pub max_attempts: u32,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

// ---------------------------------------------------------------------------
// Resolved layout
// ---------------------------------------------------------------------------

/// Absolute paths for one run, derived from [`Config`] plus an install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub source_scripts: PathBuf,
    pub source_assets: PathBuf,
    pub source_settings: PathBuf,
    pub watermark_file: PathBuf,
    pub target_scripts: PathBuf,
    pub open_edits: PathBuf,
    pub target_settings: PathBuf,
    pub store_executable: PathBuf,
    pub patch_file: PathBuf,
}

impl Config {
    /// Resolve every path. A relative source root is taken relative to `cwd`.
    pub fn layout(&self, cwd: &Path, install_root: &Path) -> Layout {
        let source_root = cwd.join(&self.source.root);
        Layout {
            source_scripts: source_root.join(&self.source.scripts),
            source_assets: source_root.join(&self.source.assets),
            source_settings: source_root.join(&self.source.settings),
            watermark_file: source_root.join(&self.source.watermark),
            target_scripts: install_root.join(&self.target.scripts),
            open_edits: install_root.join(&self.target.open_edits),
            target_settings: install_root.join(&self.target.settings),
            store_executable: install_root.join(&self.store.executable),
            patch_file: install_root.join(&self.patch.file),
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load a configuration file.
///
/// Returns `CoreError::ConfigNotFound` if absent,
/// `CoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<Config, CoreError> {
    if !path.exists() {
        return Err(CoreError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Save a configuration file atomically (`<path>.tmp` + rename).
pub fn save_at(path: &Path, config: &Config) -> Result<(), CoreError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// `<home>/.stagehand/config.yaml`. Pure, no I/O.
pub fn user_config_path_at(home: &Path) -> PathBuf {
    home.join(".stagehand").join("config.yaml")
}

/// Find and load the effective configuration.
///
/// Returns the config and the file it came from (`None` for built-in defaults).
pub fn resolve_at(
    explicit: Option<&Path>,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<(Config, Option<PathBuf>), CoreError> {
    if let Some(path) = explicit {
        return Ok((load_at(path)?, Some(path.to_path_buf())));
    }

    let mut candidates = vec![cwd.join(LOCAL_CONFIG_FILE)];
    if let Some(home) = home {
        candidates.push(user_config_path_at(home));
    }

    for candidate in candidates {
        if candidate.is_file() {
            return Ok((load_at(&candidate)?, Some(candidate)));
        }
    }
    Ok((Config::default(), None))
}

/// `resolve_at` convenience wrapper over the process cwd and `dirs::home_dir()`.
pub fn resolve(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>), CoreError> {
    let cwd = std::env::current_dir().map_err(|e| io_err(".", e))?;
    let home = dirs::home_dir();
    resolve_at(explicit, &cwd, home.as_deref())
}

/// Home directory, or [`CoreError::HomeNotFound`].
pub fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
