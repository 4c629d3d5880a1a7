//! Shared test doubles for the orchestrator and reconciliation tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use filetime::{set_file_mtime, FileTime};
use stagehand_core::{AssetId, Config, Layout};
use stagehand_daemon::{DaemonError, ProcessControl};
use stagehand_store::{AssetStore, StoreError, Verb};
use stagehand_sync::{CancelToken, Phase, ProgressSink};
use tempfile::TempDir;

pub const MARK: i64 = 1_700_000_000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn rejected(verb: Verb, message: &str) -> StoreError {
    StoreError::Rejected {
        verb,
        message: message.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// A source working tree plus a product installation, both in one tempdir.
pub struct Fixture {
    _tmp: TempDir,
    pub work: PathBuf,
    pub install: PathBuf,
    pub config: Config,
    pub layout: Layout,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let work = tmp.path().join("work");
        let install = tmp.path().join("install");
        fs::create_dir_all(&work).expect("mkdir work");
        fs::create_dir_all(&install).expect("mkdir install");
        let config = Config::default();
        let layout = config.layout(&work, &install);
        Self {
            _tmp: tmp,
            work,
            install,
            config,
            layout,
        }
    }

    pub fn write(&self, path: &Path, content: &str, mtime: i64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write fixture");
        set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).expect("set mtime");
    }

    pub fn script(&self, name: &str, mtime: i64) {
        self.write(&self.layout.source_scripts.join(name), name, mtime);
    }

    /// Create an asset bundle `dir` with descriptor text `descriptor`.
    pub fn asset(&self, dir: &str, descriptor: &str, mtime: i64) -> PathBuf {
        let path = self.layout.source_assets.join(dir);
        self.write(&path.join("config.txt"), descriptor, mtime);
        path
    }

    /// Create an open-edit directory for `id` in the installation.
    pub fn open_edit(&self, dir: &str, id: &str) -> PathBuf {
        let path = self.layout.open_edits.join(dir);
        fs::create_dir_all(&path).expect("mkdir open edit");
        fs::write(
            path.join("config.txt"),
            format!("kuid <{id}>\nusername \"{dir}\"\n"),
        )
        .expect("write descriptor");
        path
    }

    pub fn set_watermark(&self, secs: i64) {
        fs::write(&self.layout.watermark_file, format!("{secs}\n")).expect("write watermark");
    }

    pub fn watermark_text(&self) -> Option<String> {
        fs::read_to_string(&self.layout.watermark_file).ok()
    }
}

// ---------------------------------------------------------------------------
// Scripted store
// ---------------------------------------------------------------------------

/// In-memory store double.
///
/// `edit_dirs` maps ids the store will open to their edit directory; other
/// ids are rejected. With `remove_on_commit`, a successful commit removes
/// the id's edit directory like the real store does.
#[derive(Default)]
pub struct ScriptedStore {
    pub calls: RefCell<Vec<String>>,
    pub edit_dirs: HashMap<AssetId, PathBuf>,
    pub remove_on_commit: bool,
    pub reject_commits: bool,
    pub timeout_commits: bool,
    pub echo_ok: bool,
    pub cancel_on_commit: Option<CancelToken>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            echo_ok: true,
            remove_on_commit: true,
            ..Self::default()
        }
    }

    pub fn with_edit_dir(mut self, id: &str, dir: PathBuf) -> Self {
        self.edit_dirs.insert(AssetId::from(id), dir);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl AssetStore for ScriptedStore {
    fn install_from_path(&self, path: &Path) -> Result<Option<AssetId>, StoreError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(format!("install {name}"));
        let descriptor = stagehand_core::descriptor::read_at(&path.join("config.txt"))
            .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))?;
        Ok(descriptor.id)
    }

    fn open_for_edit(&self, id: &AssetId) -> Result<Option<PathBuf>, StoreError> {
        self.record(format!("edit {id}"));
        match self.edit_dirs.get(id) {
            Some(dir) => Ok(Some(dir.clone())),
            None => Err(rejected(Verb::Edit, "Asset is not installed")),
        }
    }

    fn commit(&self, id: &AssetId) -> Result<bool, StoreError> {
        self.record(format!("commit {id}"));
        if let Some(token) = &self.cancel_on_commit {
            token.cancel();
        }
        if self.timeout_commits {
            return Err(StoreError::Timeout {
                verb: Verb::Commit,
                after: Duration::from_secs(300),
            });
        }
        if self.reject_commits {
            return Err(rejected(Verb::Commit, "Asset is locked"));
        }
        if self.remove_on_commit {
            if let Some(dir) = self.edit_dirs.get(id) {
                let _ = fs::remove_dir_all(dir);
            }
        }
        Ok(true)
    }

    fn revert(&self, id: &AssetId) -> Result<(), StoreError> {
        self.record(format!("revert {id}"));
        Ok(())
    }

    fn echo(&self, text: &str) -> Result<bool, StoreError> {
        self.record(format!("echo {text}"));
        Ok(self.echo_ok)
    }
}

// ---------------------------------------------------------------------------
// Fake process table
// ---------------------------------------------------------------------------

/// Process table double with a single optionally-running process.
#[derive(Default)]
pub struct FakeProcesses {
    pub running: Cell<bool>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeProcesses {
    pub fn running() -> Self {
        Self {
            running: Cell::new(true),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ProcessControl for FakeProcesses {
    fn is_running(&self, name: &str) -> Result<bool, DaemonError> {
        self.calls.borrow_mut().push(format!("is_running {name}"));
        Ok(self.running.get())
    }

    fn terminate(&self, name: &str) -> Result<(), DaemonError> {
        self.calls.borrow_mut().push(format!("terminate {name}"));
        self.running.set(false);
        Ok(())
    }

    fn wait_for_exit(&self, name: &str) -> Result<(), DaemonError> {
        self.calls.borrow_mut().push(format!("wait {name}"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording progress sink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingProgress {
    pub phases: RefCell<Vec<Phase>>,
    pub progress: RefCell<Vec<(usize, usize)>>,
}

impl ProgressSink for RecordingProgress {
    fn on_phase(&self, phase: Phase) {
        self.phases.borrow_mut().push(phase);
    }

    fn on_progress(&self, completed: usize, total: usize) {
        self.progress.borrow_mut().push((completed, total));
    }
}

/// Fires `token` when the run enters `phase`.
pub struct CancelOnPhase {
    pub phase: Phase,
    pub token: CancelToken,
}

impl ProgressSink for CancelOnPhase {
    fn on_phase(&self, phase: Phase) {
        if phase == self.phase {
            self.token.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Read-only directories
// ---------------------------------------------------------------------------

/// Make `dir` read-only. Returns `false` when the current user can still
/// write into it (root ignores permission bits), in which case the caller
/// should skip.
#[cfg(unix)]
pub fn lock_dir(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).expect("mkdir");
    fs::set_permissions(dir, fs::Permissions::from_mode(0o555)).expect("chmod");
    let sentinel = dir.join(".write-check");
    if fs::write(&sentinel, "").is_ok() {
        let _ = fs::remove_file(&sentinel);
        unlock_dir(dir);
        return false;
    }
    true
}

#[cfg(unix)]
pub fn unlock_dir(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o755));
}
