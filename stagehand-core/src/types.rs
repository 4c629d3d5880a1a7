//! Domain types for a sync run.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Store-assigned unique key of an asset (the text between `<` and `>` of the
/// descriptor's `kuid` line, e.g. `kuid:523:19001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Watermark
// ---------------------------------------------------------------------------

/// Boundary instant, in whole seconds since the Unix epoch, below which units
/// count as already synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(pub i64);

impl Watermark {
    /// First run: every unit is newer than the epoch.
    pub const EPOCH: Watermark = Watermark(0);

    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }

    /// Wall-clock now, truncated to whole seconds.
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// `true` if `modified` lies strictly after this watermark.
    ///
    /// Sub-second precision of `modified` is kept, so a file touched half a
    /// second after the watermark counts as newer while one stamped exactly on
    /// it does not.
    pub fn is_older_than(self, modified: SystemTime) -> bool {
        modified > self.instant()
    }

    /// The watermark as a [`SystemTime`]. Negative values clamp to the epoch.
    pub fn instant(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.0.max(0) as u64)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.0, 0)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Content units
// ---------------------------------------------------------------------------

/// A flat script file, identified by its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub path: PathBuf,
}

impl Script {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name used for the staged copy under the store's script directory.
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}

/// A directory bundle identified by its descriptor's asset id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Human-readable name from the descriptor (`username` / `asset-filename`).
    pub name: String,
    /// Absolute path to the bundle directory.
    pub path: PathBuf,
}

impl Asset {
    pub fn new(id: impl Into<AssetId>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Borrowed view over either kind of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentUnit<'a> {
    Script(&'a Script),
    Asset(&'a Asset),
}

impl ContentUnit<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentUnit::Script(_) => "script",
            ContentUnit::Asset(_) => "asset",
        }
    }

    /// `file.gs` for scripts, `Name <kuid:…>` for assets.
    pub fn label(&self) -> String {
        match self {
            ContentUnit::Script(script) => script
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| script.path.display().to_string()),
            ContentUnit::Asset(asset) => format!("{} <{}>", asset.name, asset.id),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ContentUnit::Script(script) => &script.path,
            ContentUnit::Asset(asset) => &asset.path,
        }
    }
}

// ---------------------------------------------------------------------------
// Change set
// ---------------------------------------------------------------------------

/// Units modified after the watermark, in staging order: scripts
/// (lexicographic by path) then assets (case-insensitive by display name).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub scripts: Vec<Script>,
    pub assets: Vec<Asset>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.assets.is_empty()
    }

    /// Progress units: the whole script batch counts once, each asset once.
    pub fn total_units(&self) -> usize {
        if self.scripts.is_empty() {
            self.assets.len()
        } else {
            self.assets.len() + 1
        }
    }

    /// Every unit in staging order.
    pub fn units(&self) -> impl Iterator<Item = ContentUnit<'_>> {
        self.scripts
            .iter()
            .map(ContentUnit::Script)
            .chain(self.assets.iter().map(ContentUnit::Asset))
    }
}

// ---------------------------------------------------------------------------
// Failure ledger
// ---------------------------------------------------------------------------

/// Asset ids that stayed open for edit after every commit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureLedger(Vec<AssetId>);

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` once; repeated records are ignored.
    pub fn record(&mut self, id: AssetId) {
        if !self.0.contains(&id) {
            self.0.push(id);
        }
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.0.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetId> {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
