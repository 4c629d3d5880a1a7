//! Change detection for `stagehand-detector`.
//!
//! `detect(scripts, assets, watermark)` enumerates locally-authored units and
//! keeps the ones touched after the watermark:
//!
//! - scripts: regular files directly under the scripts root
//! - assets: immediate subdirectories of the assets root that contain at least
//!   one file (at any depth) newer than the watermark and whose descriptor
//!   yields an asset id
//!
//! Detection only reads; nothing on disk is modified.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use stagehand_core::{
    descriptor::{self, DESCRIPTOR_FILE},
    Asset, ChangeSet, Script, Watermark,
};
use thiserror::Error;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors from change detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk asset bundle: {0}")]
    Walk(#[from] walkdir::Error),
}

impl DetectError {
    /// `true` when the underlying failure is an OS permission refusal.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            DetectError::Io { source, .. } => {
                source.kind() == std::io::ErrorKind::PermissionDenied
            }
            DetectError::Walk(err) => err
                .io_error()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied),
        }
    }
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DetectError {
    DetectError::Io {
        path: path.into(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the change set for one run.
///
/// A missing root contributes no units.
pub fn detect(
    scripts_dir: &Path,
    assets_dir: &Path,
    watermark: Watermark,
) -> Result<ChangeSet, DetectError> {
    let scripts = detect_scripts(scripts_dir, watermark)?;
    let assets = detect_assets(assets_dir, watermark)?;
    tracing::info!(
        "detected {} script(s) and {} asset(s) newer than {}",
        scripts.len(),
        assets.len(),
        watermark
    );
    Ok(ChangeSet { scripts, assets })
}

/// Files directly under `dir` modified strictly after `watermark`, sorted
/// lexicographically by absolute path.
pub fn detect_scripts(dir: &Path, watermark: Watermark) -> Result<Vec<Script>, DetectError> {
    if !dir.is_dir() {
        tracing::debug!("no scripts directory at {}", dir.display());
        return Ok(vec![]);
    }

    // Only the root is canonicalized; a linked script keeps its own name.
    let root = dunce::canonicalize(dir).map_err(|e| io_err(dir, e))?;
    let mut scripts = Vec::new();
    for entry in fs::read_dir(&root).map_err(|e| io_err(&root, e))? {
        let entry = entry.map_err(|e| io_err(&root, e))?;
        let path = root.join(entry.file_name());
        let meta = fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().map_err(|e| io_err(&path, e))?;
        if watermark.is_older_than(modified) {
            scripts.push(Script::new(path));
        }
    }

    scripts.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
    Ok(scripts)
}

/// Asset bundles under `dir` with content newer than `watermark`.
///
/// Bundles are visited in file-name order; the first bundle carrying a given
/// asset id wins and later ones are dropped. The result is ordered by display
/// name, case-insensitively, keeping visit order among equal names.
pub fn detect_assets(dir: &Path, watermark: Watermark) -> Result<Vec<Asset>, DetectError> {
    if !dir.is_dir() {
        tracing::debug!("no assets directory at {}", dir.display());
        return Ok(vec![]);
    }

    let mut seen = HashSet::new();
    let mut assets = Vec::new();
    for bundle in bundle_dirs(dir)? {
        if !contains_files_newer_than(&bundle, watermark)? {
            continue;
        }

        let descriptor_path = bundle.join(DESCRIPTOR_FILE);
        if !descriptor_path.is_file() {
            tracing::debug!("skipping {}: no {DESCRIPTOR_FILE}", bundle.display());
            continue;
        }
        let parsed = match descriptor::read_at(&descriptor_path) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("skipping {}: {err}", bundle.display());
                continue;
            }
        };
        let Some(id) = parsed.id else {
            tracing::warn!(
                "skipping {}: descriptor has no {} line",
                bundle.display(),
                descriptor::ID_KEY
            );
            continue;
        };
        if !seen.insert(id.clone()) {
            tracing::debug!("skipping {}: duplicate of <{id}>", bundle.display());
            continue;
        }

        let name = parsed.name.unwrap_or_else(|| dir_name(&bundle));
        assets.push(Asset::new(id, name, bundle));
    }

    assets.sort_by_cached_key(|asset| asset.name.to_lowercase());
    Ok(assets)
}

/// `true` if any file beneath `dir`, at any depth, is newer than `watermark`.
pub fn contains_files_newer_than(dir: &Path, watermark: Watermark) -> Result<bool, DetectError> {
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let modified = entry
            .metadata()?
            .modified()
            .map_err(|e| io_err(entry.path(), e))?;
        if watermark.is_older_than(modified) {
            return Ok(true);
        }
    }
    Ok(false)
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

/// Bundle directories under `dir`, absolute and in file-name order. Only
/// `dir` itself is canonicalized so linked bundles keep their own names.
fn bundle_dirs(dir: &Path) -> Result<Vec<PathBuf>, DetectError> {
    let root = dunce::canonicalize(dir).map_err(|e| io_err(dir, e))?;
    let mut names: Vec<_> = fs::read_dir(&root)
        .map_err(|e| io_err(&root, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name())
        .collect();
    names.sort();
    Ok(names.into_iter().map(|name| root.join(name)).collect())
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
