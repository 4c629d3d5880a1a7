//! Line-offset patch of the product's module settings.
//!
//! The file is treated as an ordered sequence of lines. The first line
//! containing the marker anchors the edit; on the line `offset` lines below
//! it the first `0` becomes `1`. Every other byte, line endings included, is
//! preserved.
//!
//! ```text
//! legacy-support-mode        <- marker
//! {
//!   enabled 0                <- marker + 2: becomes "enabled 1"
//! }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use similar::TextDiff;

use stagehand_core::config::PatchSettings;

use crate::error::{io_err, SyncError};

/// What a patch did, or why it did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// A `0` was flipped on `line` (zero-based).
    Applied { line: usize },
    /// The target line has no `0` left to flip.
    AlreadySet { line: usize },
    MarkerMissing,
    /// The marker sits too close to the end of the file.
    TargetMissing,
    /// The file to patch does not exist.
    FileMissing,
}

/// Apply the patch to `content`, returning the new text and the outcome.
pub fn patch_text(content: &str, marker: &str, offset: usize) -> (String, PatchOutcome) {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    let Some(anchor) = lines.iter().position(|line| line.contains(marker)) else {
        return (content.to_string(), PatchOutcome::MarkerMissing);
    };
    let target = anchor + offset;
    let Some(line) = lines.get(target) else {
        return (content.to_string(), PatchOutcome::TargetMissing);
    };
    if !line.contains('0') {
        return (content.to_string(), PatchOutcome::AlreadySet { line: target });
    }

    let mut out = String::with_capacity(content.len());
    for (i, line) in lines.iter().enumerate() {
        if i == target {
            out.push_str(&line.replacen('0', "1", 1));
        } else {
            out.push_str(line);
        }
    }
    (out, PatchOutcome::Applied { line: target })
}

/// Patch the file at `path` in place via `<path>.tmp` and a rename.
///
/// The file is only rewritten when a `0` was actually flipped.
pub fn patch_file_at(path: &Path, settings: &PatchSettings) -> Result<PatchOutcome, SyncError> {
    let Some(content) = read_if_exists(path)? else {
        tracing::warn!("configuration patch skipped: {} not found", path.display());
        return Ok(PatchOutcome::FileMissing);
    };

    let (patched, outcome) = patch_text(&content, &settings.marker, settings.offset);
    match outcome {
        PatchOutcome::Applied { line } => {
            let tmp = PathBuf::from(format!("{}.tmp", path.display()));
            fs::write(&tmp, patched).map_err(|e| io_err(&tmp, e))?;
            if let Err(e) = fs::rename(&tmp, path) {
                let _ = fs::remove_file(&tmp);
                return Err(io_err(path, e));
            }
            tracing::info!("patched {} (line {})", path.display(), line + 1);
        }
        other => {
            tracing::info!("configuration patch not applied to {}: {other:?}", path.display());
        }
    }
    Ok(outcome)
}

/// Unified diff of the patch against the file at `path`, or `None` if the
/// patch would change nothing.
pub fn preview_at(path: &Path, settings: &PatchSettings) -> Result<Option<String>, SyncError> {
    let Some(content) = read_if_exists(path)? else {
        return Ok(None);
    };
    let (patched, outcome) = patch_text(&content, &settings.marker, settings.offset);
    if !matches!(outcome, PatchOutcome::Applied { .. }) {
        return Ok(None);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let diff = TextDiff::from_lines(&content, &patched)
        .unified_diff()
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .context_radius(2)
        .to_string();
    Ok(Some(diff))
}

fn read_if_exists(path: &Path) -> Result<Option<String>, SyncError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}
