//! Persisted watermark: one line of whole seconds since the Unix epoch.
//!
//! The marker file is dot-prefixed and, on Windows, also carries the hidden
//! attribute.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use stagehand_core::Watermark;

use crate::error::{io_err, SyncError};

/// Load the watermark at `path`. A missing file is a first run.
///
/// Unparseable content is treated like a missing file so the next run
/// re-stages everything rather than failing.
pub fn load_at(path: &Path) -> Result<Watermark, SyncError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::info!("no watermark at {}, treating as first run", path.display());
            return Ok(Watermark::EPOCH);
        }
        Err(err) => return Err(io_err(path, err)),
    };

    match text.trim().parse::<i64>() {
        Ok(secs) => Ok(Watermark::from_secs(secs)),
        Err(err) => {
            tracing::warn!(
                "ignoring unreadable watermark at {} ({err}), treating as first run",
                path.display()
            );
            Ok(Watermark::EPOCH)
        }
    }
}

/// Write `watermark` to `path` through `<path>.tmp` and a rename.
pub fn save_at(path: &Path, watermark: Watermark) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    {
        let mut file = open_hidden(&tmp).map_err(|e| io_err(&tmp, e))?;
        writeln!(file, "{}", watermark.as_secs()).map_err(|e| io_err(&tmp, e))?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!("watermark {} written to {}", watermark, path.display());
    Ok(())
}

#[cfg(windows)]
fn open_hidden(path: &Path) -> std::io::Result<fs::File> {
    use std::os::windows::fs::OpenOptionsExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .attributes(FILE_ATTRIBUTE_HIDDEN)
        .open(path)
}

#[cfg(not(windows))]
fn open_hidden(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_epoch() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_at(&dir.path().join(".lastinstall")).unwrap(), Watermark::EPOCH);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lastinstall");
        save_at(&path, Watermark::from_secs(1_700_000_123)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "1700000123");
        assert_eq!(load_at(&path).unwrap(), Watermark::from_secs(1_700_000_123));
        assert!(!dir.path().join(".lastinstall.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lastinstall");
        save_at(&path, Watermark::from_secs(10)).unwrap();
        save_at(&path, Watermark::from_secs(20)).unwrap();
        assert_eq!(load_at(&path).unwrap(), Watermark::from_secs(20));
    }

    #[test]
    fn garbage_is_treated_as_first_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".lastinstall");
        fs::write(&path, "yesterday\n").unwrap();
        assert_eq!(load_at(&path).unwrap(), Watermark::EPOCH);
    }
}
