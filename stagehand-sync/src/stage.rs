//! Filesystem staging: replacing files and bundle directories in the
//! product installation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{io_err, walk_err, SyncError};

/// Copy `src` into `dest_dir` under its own file name, deleting any existing
/// file first. Returns the destination path.
pub fn replace_file(src: &Path, dest_dir: &Path) -> Result<PathBuf, SyncError> {
    let name = src
        .file_name()
        .ok_or_else(|| io_err(src, std::io::Error::from(ErrorKind::InvalidInput)))?;
    let dest = dest_dir.join(name);

    fs::create_dir_all(dest_dir).map_err(|e| io_err(dest_dir, e))?;
    remove_file_if_exists(&dest)?;
    fs::copy(src, &dest).map_err(|e| io_err(&dest, e))?;
    tracing::debug!("copied {} -> {}", src.display(), dest.display());
    Ok(dest)
}

/// Replace the directory `dest` with a deep copy of `src`.
pub fn replace_dir(src: &Path, dest: &Path) -> Result<(), SyncError> {
    match fs::remove_dir_all(dest) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(dest, e)),
    }
    copy_tree(src, dest)?;
    tracing::debug!("replaced {} with {}", dest.display(), src.display());
    Ok(())
}

/// Recursively copy `src` to `dest`, creating directories as needed and
/// overwriting files that already exist.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<(), SyncError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(walk_err)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| io_err(entry.path(), std::io::Error::from(ErrorKind::InvalidInput)))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_err(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| io_err(&target, e))?;
        }
    }
    Ok(())
}

/// Copy every regular file directly under `src` into `dest`, replacing files
/// of the same name. A missing `src` copies nothing. Returns the file count.
pub fn copy_settings(src: &Path, dest: &Path) -> Result<usize, SyncError> {
    if !src.is_dir() {
        tracing::debug!("no settings overrides at {}", src.display());
        return Ok(0);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(src)
        .map_err(|e| io_err(src, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    for file in &files {
        replace_file(file, dest)?;
    }
    if !files.is_empty() {
        tracing::info!("copied {} settings file(s) to {}", files.len(), dest.display());
    }
    Ok(files.len())
}

fn remove_file_if_exists(path: &Path) -> Result<(), SyncError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path, e)),
    }
}
