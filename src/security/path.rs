// src/security/path.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::{FileSystem, RealFileSystem};

use super::MAX_PATH_LENGTH;

/// Canonicalize `path`, following every symlink including the last
/// component.
///
/// A path that does not exist yet is resolved through its parent directory
/// with the final component re-attached, so a binary that has not been
/// built can still be checked. The parent must exist.
pub fn canonical_path_with(fs: &dyn FileSystem, path: &Path) -> Result<PathBuf> {
    if fs.exists(path) {
        return fs.canonicalize(path);
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            Ok(fs.canonicalize(parent)?.join(name))
        }
        _ => fs.canonicalize(path),
    }
}

/// [`canonical_path_with`] against the real filesystem.
pub fn canonical_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    canonical_path_with(&RealFileSystem, path.as_ref())
}

/// True if `path` canonicalizes to `base` or a descendant of it, and the
/// canonical form is no longer than [`MAX_PATH_LENGTH`].
///
/// Any canonicalization failure classifies the path as unsafe.
pub fn is_path_safe_with(fs: &dyn FileSystem, path: &Path, base: &Path) -> bool {
    let canonical = match canonical_path_with(fs, path) {
        Ok(p) => p,
        Err(e) => {
            debug!(path = ?path, error = %e, "cannot canonicalize path");
            return false;
        }
    };

    let base = match fs.canonicalize(base) {
        Ok(b) => b,
        Err(e) => {
            debug!(base = ?base, error = %e, "cannot canonicalize base directory");
            return false;
        }
    };

    if canonical.strip_prefix(&base).is_err() {
        debug!(path = ?canonical, base = ?base, "path escapes base directory");
        return false;
    }

    canonical.as_os_str().len() <= MAX_PATH_LENGTH
}

/// [`is_path_safe_with`] on the real filesystem, relative to `base`.
pub fn is_path_safe_in(path: impl AsRef<Path>, base: impl AsRef<Path>) -> bool {
    is_path_safe_with(&RealFileSystem, path.as_ref(), base.as_ref())
}

/// True if `path` stays inside the current working directory.
pub fn is_path_safe(path: impl AsRef<Path>) -> bool {
    match std::env::current_dir() {
        Ok(cwd) => is_path_safe_in(path, cwd),
        Err(_) => false,
    }
}
