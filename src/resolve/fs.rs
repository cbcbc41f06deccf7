//! Filesystem access and path normalization.
//!
//! - [`FileSystem`]: the existence/read seam the resolver and reloader use
//! - [`RealFs`]: `std::fs`-backed implementation
//! - [`normalize_path`] / [`normalize_lexically`]: cache-key normalization

use std::io;
use std::path::{Component, Path, PathBuf};

/// Filesystem operations needed to resolve and read modules.
pub trait FileSystem: Send + Sync {
    /// Whether a regular file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Read the whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Turn an absolute path into its cache key.
    fn normalize(&self, path: &Path) -> PathBuf {
        normalize_lexically(path)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        normalize_path(path)
    }
}

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Lexical normalization if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            normalize_lexically(path)
        } else {
            std::env::current_dir().map_or_else(
                |_| normalize_lexically(path),
                |cwd| normalize_lexically(&cwd.join(path)),
            )
        }
    })
}

/// Remove `.` components and fold `..` into its parent, without touching disk.
///
/// A `..` that would climb above the root (or above the start of a relative
/// path) is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
