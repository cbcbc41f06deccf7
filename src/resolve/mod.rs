//! Specifier resolution with extension probing.
//!
//! Tries, in order:
//! 1. the specifier as given (joined with the base unless absolute)
//! 2. the same path with each configured extension appended
//!
//! The first existing file wins. Appending is plain string concatenation, so
//! `util.test` with `.json` probes `util.test.json`, never `util.json`.

mod fs;

pub use fs::{FileSystem, RealFs, normalize_lexically, normalize_path};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::debug;
use crate::error::ReloadError;

/// A successfully resolved specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Normalized absolute path; the module cache key.
    pub path: PathBuf,
    /// Candidates probed before (and including) the hit.
    pub tried: Vec<PathBuf>,
}

/// Resolves specifiers against a base directory.
pub struct Resolver<'a> {
    fs: &'a dyn FileSystem,
    extensions: &'a [String],
}

impl<'a> Resolver<'a> {
    pub fn new(fs: &'a dyn FileSystem, extensions: &'a [String]) -> Self {
        Self { fs, extensions }
    }

    /// Resolve `specifier` relative to `base`.
    ///
    /// Fails with [`ReloadError::ModuleNotFound`] listing every probed
    /// candidate when nothing exists.
    pub fn resolve(&self, base: &Path, specifier: &str) -> Result<Resolution, ReloadError> {
        if specifier.trim().is_empty() {
            return Err(ReloadError::not_found(specifier, Vec::new()));
        }

        let joined = join_specifier(base, specifier);
        let mut tried = Vec::with_capacity(self.extensions.len() + 1);

        for candidate in self.candidates(&joined) {
            debug!("resolve"; "probing {}", candidate.display());
            if self.fs.exists(&candidate) {
                let path = self.fs.normalize(&candidate);
                tried.push(candidate);
                return Ok(Resolution { path, tried });
            }
            tried.push(candidate);
        }

        Err(ReloadError::not_found(specifier, tried))
    }

    /// The literal path, then the path with each extension appended.
    fn candidates<'p>(&'p self, joined: &'p Path) -> impl Iterator<Item = PathBuf> + 'p {
        std::iter::once(joined.to_path_buf()).chain(
            self.extensions
                .iter()
                .map(move |ext| with_suffix(joined, ext)),
        )
    }
}

/// Join unless the specifier is already absolute.
pub fn join_specifier(base: &Path, specifier: &str) -> PathBuf {
    let path = Path::new(specifier);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// `path` with `suffix` appended to its final component.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
