//! Caller-location inference for the default base path.
//!
//! [`Reloader::load`](crate::Reloader::load) is `#[track_caller]`, so
//! `Location::caller()` inside it names the source file of whoever called it.
//! That file name is compile-time information: absolute for some build
//! setups, relative to the package or workspace root for cargo builds. A
//! relative name is tried against `CARGO_MANIFEST_DIR` and then the current
//! directory, then against their ancestors (a workspace member's file names
//! start at the workspace root); the first candidate that exists wins.
//!
//! This is best-effort. Binaries run away from their source tree cannot
//! locate their callers and must configure `base_path`.

use std::panic::Location;
use std::path::{Path, PathBuf};

use crate::error::ReloadError;
use crate::resolve::normalize_path;

/// Search roots for relative file names: `CARGO_MANIFEST_DIR`, then cwd.
pub fn default_roots() -> Vec<PathBuf> {
    std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .into_iter()
        .chain(std::env::current_dir().ok())
        .collect()
}

/// Directory containing the source file at `location`.
pub fn locate(location: &Location<'_>) -> Result<PathBuf, ReloadError> {
    locate_from(location, &default_roots())
}

/// Same as [`locate`], searching `roots` instead of the defaults.
pub fn locate_from(location: &Location<'_>, roots: &[PathBuf]) -> Result<PathBuf, ReloadError> {
    locate_in(location.file(), roots).ok_or_else(|| ReloadError::CallerUnresolvable {
        location: location.to_string(),
    })
}

/// Directory of `file`, searching `roots` when it is relative.
pub fn locate_in(file: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    let file = Path::new(file);

    let found = if file.is_absolute() {
        file.is_file().then(|| file.to_path_buf())
    } else {
        let exact = roots.iter().map(PathBuf::as_path);
        let ancestors = roots.iter().flat_map(|root| root.ancestors().skip(1));
        exact
            .chain(ancestors)
            .map(|dir| dir.join(file))
            .find(|candidate| candidate.is_file())
    }?;

    normalize_path(&found).parent().map(Path::to_path_buf)
}
