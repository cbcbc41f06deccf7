//! Error types for resolving and loading modules.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// ReloadError
// ============================================================================

/// Errors surfaced by [`Reloader`](crate::Reloader) operations.
///
/// Every `load` call either yields a module or exactly one of these; nothing
/// is retried and nothing falls back to a default value.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// No base path was configured and the calling source file could not be
    /// located on disk.
    #[error("cannot determine the calling file for `{location}`; configure `base_path` explicitly")]
    CallerUnresolvable { location: String },

    /// Neither the literal path nor any extension candidate exists.
    #[error("module not found: {specifier}")]
    ModuleNotFound {
        specifier: String,
        /// Candidates probed, in order.
        tried: Vec<PathBuf>,
    },

    /// The loader for the resolved file failed.
    #[error("failed to load `{specifier}` from {}: {source}", .path.display())]
    LoadFailure {
        specifier: String,
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ReloadError {
    pub fn not_found(specifier: impl Into<String>, tried: Vec<PathBuf>) -> Self {
        Self::ModuleNotFound {
            specifier: specifier.into(),
            tried,
        }
    }

    /// The underlying loader error, if this is a load failure.
    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            Self::LoadFailure { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Unwrap into the underlying loader error, if this is a load failure.
    pub fn into_load_error(self) -> Result<LoadError, Self> {
        match self {
            Self::LoadFailure { source, .. } => Ok(source),
            other => Err(other),
        }
    }
}

// ============================================================================
// LoadError
// ============================================================================

/// Errors raised while reading or decoding a resolved file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("file is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("no loader registered for {}", display_extension(.extension))]
    Unsupported { extension: Option<String> },

    /// Raised by application-registered loaders.
    #[error("{0}")]
    Custom(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LoadError {
    /// Wrap an arbitrary error from a custom loader.
    pub fn custom(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Custom(err.into())
    }
}

fn display_extension(extension: &Option<String>) -> String {
    match extension {
        Some(ext) => format!("`.{ext}` files"),
        None => "files without an extension".to_string(),
    }
}
