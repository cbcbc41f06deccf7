//! Reloader configuration and `dynreload.toml`.
//!
//! # Example
//!
//! ```toml
//! base_path = "modules"           # relative to this file's directory, `~` expanded
//! extensions = [".toml", ".json"] # tried in order when the literal path is missing
//! silent = false                  # suppress diagnostic lines
//! use_cache = true                # false: evict before every load
//! ```
//!
//! Every field is optional. Without `base_path`, the reloader infers the
//! directory of the source file that first calls `load`.

mod error;
mod field;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use field::FieldPath;

use crate::log;
use serde::Deserialize;
use std::{
    fs,
    str::FromStr,
    path::{Path, PathBuf},
};

/// Default config file name, searched upward from the current directory.
pub const CONFIG_FILE: &str = "dynreload.toml";

/// Field paths used in diagnostics.
pub struct ReloadConfigFields {
    pub base_path: FieldPath,
    pub extensions: FieldPath,
    pub silent: FieldPath,
    pub use_cache: FieldPath,
}

// ============================================================================
// ReloadConfig
// ============================================================================

/// Options for a [`Reloader`](crate::Reloader), fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Directory used to resolve relative specifiers.
    /// `None`: inferred from the first caller of `load`.
    pub base_path: Option<PathBuf>,

    /// Suffixes appended, in order, when the literal specifier is missing.
    pub extensions: Vec<String>,

    /// Suppress diagnostic output.
    pub silent: bool,

    /// `false`: evict the cached entry before each load.
    pub use_cache: bool,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            extensions: vec![".toml".to_string(), ".json".to_string()],
            silent: false,
            use_cache: true,
        }
    }
}

impl ReloadConfig {
    pub const FIELDS: ReloadConfigFields = ReloadConfigFields {
        base_path: FieldPath::new("base_path"),
        extensions: FieldPath::new("extensions"),
        silent: FieldPath::new("silent"),
        use_cache: FieldPath::new("use_cache"),
    };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    // ========================================================================
    // loading
    // ========================================================================

    /// Load configuration from file path with unknown field detection.
    ///
    /// A relative `base_path` is resolved against the config file's
    /// directory, and the result is validated.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        let root = path.parent().unwrap_or_else(|| Path::new("."));
        config.normalize_paths(root);
        config.validate()?;

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Expand `~` and anchor a relative `base_path` at `root`.
    pub fn normalize_paths(&mut self, root: &Path) {
        if let Some(base) = self.base_path.take() {
            self.base_path = Some(Self::normalize_base_path(&base, root));
        }
    }

    fn normalize_base_path(path: &Path, root: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        let path = PathBuf::from(expanded);
        let full_path = if path.is_relative() {
            root.join(&path)
        } else {
            path
        };
        crate::resolve::normalize_path(&full_path)
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the configuration, collecting every problem at once.
    ///
    /// Warnings are printed; errors are returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let diag = self.diagnose();
        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Run all checks without printing anything.
    pub fn diagnose(&self) -> ConfigDiagnostics {
        let mut diag = ConfigDiagnostics::new();
        self.diagnose_extensions(&mut diag);
        self.diagnose_base_path(&mut diag);
        diag
    }

    /// Extensions must be non-empty and start with `.`; duplicates warn.
    pub fn diagnose_extensions(&self, diag: &mut ConfigDiagnostics) {
        let field = Self::FIELDS.extensions;

        for (i, ext) in self.extensions.iter().enumerate() {
            if ext.is_empty() {
                diag.error(field, format!("entry {i} is empty"));
            } else if !ext.starts_with('.') {
                diag.error_with_hint(
                    field,
                    format!("`{ext}` must start with `.`"),
                    format!("write `.{ext}`"),
                );
            } else if self.extensions[..i].contains(ext) {
                diag.warn(field, format!("`{ext}` is listed more than once"));
            }
        }
    }

    /// A configured base path must be an existing directory.
    fn diagnose_base_path(&self, diag: &mut ConfigDiagnostics) {
        if let Some(base) = &self.base_path
            && !base.is_dir()
        {
            diag.error_with_hint(
                Self::FIELDS.base_path,
                format!("`{}` is not an existing directory", base.display()),
                "remove `base_path` to infer it from the calling file",
            );
        }
    }
}

/// Parse configuration from a TOML string.
///
/// Unknown fields are silently ignored; use [`ReloadConfig::from_path`] to
/// get them reported.
impl FromStr for ReloadConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(content)?)
    }
}

// ============================================================================
// config discovery
// ============================================================================

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`.
/// Returns the absolute path to the config file if found.
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

/// Same as [`find_config_file`], starting at `start`.
pub fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

// ============================================================================
// tests
// ============================================================================
