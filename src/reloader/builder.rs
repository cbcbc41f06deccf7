//! Reloader construction with injected collaborators.

use std::path::PathBuf;
use std::sync::Arc;

use super::Reloader;
use crate::cache::{ModuleCache, global_cache};
use crate::config::{ConfigDiagnostics, ConfigError, ReloadConfig};
use crate::error::ReloadError;
use crate::module::{LoaderRegistry, ModuleLoader};
use crate::resolve::{FileSystem, RealFs};

/// Builds a [`Reloader`].
///
/// Unset collaborators default to the process-wide cache, the real
/// filesystem and the built-in loaders.
///
/// # Example
///
/// ```ignore
/// let reloader = Reloader::builder()
///     .base_path("/proj")
///     .extensions([".json"])
///     .use_cache(false)
///     .cache(Arc::new(SharedCache::new()))
///     .build()?;
/// ```
pub struct ReloaderBuilder {
    config: ReloadConfig,
    cache: Option<Arc<dyn ModuleCache>>,
    fs: Option<Arc<dyn FileSystem>>,
    loaders: LoaderRegistry,
    caller_roots: Option<Vec<PathBuf>>,
}

impl ReloaderBuilder {
    pub fn new() -> Self {
        Self {
            config: ReloadConfig::default(),
            cache: None,
            fs: None,
            loaders: LoaderRegistry::with_builtins(),
            caller_roots: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ReloadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_path = Some(path.into());
        self
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.config.silent = silent;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.config.use_cache = use_cache;
        self
    }

    pub fn cache<C: ModuleCache + 'static>(mut self, cache: Arc<C>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn filesystem(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Some(Arc::new(fs));
        self
    }

    /// Register a loader for `extension`, replacing any existing one.
    pub fn loader(mut self, extension: &str, loader: impl ModuleLoader + 'static) -> Self {
        self.loaders.register(extension, loader);
        self
    }

    /// Replace the loader table entirely.
    pub fn loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    /// Directories searched for the caller's source file when the base path
    /// is inferred. Defaults to `CARGO_MANIFEST_DIR`, then the current
    /// directory.
    pub fn caller_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.caller_roots = Some(roots.into_iter().map(Into::into).collect());
        self
    }

    /// Validate the extensions and build.
    ///
    /// The base path is not checked here: with a custom [`FileSystem`] it may
    /// not exist on the real disk.
    pub fn build(self) -> Result<Reloader, ReloadError> {
        let mut diag = ConfigDiagnostics::new();
        self.config.diagnose_extensions(&mut diag);
        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ReloadError::Config(ConfigError::Diagnostics(e)))?;

        Ok(Reloader::from_parts(
            self.config,
            self.cache
                .unwrap_or_else(|| global_cache() as Arc<dyn ModuleCache>),
            self.fs
                .unwrap_or_else(|| Arc::new(RealFs) as Arc<dyn FileSystem>),
            self.loaders,
            self.caller_roots,
        ))
    }
}

impl Default for ReloaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
