//! The reloader: resolve, optionally evict, load.
//!
//! ```text
//! load(specifier)
//!   → base path      configured, or inferred once from the caller
//!   → resolve        literal path, then each extension in order
//!   → evict          only when use_cache = false
//!   → get_or_load    cache hit, or loader chosen by extension
//! ```
//!
//! Each call is one synchronous sequence. Eviction followed by loading is not
//! atomic: another thread loading the same path in between can put an entry
//! back before this call reads it.

mod builder;
#[cfg(test)]
mod tests;

pub use builder::ReloaderBuilder;

use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::cache::{ModuleCache, global_cache};
use crate::caller;
use crate::config::ReloadConfig;
use crate::error::{LoadError, ReloadError};
use crate::fingerprint::ContentHash;
use crate::module::{LoaderRegistry, ModuleHandle};
use crate::resolve::{FileSystem, RealFs, Resolution, Resolver, normalize_path};
use crate::{debug, log};

/// Loads modules from disk through a shared cache.
pub struct Reloader {
    config: ReloadConfig,
    /// Configured base, or the first caller's directory once inferred.
    base_path: OnceLock<PathBuf>,
    cache: Arc<dyn ModuleCache>,
    fs: Arc<dyn FileSystem>,
    loaders: LoaderRegistry,
    /// Where relative caller file names are searched; `None` for the defaults.
    caller_roots: Option<Vec<PathBuf>>,
}

impl Reloader {
    /// Reloader over the real filesystem, the process-wide cache and the
    /// built-in loaders.
    ///
    /// The configuration is used as given; [`Reloader::builder`] validates it.
    pub fn new(config: ReloadConfig) -> Self {
        Self::from_parts(
            config,
            global_cache(),
            Arc::new(RealFs),
            LoaderRegistry::with_builtins(),
            None,
        )
    }

    pub fn builder() -> ReloaderBuilder {
        ReloaderBuilder::new()
    }

    fn from_parts(
        config: ReloadConfig,
        cache: Arc<dyn ModuleCache>,
        fs: Arc<dyn FileSystem>,
        loaders: LoaderRegistry,
        caller_roots: Option<Vec<PathBuf>>,
    ) -> Self {
        let base_path = OnceLock::new();
        if let Some(base) = &config.base_path {
            let _ = base_path.set(normalize_path(base));
        }

        Self {
            config,
            base_path,
            cache,
            fs,
            loaders,
            caller_roots,
        }
    }

    // ========================================================================
    // operations
    // ========================================================================

    /// Resolve `specifier` and load it, going through the cache.
    ///
    /// With `use_cache = false` any cached entry for the resolved path is
    /// evicted first, so the file is read and decoded again. Modules that
    /// captured the previous handle keep it.
    #[track_caller]
    pub fn load(&self, specifier: &str) -> Result<Arc<ModuleHandle>, ReloadError> {
        let base = self.base_dir(Location::caller())?;
        let Resolution { path, .. } = self.resolver().resolve(base, specifier)?;

        if !self.config.use_cache && self.cache.evict(&path) && !self.config.silent {
            log!("reload"; "evicted {} from cache", specifier);
        }

        let result = self.cache.get_or_load(&path, &mut || self.read_module(&path));
        match result {
            Ok(module) => {
                if !self.config.silent {
                    log!("reload"; "loaded {}", specifier);
                }
                debug!("reload"; "{} -> {} ({})", specifier, path.display(), module.fingerprint());
                Ok(module)
            }
            Err(source) => {
                if !self.config.silent {
                    log!("error"; "failed to load {}: {}", specifier, source);
                }
                Err(ReloadError::LoadFailure {
                    specifier: specifier.to_string(),
                    path,
                    source,
                })
            }
        }
    }

    /// Resolve without loading or touching the cache.
    #[track_caller]
    pub fn resolve(&self, specifier: &str) -> Result<Resolution, ReloadError> {
        let base = self.base_dir(Location::caller())?;
        self.resolver().resolve(base, specifier)
    }

    /// Evict the cache entry for `specifier`. Returns whether one existed.
    #[track_caller]
    pub fn invalidate(&self, specifier: &str) -> Result<bool, ReloadError> {
        let base = self.base_dir(Location::caller())?;
        let resolved = self.resolver().resolve(base, specifier)?;

        let evicted = self.cache.evict(&resolved.path);
        if evicted && !self.config.silent {
            log!("reload"; "evicted {} from cache", specifier);
        }
        Ok(evicted)
    }

    /// The cached module for `specifier`, without loading.
    #[track_caller]
    pub fn cached(&self, specifier: &str) -> Result<Option<Arc<ModuleHandle>>, ReloadError> {
        let base = self.base_dir(Location::caller())?;
        let resolved = self.resolver().resolve(base, specifier)?;
        Ok(self.cache.get(&resolved.path))
    }

    /// Whether the file on disk differs from the cached module.
    ///
    /// Uncached modules count as stale.
    #[track_caller]
    pub fn is_stale(&self, specifier: &str) -> Result<bool, ReloadError> {
        let base = self.base_dir(Location::caller())?;
        let Resolution { path, .. } = self.resolver().resolve(base, specifier)?;

        let Some(cached) = self.cache.get(&path) else {
            return Ok(true);
        };

        match self.fs.read(&path) {
            Ok(source) => Ok(ContentHash::of(&source) != cached.fingerprint()),
            Err(err) => Err(ReloadError::LoadFailure {
                specifier: specifier.to_string(),
                source: LoadError::Io(path.clone(), err),
                path,
            }),
        }
    }

    // ========================================================================
    // accessors
    // ========================================================================

    pub fn config(&self) -> &ReloadConfig {
        &self.config
    }

    /// Configured base path, or the inferred one after the first call.
    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.get().map(PathBuf::as_path)
    }

    pub fn cache(&self) -> &Arc<dyn ModuleCache> {
        &self.cache
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    // ========================================================================
    // internals
    // ========================================================================

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.fs.as_ref(), &self.config.extensions)
    }

    /// Base directory, inferring it from `location` on first use.
    fn base_dir(&self, location: &Location<'_>) -> Result<&Path, ReloadError> {
        self.base_dir_with(|| {
            let inferred = match &self.caller_roots {
                Some(roots) => caller::locate_from(location, roots)?,
                None => caller::locate(location)?,
            };
            debug!("reload"; "base path inferred from {}: {}", location, inferred.display());
            Ok(inferred)
        })
    }

    /// Base directory, running `infer` only while none is known.
    ///
    /// A failed inference stores nothing, so the next call tries again.
    fn base_dir_with(
        &self,
        infer: impl FnOnce() -> Result<PathBuf, ReloadError>,
    ) -> Result<&Path, ReloadError> {
        if let Some(base) = self.base_path.get() {
            return Ok(base.as_path());
        }

        let inferred = infer()?;
        Ok(self.base_path.get_or_init(|| inferred).as_path())
    }

    /// Read and decode `path` with the loader for its extension.
    fn read_module(&self, path: &Path) -> Result<ModuleHandle, LoadError> {
        let loader = self.loaders.for_path(path)?;
        let source = self
            .fs
            .read(path)
            .map_err(|err| LoadError::Io(path.to_path_buf(), err))?;
        let value = loader.load(path, &source)?;

        Ok(ModuleHandle::new(
            path.to_path_buf(),
            value,
            ContentHash::of(&source),
        ))
    }
}

impl fmt::Debug for Reloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reloader")
            .field("config", &self.config)
            .field("base_path", &self.base_path.get())
            .field("cached", &self.cache.len())
            .field("loaders", &self.loaders.extensions())
            .finish()
    }
}
