//! Module cache keyed by resolved path.
//!
//! The cache is shared state the reloader does not own: by default every
//! [`Reloader`](crate::Reloader) in the process uses [`global_cache`], and
//! tests inject their own [`SharedCache`].
//!
//! Eviction removes exactly one entry. Handles already given out stay valid
//! and keep pointing at the old module.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use crate::error::LoadError;
use crate::module::ModuleHandle;

/// Keyed store of loaded modules.
///
/// Keys are normalized absolute paths as produced by the resolver.
pub trait ModuleCache: Send + Sync {
    fn contains(&self, path: &Path) -> bool;

    fn get(&self, path: &Path) -> Option<Arc<ModuleHandle>>;

    fn insert(&self, path: PathBuf, module: Arc<ModuleHandle>);

    /// Remove one entry. Returns whether it was present.
    fn evict(&self, path: &Path) -> bool;

    /// Return the cached module, or run `load` and cache its result.
    ///
    /// Failed loads cache nothing.
    fn get_or_load(
        &self,
        path: &Path,
        load: &mut dyn FnMut() -> Result<ModuleHandle, LoadError>,
    ) -> Result<Arc<ModuleHandle>, LoadError>;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Thread-safe cache backed by `DashMap`.
#[derive(Debug, Default)]
pub struct SharedCache {
    modules: DashMap<PathBuf, Arc<ModuleHandle>>,
}

impl SharedCache {
    pub fn new() -> Self {
        Self {
            modules: DashMap::new(),
        }
    }

    /// Cached paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.modules.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

impl ModuleCache for SharedCache {
    fn contains(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }

    fn get(&self, path: &Path) -> Option<Arc<ModuleHandle>> {
        self.modules.get(path).map(|r| Arc::clone(r.value()))
    }

    fn insert(&self, path: PathBuf, module: Arc<ModuleHandle>) {
        self.modules.insert(path, module);
    }

    fn evict(&self, path: &Path) -> bool {
        self.modules.remove(path).is_some()
    }

    fn get_or_load(
        &self,
        path: &Path,
        load: &mut dyn FnMut() -> Result<ModuleHandle, LoadError>,
    ) -> Result<Arc<ModuleHandle>, LoadError> {
        if let Some(module) = self.get(path) {
            return Ok(module);
        }

        // No map guard is held while loading, so a loader may load its own
        // dependencies through this cache. Concurrent first loads of one
        // path can both run; the first insert wins and both get it.
        let module = Arc::new(load()?);
        let stored = self
            .modules
            .entry(path.to_path_buf())
            .or_insert(module);
        Ok(Arc::clone(stored.value()))
    }

    fn clear(&self) {
        self.modules.clear();
    }

    fn len(&self) -> usize {
        self.modules.len()
    }
}

/// Process-wide cache instance.
static MODULE_CACHE: LazyLock<Arc<SharedCache>> = LazyLock::new(|| Arc::new(SharedCache::new()));

/// The process-wide module cache.
#[inline]
pub fn global_cache() -> Arc<SharedCache> {
    Arc::clone(&MODULE_CACHE)
}
