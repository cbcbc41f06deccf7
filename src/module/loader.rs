//! Loading strategies, selected by file extension.

use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;

use super::ModuleValue;
use crate::error::LoadError;

/// Turns the bytes of a resolved file into a [`ModuleValue`].
///
/// Closures with the same signature are loaders too:
///
/// ```ignore
/// builder.loader(".ini", |_path: &Path, src: &[u8]| -> Result<ModuleValue, LoadError> {
///     Ok(ModuleValue::Text(parse(src)?))
/// });
/// ```
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path, source: &[u8]) -> Result<ModuleValue, LoadError>;
}

impl<F> ModuleLoader for F
where
    F: Fn(&Path, &[u8]) -> Result<ModuleValue, LoadError> + Send + Sync,
{
    fn load(&self, path: &Path, source: &[u8]) -> Result<ModuleValue, LoadError> {
        self(path, source)
    }
}

// ============================================================================
// Built-in loaders
// ============================================================================

/// `.json` files as structured data.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl ModuleLoader for JsonLoader {
    fn load(&self, _path: &Path, source: &[u8]) -> Result<ModuleValue, LoadError> {
        Ok(ModuleValue::Data(serde_json::from_slice(source)?))
    }
}

/// `.toml` files as structured data (JSON data model).
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlLoader;

impl ModuleLoader for TomlLoader {
    fn load(&self, _path: &Path, source: &[u8]) -> Result<ModuleValue, LoadError> {
        let text = std::str::from_utf8(source)?;
        Ok(ModuleValue::Data(toml::from_str(text)?))
    }
}

/// Plain UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl ModuleLoader for TextLoader {
    fn load(&self, _path: &Path, source: &[u8]) -> Result<ModuleValue, LoadError> {
        Ok(ModuleValue::Text(std::str::from_utf8(source)?.to_owned()))
    }
}

// ============================================================================
// LoaderRegistry
// ============================================================================

/// Extension → loader table.
///
/// Keys are stored lowercase without the leading dot, so `.JSON`, `json`
/// and `.json` all name the same entry.
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: FxHashMap<String, Arc<dyn ModuleLoader>>,
}

impl LoaderRegistry {
    /// An empty registry; every file is unsupported.
    pub fn empty() -> Self {
        Self {
            loaders: FxHashMap::default(),
        }
    }

    /// JSON, TOML and text loaders.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("json", JsonLoader);
        registry.register("toml", TomlLoader);
        registry.register("txt", TextLoader);
        registry.register("md", TextLoader);
        registry
    }

    /// Register `loader` for `extension`, replacing any previous one.
    pub fn register(&mut self, extension: &str, loader: impl ModuleLoader + 'static) {
        self.loaders
            .insert(extension_key(extension), Arc::new(loader));
    }

    /// Loader for the extension of `path`.
    pub fn for_path(&self, path: &Path) -> Result<&dyn ModuleLoader, LoadError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

        extension
            .as_deref()
            .and_then(|ext| self.loaders.get(ext))
            .map(|loader| loader.as_ref())
            .ok_or(LoadError::Unsupported { extension })
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.loaders.contains_key(&extension_key(extension))
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn extension_key(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}
