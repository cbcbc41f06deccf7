//! Loaded modules.
//!
//! A [`ModuleHandle`] is what the cache stores and `load` returns: the value
//! a loader produced, where it came from, and the fingerprint of the bytes it
//! was built from.
//!
//! | Value               | Produced by                         |
//! |---------------------|-------------------------------------|
//! | `Data(Value)`       | `.json`, `.toml` (built-in loaders) |
//! | `Text(String)`      | `.txt`, `.md` (built-in loader)     |
//! | `Exports(Exports)`  | application-registered loaders      |

mod loader;

pub use loader::{JsonLoader, LoaderRegistry, ModuleLoader, TextLoader, TomlLoader};

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::fingerprint::ContentHash;

// ============================================================================
// ModuleValue
// ============================================================================

/// What a loader turned a file into.
#[derive(Debug, Clone)]
pub enum ModuleValue {
    /// Parsed structured data.
    Data(serde_json::Value),
    /// Raw UTF-8 text.
    Text(String),
    /// Opaque interface built by an application loader.
    Exports(Exports),
}

impl ModuleValue {
    /// JSON view used for printing.
    ///
    /// Exports have no data model of their own and render as
    /// `{"exports": "<type name>"}`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Data(value) => value.clone(),
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::Exports(exports) => serde_json::json!({ "exports": exports.type_name() }),
        }
    }
}

/// Type-erased exports of an executable module.
#[derive(Clone)]
pub struct Exports {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Exports {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Shared handle to the concrete value.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exports")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ModuleHandle
// ============================================================================

/// A loaded module, shared through the cache as `Arc<ModuleHandle>`.
#[derive(Debug)]
pub struct ModuleHandle {
    path: PathBuf,
    value: ModuleValue,
    fingerprint: ContentHash,
    loaded_at: SystemTime,
}

impl ModuleHandle {
    pub fn new(path: PathBuf, value: ModuleValue, fingerprint: ContentHash) -> Self {
        Self {
            path,
            value,
            fingerprint,
            loaded_at: SystemTime::now(),
        }
    }

    /// Resolved absolute path; the cache key.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> &ModuleValue {
        &self.value
    }

    /// blake3 hash of the bytes this module was loaded from.
    pub fn fingerprint(&self) -> ContentHash {
        self.fingerprint
    }

    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match &self.value {
            ModuleValue::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            ModuleValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn exports<T: Any>(&self) -> Option<&T> {
        match &self.value {
            ModuleValue::Exports(exports) => exports.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.value.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Counter(u32);

    #[test]
    fn test_exports_downcast() {
        let exports = Exports::new(Counter(3));
        assert_eq!(exports.downcast_ref::<Counter>().map(|c| c.0), Some(3));
        assert!(exports.downcast_ref::<String>().is_none());
        assert_eq!(exports.downcast::<Counter>().map(|c| c.0), Some(3));
        assert!(exports.type_name().ends_with("Counter"));
    }

    #[test]
    fn test_handle_accessors() {
        let handle = ModuleHandle::new(
            PathBuf::from("/proj/util.json"),
            ModuleValue::Data(json!({"value": 1})),
            ContentHash::of(b"{\"value\": 1}"),
        );
        assert_eq!(handle.path(), Path::new("/proj/util.json"));
        assert_eq!(handle.as_data(), Some(&json!({"value": 1})));
        assert_eq!(handle.as_text(), None);
        assert!(handle.exports::<Counter>().is_none());
        assert_eq!(handle.to_json(), json!({"value": 1}));
    }

    #[test]
    fn test_to_json_for_text_and_exports() {
        assert_eq!(
            ModuleValue::Text("hello".into()).to_json(),
            json!("hello")
        );
        let exports = ModuleValue::Exports(Exports::new(Counter(0)));
        let rendered = exports.to_json();
        assert!(rendered["exports"].as_str().unwrap().ends_with("Counter"));
    }
}
