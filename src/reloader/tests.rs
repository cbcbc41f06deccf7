//! Reloader scenarios against real files and in-memory doubles.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::cache::SharedCache;
use crate::module::{Exports, ModuleLoader, ModuleValue};
use crate::resolve::normalize_lexically;

// ============================================================================
// helpers
// ============================================================================

/// Counter module in the `counter = N` script format.
struct SampleModule {
    counter: AtomicI64,
}

impl SampleModule {
    fn get_data(&self) -> String {
        format!(
            "Hello from sampleModule! Counter: {}",
            self.counter.load(Ordering::SeqCst)
        )
    }

    fn increment_counter(&self) -> i64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Loader for `.script` files holding a single `counter = N` line.
fn script_loader(_path: &Path, source: &[u8]) -> Result<ModuleValue, LoadError> {
    let text = std::str::from_utf8(source)?;
    let value = text
        .trim()
        .strip_prefix("counter =")
        .ok_or_else(|| LoadError::custom("SyntaxError: expected `counter = <int>`"))?;
    let counter: i64 = value
        .trim()
        .parse()
        .map_err(|e| LoadError::custom(format!("SyntaxError: {e}")))?;
    Ok(ModuleValue::Exports(Exports::new(SampleModule {
        counter: AtomicI64::new(counter),
    })))
}

struct Fixture {
    dir: TempDir,
    cache: Arc<SharedCache>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            cache: Arc::new(SharedCache::new()),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn reloader(&self, use_cache: bool, extensions: &[&str]) -> Reloader {
        Reloader::builder()
            .base_path(self.root())
            .extensions(extensions.iter().copied())
            .use_cache(use_cache)
            .silent(true)
            .cache(Arc::clone(&self.cache))
            .loader(".script", script_loader)
            .build()
            .unwrap()
    }
}

/// In-memory filesystem that counts lookups and reads.
#[derive(Default)]
struct MemoryFs {
    files: Mutex<FxHashMap<PathBuf, Vec<u8>>>,
    lookups: AtomicI64,
    reads: AtomicI64,
}

impl MemoryFs {
    fn set(&self, path: &str, content: &str) {
        self.files
            .lock()
            .insert(PathBuf::from(path), content.as_bytes().to_vec());
    }
}

impl FileSystem for Arc<MemoryFs> {
    fn exists(&self, path: &Path) -> bool {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.files.lock().contains_key(&normalize_lexically(path))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .get(&normalize_lexically(path))
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}

// ============================================================================
// loading
// ============================================================================

#[test]
fn test_load_matches_direct_loader_output() {
    let fx = Fixture::new();
    let path = fx.write("data.json", "{\"name\": \"Sample JSON Module\", \"version\": \"1.0.0\"}");
    let reloader = fx.reloader(true, &[".json"]);

    let module = reloader.load("./data").unwrap();
    let direct = crate::module::JsonLoader
        .load(&path, &std::fs::read(&path).unwrap())
        .unwrap();

    assert_eq!(module.to_json(), direct.to_json());
    assert_eq!(module.path(), normalize_path(&path));
}

#[test]
fn test_cached_load_returns_same_instance() {
    let fx = Fixture::new();
    fx.write("util.json", "{\"value\": 1}");
    let reloader = fx.reloader(true, &[".json"]);

    let first = reloader.load("./util").unwrap();
    let second = reloader.load("./util").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fx.cache.len(), 1);
}

#[test]
fn test_cached_load_ignores_edits() {
    let fx = Fixture::new();
    fx.write("util.json", "{\"value\": 1}");
    let reloader = fx.reloader(true, &[".json"]);

    let first = reloader.load("./util").unwrap();
    fx.write("util.json", "{\"value\": 2}");
    let second = reloader.load("./util").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.as_data(), Some(&json!({"value": 1})));
    assert!(reloader.is_stale("./util").unwrap());
}

#[test]
fn test_uncached_load_picks_up_edits() {
    let fx = Fixture::new();
    fx.write("util.json", "{\"value\": 1}");
    let reloader = fx.reloader(false, &[".json"]);

    let first = reloader.load("./util").unwrap();
    assert_eq!(first.as_data(), Some(&json!({"value": 1})));

    fx.write("util.json", "{\"value\": 2}");
    let second = reloader.load("./util").unwrap();

    assert_eq!(second.as_data(), Some(&json!({"value": 2})));
    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.fingerprint(), second.fingerprint());
    // The old handle is not updated
    assert_eq!(first.as_data(), Some(&json!({"value": 1})));
    assert_eq!(fx.cache.len(), 1);
}

#[test]
fn test_uncached_reload_of_script_module() {
    let fx = Fixture::new();
    fx.write("sampleModule.script", "counter = 3");
    let reloader = fx.reloader(false, &[".script"]);

    let first = reloader.load("./sampleModule").unwrap();
    let sample = first.exports::<SampleModule>().unwrap();
    assert_eq!(sample.get_data(), "Hello from sampleModule! Counter: 3");
    assert_eq!(sample.increment_counter(), 4);

    fx.write("sampleModule.script", "counter = 10");
    let second = reloader.load("./sampleModule.script").unwrap();
    let reloaded = second.exports::<SampleModule>().unwrap();
    assert_eq!(reloaded.get_data(), "Hello from sampleModule! Counter: 10");
    // State of the old instance survives in its own handle
    assert_eq!(sample.get_data(), "Hello from sampleModule! Counter: 4");
}

#[test]
fn test_equivalent_specifiers_share_cache_entry() {
    let fx = Fixture::new();
    fx.write("util.json", "{}");
    fx.write("lib/.keep", "");
    let reloader = fx.reloader(true, &[".json"]);

    let a = reloader.load("./util").unwrap();
    let b = reloader.load("util.json").unwrap();
    let c = reloader.load("lib/../util").unwrap();
    let d = reloader
        .load(fx.root().join("util.json").to_str().unwrap())
        .unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert!(Arc::ptr_eq(&a, &d));
    assert_eq!(fx.cache.len(), 1);
}

// ============================================================================
// resolution
// ============================================================================

#[test]
fn test_first_configured_extension_wins() {
    let fx = Fixture::new();
    fx.write("f.a", "from a");
    fx.write("f.b", "from b");
    let reloader = Reloader::builder()
        .base_path(fx.root())
        .extensions([".a", ".b"])
        .silent(true)
        .cache(Arc::clone(&fx.cache))
        .loader(".a", crate::module::TextLoader)
        .loader(".b", crate::module::TextLoader)
        .build()
        .unwrap();

    assert_eq!(reloader.load("f").unwrap().as_text(), Some("from a"));

    std::fs::remove_file(fx.root().join("f.a")).unwrap();
    let resolved = reloader.resolve("f").unwrap();
    assert_eq!(resolved.path, normalize_path(&fx.root().join("f.b")));
}

#[test]
fn test_not_found_leaves_cache_untouched() {
    let fx = Fixture::new();
    fx.write("present.json", "{}");
    let reloader = fx.reloader(false, &[".a", ".b"]);
    let loaded = fx.reloader(true, &[".json"]).load("present").unwrap();

    let err = reloader.load("missing").unwrap_err();
    match err {
        ReloadError::ModuleNotFound { specifier, tried } => {
            assert_eq!(specifier, "missing");
            assert_eq!(tried.len(), 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(fx.cache.len(), 1);
    let still = fx.cache.get(loaded.path()).unwrap();
    assert!(Arc::ptr_eq(&loaded, &still));
}

#[test]
fn test_directories_are_not_modules() {
    let fx = Fixture::new();
    fx.write("mod/.keep", "");
    fx.write("mod.json", "{\"dir\": false}");
    let reloader = fx.reloader(true, &[".json"]);

    let module = reloader.load("mod").unwrap();
    assert_eq!(module.as_data(), Some(&json!({"dir": false})));
}

// ============================================================================
// errors
// ============================================================================

#[test]
fn test_load_failure_forwards_underlying_message() {
    let fx = Fixture::new();
    fx.write("broken.script", "count = ");
    let reloader = fx.reloader(false, &[".script"]);

    let err = reloader.load("./broken").unwrap_err();
    assert!(err.to_string().contains("SyntaxError: expected `counter = <int>`"));

    let source = err.into_load_error().unwrap();
    assert_eq!(source.to_string(), "SyntaxError: expected `counter = <int>`");
    assert!(fx.cache.is_empty());
}

#[test]
fn test_malformed_data_file() {
    let fx = Fixture::new();
    fx.write("bad.json", "{\"value\": ");
    let reloader = fx.reloader(true, &[".json"]);

    let err = reloader.load("bad").unwrap_err();
    assert!(matches!(
        err.load_error(),
        Some(LoadError::Json(_))
    ));
    assert!(fx.cache.is_empty());
}

#[test]
fn test_unsupported_extension_is_load_failure() {
    let fx = Fixture::new();
    fx.write("blob.bin", "\u{0}");
    let reloader = fx.reloader(true, &[".bin"]);

    let err = reloader.load("blob").unwrap_err();
    assert!(matches!(
        err.load_error(),
        Some(LoadError::Unsupported { extension: Some(e) }) if e == "bin"
    ));
}

#[test]
fn test_failed_reload_keeps_previous_handle_usable() {
    let fx = Fixture::new();
    fx.write("util.json", "{\"value\": 1}");
    let reloader = fx.reloader(false, &[".json"]);

    let first = reloader.load("util").unwrap();
    fx.write("util.json", "not json");
    assert!(reloader.load("util").is_err());

    // Evicted before the failed attempt, nothing cached afterwards
    assert!(fx.cache.is_empty());
    assert_eq!(first.as_data(), Some(&json!({"value": 1})));
}

// ============================================================================
// cache operations
// ============================================================================

#[test]
fn test_invalidate_and_cached() {
    let fx = Fixture::new();
    fx.write("util.json", "{}");
    let reloader = fx.reloader(true, &[".json"]);

    assert!(reloader.cached("util").unwrap().is_none());
    assert!(!reloader.invalidate("util").unwrap());

    let module = reloader.load("util").unwrap();
    let cached = reloader.cached("util").unwrap().unwrap();
    assert!(Arc::ptr_eq(&module, &cached));
    assert!(!reloader.is_stale("util").unwrap());

    assert!(reloader.invalidate("util").unwrap());
    assert!(reloader.cached("util").unwrap().is_none());
    assert!(reloader.is_stale("util").unwrap());
}

#[test]
fn test_eviction_with_logging_enabled() {
    owo_colors::set_override(false);
    let fx = Fixture::new();
    fx.write("util.json", "{}");
    let reloader = Reloader::builder()
        .base_path(fx.root())
        .extensions([".json"])
        .use_cache(false)
        .cache(Arc::clone(&fx.cache))
        .build()
        .unwrap();

    // Each call logs `[reload] evicted util from cache` before loading again
    let first = reloader.load("util").unwrap();
    let second = reloader.load("util").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(reloader.invalidate("util").unwrap());
    assert!(fx.cache.is_empty());
}

#[test]
fn test_reloaders_share_injected_cache() {
    let fx = Fixture::new();
    fx.write("util.json", "{}");
    let caching = fx.reloader(true, &[".json"]);
    let reloading = fx.reloader(false, &[".json"]);

    let first = caching.load("util").unwrap();
    let second = reloading.load("util").unwrap();
    let third = caching.load("util").unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&second, &third));
}

#[test]
fn test_loader_loads_dependency_through_same_cache() {
    let fx = Fixture::new();
    fx.write("main.mod", "dep");
    fx.write("dep.json", "{\"value\": 7}");

    let inner = fx.reloader(true, &[".json"]);
    let outer = Reloader::builder()
        .base_path(fx.root())
        .extensions([".mod"])
        .use_cache(false)
        .silent(true)
        .cache(Arc::clone(&fx.cache))
        .loader(".mod", move |_path: &Path, source: &[u8]| -> Result<ModuleValue, LoadError> {
            let name = std::str::from_utf8(source)?.trim();
            let dep = inner.load(name).map_err(LoadError::custom)?;
            Ok(ModuleValue::Data(json!({ "dep": dep.to_json() })))
        })
        .build()
        .unwrap();

    let main = outer.load("main").unwrap();
    assert_eq!(main.as_data(), Some(&json!({"dep": {"value": 7}})));
    assert_eq!(fx.cache.len(), 2);

    // Reloading the outer module reuses the cached dependency
    let again = outer.load("main").unwrap();
    assert!(!Arc::ptr_eq(&main, &again));
    assert_eq!(fx.cache.len(), 2);
}

// ============================================================================
// in-memory doubles
// ============================================================================

#[test]
fn test_util_scenario_with_memory_fs() {
    let fs = Arc::new(MemoryFs::default());
    fs.set("/proj/util.json", "{\"value\": 1}");

    let cache = Arc::new(SharedCache::new());
    let reloader = Reloader::builder()
        .base_path("/proj")
        .extensions([".json"])
        .use_cache(false)
        .silent(true)
        .filesystem(Arc::clone(&fs))
        .cache(Arc::clone(&cache))
        .build()
        .unwrap();

    let first = reloader.load("./util").unwrap();
    assert_eq!(first.as_data(), Some(&json!({"value": 1})));
    assert_eq!(first.path(), Path::new("/proj/util.json"));

    fs.set("/proj/util.json", "{\"value\": 2}");
    let second = reloader.load("./util").unwrap();
    assert_eq!(second.as_data(), Some(&json!({"value": 2})));
    assert_eq!(fs.reads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cached_load_reads_file_once() {
    let fs = Arc::new(MemoryFs::default());
    fs.set("/proj/util.json", "{\"value\": 1}");

    let reloader = Reloader::builder()
        .base_path("/proj")
        .extensions([".json"])
        .silent(true)
        .filesystem(Arc::clone(&fs))
        .cache(Arc::new(SharedCache::new()))
        .build()
        .unwrap();

    for _ in 0..3 {
        reloader.load("util").unwrap();
    }
    assert_eq!(fs.reads.load(Ordering::SeqCst), 1);
}

// ============================================================================
// base path inference
// ============================================================================

#[test]
fn test_base_path_inferred_once_from_caller() {
    let reloader = Reloader::builder()
        .extensions([".rs"])
        .silent(true)
        .cache(Arc::new(SharedCache::new()))
        .loader(".rs", crate::module::TextLoader)
        .build()
        .unwrap();
    assert_eq!(reloader.base_path(), None);

    // This file lives in src/reloader/, next to mod.rs and builder.rs
    let module = reloader.load("./mod").unwrap();
    assert!(module.as_text().unwrap().contains("pub struct Reloader"));

    let inferred = reloader.base_path().unwrap().to_path_buf();
    assert!(inferred.ends_with("src/reloader"));

    assert!(reloader.load("builder").is_ok());
    assert_eq!(reloader.base_path(), Some(inferred.as_path()));
}

#[test]
fn test_unresolvable_caller_fails_before_resolution() {
    let fs = Arc::new(MemoryFs::default());
    fs.set("/proj/util.json", "{}");

    let cache = Arc::new(SharedCache::new());
    let held = Arc::new(ModuleHandle::new(
        PathBuf::from("/proj/util.json"),
        ModuleValue::Text("held".into()),
        ContentHash::of(b"held"),
    ));
    cache.insert(PathBuf::from("/proj/util.json"), Arc::clone(&held));

    // No base path, and no source file can be found under this root
    let empty = TempDir::new().unwrap();
    let reloader = Reloader::builder()
        .extensions([".json"])
        .use_cache(false)
        .silent(true)
        .filesystem(Arc::clone(&fs))
        .cache(Arc::clone(&cache))
        .caller_roots([empty.path()])
        .build()
        .unwrap();

    let unresolvable = |err: ReloadError| matches!(err, ReloadError::CallerUnresolvable { .. });
    assert!(unresolvable(reloader.load("/proj/util").unwrap_err()));
    assert!(unresolvable(reloader.resolve("/proj/util").unwrap_err()));
    assert!(unresolvable(reloader.invalidate("/proj/util").unwrap_err()));
    assert!(unresolvable(reloader.cached("/proj/util").unwrap_err()));
    assert!(unresolvable(reloader.is_stale("/proj/util").unwrap_err()));

    assert_eq!(fs.lookups.load(Ordering::SeqCst), 0);
    assert_eq!(fs.reads.load(Ordering::SeqCst), 0);
    assert_eq!(cache.len(), 1);
    assert!(Arc::ptr_eq(&cache.get(Path::new("/proj/util.json")).unwrap(), &held));
    assert_eq!(reloader.base_path(), None);
}

#[test]
fn test_inference_runs_only_until_it_succeeds() {
    let reloader = Reloader::builder()
        .silent(true)
        .cache(Arc::new(SharedCache::new()))
        .build()
        .unwrap();

    let err = reloader
        .base_dir_with(|| {
            Err(ReloadError::CallerUnresolvable {
                location: "<unknown>:1:1".into(),
            })
        })
        .unwrap_err();
    assert!(err.to_string().contains("configure `base_path`"));
    assert_eq!(reloader.base_path(), None);

    let first = reloader.base_dir_with(|| Ok(PathBuf::from("/first"))).unwrap();
    assert_eq!(first, Path::new("/first"));

    let mut asked_again = false;
    let second = reloader
        .base_dir_with(|| {
            asked_again = true;
            Ok(PathBuf::from("/second"))
        })
        .unwrap();
    assert_eq!(second, Path::new("/first"));
    assert!(!asked_again);
}

#[test]
fn test_configured_base_path_skips_inference() {
    let fx = Fixture::new();
    let reloader = fx.reloader(true, &[".json"]);
    assert_eq!(reloader.base_path(), Some(normalize_path(fx.root()).as_path()));

    let base = reloader
        .base_dir_with(|| panic!("inference must not run"))
        .unwrap();
    assert_eq!(base, normalize_path(fx.root()));
}
