//! dynreload - load modules from disk, optionally bypassing the module cache.
//!
//! A [`Reloader`] resolves a specifier against a base directory (trying the
//! literal path, then each configured extension), evicts the cached entry
//! when caching is off, and loads the file through the loader registered for
//! its extension. Edits on disk are picked up without restarting the process.
//!
//! ```ignore
//! use dynreload::{ReloadConfig, Reloader};
//!
//! let reloader = Reloader::new(
//!     ReloadConfig::new()
//!         .with_base_path("/proj")
//!         .with_extensions([".json"])
//!         .use_cache(false),
//! );
//! let util = reloader.load("./util")?;        // /proj/util.json
//! println!("{}", util.to_json()["value"]);
//! ```
//!
//! Not a file watcher: nothing reloads until `load` is called again. Eviction
//! does not cascade to modules that hold the previous handle.

pub mod cache;
pub mod caller;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logger;
pub mod module;
pub mod reloader;
pub mod resolve;

pub use cache::{ModuleCache, SharedCache, global_cache};
pub use config::ReloadConfig;
pub use error::{LoadError, ReloadError};
pub use fingerprint::ContentHash;
pub use module::{Exports, LoaderRegistry, ModuleHandle, ModuleLoader, ModuleValue};
pub use reloader::{Reloader, ReloaderBuilder};
pub use resolve::{FileSystem, RealFs, Resolution};
