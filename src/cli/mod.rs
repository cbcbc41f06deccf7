//! Command-line interface module.
//!
//! Settings come from `dynreload.toml` (explicit `-C`, or searched upward
//! from the current directory) and are overridden by command-line flags.

mod args;
pub mod check;
pub mod load;
pub mod resolve;

pub use args::{Cli, Commands, ReloadArgs};

use anyhow::{Context, Result};
use dynreload::config::{CONFIG_FILE, ReloadConfig, find_config_file};
use dynreload::{Reloader, debug};
use std::path::{Path, PathBuf};

/// Locate the config file: the `-C` path if given, else an upward search.
pub fn config_path(cli: &Cli) -> Option<PathBuf> {
    match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(Path::new(CONFIG_FILE)),
    }
}

/// Config file settings with command-line overrides applied.
pub fn resolve_config(cli: &Cli, args: &ReloadArgs) -> Result<ReloadConfig> {
    let mut config = match config_path(cli) {
        Some(path) => {
            debug!("config"; "using {}", path.display());
            ReloadConfig::from_path(&path)
                .with_context(|| format!("failed to load config `{}`", path.display()))?
        }
        None => ReloadConfig::default(),
    };

    apply_args(&mut config, args)?;
    Ok(config)
}

/// Apply command-line overrides.
///
/// Without any base path the current directory is used: for a command-line
/// user that is where specifiers are written relative to.
fn apply_args(config: &mut ReloadConfig, args: &ReloadArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current working directory")?;

    if let Some(base) = &args.base_path {
        config.base_path = Some(base.clone());
        config.normalize_paths(&cwd);
    }
    if config.base_path.is_none() {
        config.base_path = Some(cwd);
    }
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.clone();
    }
    if args.no_cache {
        config.use_cache = false;
    }
    if args.silent {
        config.silent = true;
    }
    Ok(())
}

/// Build a reloader over the process-wide cache.
pub fn build_reloader(config: ReloadConfig) -> Result<Reloader> {
    Reloader::builder()
        .config(config)
        .build()
        .context("invalid reloader settings")
}
