//! `check` command: validate the config file.

use anyhow::{Context, Result, bail};
use dynreload::config::ReloadConfig;
use dynreload::log;

use super::{Cli, config_path};

pub fn run(cli: &Cli) -> Result<()> {
    let Some(path) = config_path(cli) else {
        bail!("no dynreload.toml found in the current directory or its parents");
    };

    let config = ReloadConfig::from_path(&path)
        .with_context(|| format!("failed to load config `{}`", path.display()))?;

    log!("config"; "{} is valid", path.display());
    match &config.base_path {
        Some(base) => eprintln!("- base_path: {}", base.display()),
        None => eprintln!("- base_path: (inferred from caller)"),
    }
    eprintln!("- extensions: {}", config.extensions.join(", "));
    eprintln!("- silent: {}", config.silent);
    eprintln!("- use_cache: {}", config.use_cache);
    Ok(())
}
