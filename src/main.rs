//! dynreload - load modules from disk without restarting the host process.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    dynreload::logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Load {
            specifiers,
            reload_args,
            pretty,
            interactive,
        } => {
            let config = cli::resolve_config(&cli, reload_args)?;
            let reloader = cli::build_reloader(config)?;
            cli::load::run(&reloader, specifiers, *pretty, *interactive)
        }
        Commands::Resolve {
            specifiers,
            reload_args,
        } => {
            let config = cli::resolve_config(&cli, reload_args)?;
            let reloader = cli::build_reloader(config)?;
            cli::resolve::run(&reloader, specifiers)
        }
        Commands::Check => cli::check::run(&cli),
    }
}
