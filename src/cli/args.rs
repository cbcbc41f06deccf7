//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Load modules from disk, bypassing the cache on demand
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: dynreload.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Load modules and print their values as JSON
    #[command(visible_alias = "l")]
    Load {
        /// Module specifiers (relative to the base path, or absolute)
        #[arg(required = true, value_name = "SPECIFIER")]
        specifiers: Vec<String>,

        #[command(flatten)]
        reload_args: ReloadArgs,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,

        /// After loading, press Enter to load again (q to quit)
        #[arg(short, long)]
        interactive: bool,
    },

    /// Print the file each specifier resolves to
    #[command(visible_alias = "r")]
    Resolve {
        /// Module specifiers (relative to the base path, or absolute)
        #[arg(required = true, value_name = "SPECIFIER")]
        specifiers: Vec<String>,

        #[command(flatten)]
        reload_args: ReloadArgs,
    },

    /// Validate the config file
    #[command(visible_alias = "c")]
    Check,
}

/// Reloader options shared by Load and Resolve; override the config file
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReloadArgs {
    /// Base directory for relative specifiers (default: current directory)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub base_path: Option<PathBuf>,

    /// Extensions to try, in order (repeat or comma-separate, e.g. `-e .toml,.json`)
    #[arg(short, long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Evict cached modules before loading
    #[arg(short = 'n', long)]
    pub no_cache: bool,

    /// Suppress diagnostic output
    #[arg(short, long)]
    pub silent: bool,
}
