//! `termdock` CLI - hosts a terminal workspace and talks to a running one
//!
//! Provides commands for running a workspace, opening saved sessions,
//! quick-connecting, and listing saved sessions and layouts.

mod cli;
mod commands;
mod console;
mod error;
mod format;
mod reentry;
mod util;

use clap::Parser;
use cli::{Cli, Commands};
use commands::GlobalFlags;

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let hosting = matches!(
        cli.command,
        Commands::Run { .. } | Commands::Open { .. } | Commands::Connect { .. }
    );
    let logs = util::init_logging(config_path, cli.verbose, cli.quiet, hosting);

    let flags = GlobalFlags {
        config_path,
        quiet: cli.quiet,
    };
    let result = commands::dispatch(flags, cli.command, logs);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
