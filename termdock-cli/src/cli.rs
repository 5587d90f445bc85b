//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use termdock_core::models::Protocol;

use crate::util::parse_protocol;

/// `termdock` command-line interface: a terminal workspace with dockable
/// sessions, saved layouts and command broadcast
#[derive(Parser)]
#[command(name = "termdock-cli")]
#[command(author, version, about = "termdock terminal workspace")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "TERMDOCK_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Host a workspace
    #[command(about = "Run a workspace and read commands from stdin")]
    Run {
        /// Layout to load at startup (name, file, or "default")
        #[arg(short, long)]
        layout: Option<String>,

        /// Session to open on the default layout at startup
        #[arg(short, long)]
        session: Option<String>,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Open a saved session
    #[command(about = "Open a saved session in the running workspace, or start one")]
    Open {
        /// Session id or label
        session: String,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Connect to a host without saving a session
    #[command(about = "Quick-connect in the running workspace, or start one")]
    Connect {
        /// Host, serial line or shell command
        host: String,

        /// Protocol (ssh, telnet, rlogin, raw, serial, localshell)
        #[arg(short = 'P', long, default_value = "ssh", value_parser = parse_protocol)]
        protocol: Protocol,

        /// Port or serial speed (defaults to the protocol default)
        #[arg(short, long)]
        port: Option<u32>,

        /// Login name
        #[arg(short = 'l', long)]
        user: Option<String>,

        /// Password (SSH only; never forwarded to a running workspace)
        #[arg(long, env = "TERMDOCK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Saved terminal configuration to load
        #[arg(long, value_name = "NAME")]
        load: Option<String>,

        #[command(flatten)]
        host_args: HostArgs,
    },

    /// List saved sessions
    #[command(about = "List saved sessions")]
    Sessions {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// List saved layouts
    #[command(about = "List saved layouts")]
    Layouts {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Show the terminal command line for a session
    #[command(about = "Print the terminal command line for a session (passwords masked)")]
    CommandLine {
        /// Session id or label
        session: String,
    },
}

/// Options for hosting a workspace
#[derive(Args, Clone, Debug, Default)]
pub struct HostArgs {
    /// Use the in-memory platform instead of spawning terminals
    #[arg(long)]
    pub fake: bool,

    /// Do not read console commands from stdin
    #[arg(long)]
    pub no_console: bool,
}

/// Output format for listing commands
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
    /// Output as CSV
    Csv,
}
