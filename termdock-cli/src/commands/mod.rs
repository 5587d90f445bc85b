//! Command handler modules for the CLI.

mod command_line;
mod layouts;
mod open;
mod run;
mod sessions;

use std::path::Path;

use termdock_core::tracing::LogBuffer;

use crate::cli::Commands;
use crate::error::CliError;

/// Flags shared by every command
#[derive(Debug, Clone, Copy)]
pub struct GlobalFlags<'a> {
    /// Custom configuration directory
    pub config_path: Option<&'a Path>,
    /// Suppress non-error output
    pub quiet: bool,
}

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(
    flags: GlobalFlags<'_>,
    command: Commands,
    logs: LogBuffer,
) -> Result<(), CliError> {
    let GlobalFlags { config_path, quiet } = flags;
    match command {
        Commands::Run {
            layout,
            session,
            host,
        } => run::cmd_run(config_path, layout, session.as_deref(), &host, quiet, logs),
        Commands::Open { session, host } => {
            open::cmd_open(config_path, &session, &host, quiet, logs)
        }
        Commands::Connect {
            host,
            protocol,
            port,
            user,
            password,
            load,
            host_args,
        } => open::cmd_connect(
            config_path,
            open::ConnectParams {
                host: &host,
                protocol,
                port,
                user: user.as_deref(),
                password,
                load: load.as_deref(),
            },
            &host_args,
            quiet,
            logs,
        ),
        Commands::Sessions { format } => sessions::cmd_sessions(config_path, format, quiet),
        Commands::Layouts { format } => layouts::cmd_layouts(config_path, format),
        Commands::CommandLine { session } => {
            command_line::cmd_command_line(config_path, &session, quiet)
        }
    }
}
