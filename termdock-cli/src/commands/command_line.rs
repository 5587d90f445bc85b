//! Show the terminal command line for a session.

use std::path::Path;

use termdock_core::bridge::{build_command_line, resolve_executable};

use crate::error::CliError;
use crate::util::{create_config_manager, find_session, load_registry};

/// `command-line` command handler
///
/// Prints the redacted command line; the configured executable is used as
/// is when it cannot be found.
pub fn cmd_command_line(
    config_path: Option<&Path>,
    session: &str,
    quiet: bool,
) -> Result<(), CliError> {
    let manager = create_config_manager(config_path)?;
    let settings = manager.load_settings()?;
    let registry = load_registry(&manager, quiet)?;
    let descriptor = find_session(&registry, session)?;

    let configured = &settings.terminal.executable;
    let program = resolve_executable(configured).unwrap_or_else(|| {
        if !quiet {
            eprintln!(
                "Warning: terminal executable not found: {}",
                configured.display()
            );
        }
        configured.clone()
    });

    println!("{}", build_command_line(&program, &descriptor));
    Ok(())
}
