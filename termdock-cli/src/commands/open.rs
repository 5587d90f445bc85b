//! `open` and `connect`: hand the request to a running workspace, or start
//! one that shows it.

use std::path::Path;

use secrecy::SecretString;
use termdock_core::models::Protocol;
use termdock_core::tracing::LogBuffer;
use termdock_core::workspace::QuickConnect;

use super::run::{Startup, host_prepared};
use crate::cli::HostArgs;
use crate::error::CliError;
use crate::reentry::{ReentryRequest, forward};
use crate::util::{create_config_manager, find_session, load_registry};

/// `open` command handler
pub fn cmd_open(
    config_path: Option<&Path>,
    session: &str,
    host_args: &HostArgs,
    quiet: bool,
    logs: LogBuffer,
) -> Result<(), CliError> {
    let manager = create_config_manager(config_path)?;
    let registry = load_registry(&manager, quiet)?;
    let descriptor = find_session(&registry, session)?;
    let session_id = descriptor.id.clone();

    if forward(&ReentryRequest::Open {
        session_id: session_id.clone(),
    })? {
        if !quiet {
            println!("Opened '{}' in the running workspace", descriptor.title());
        }
        return Ok(());
    }

    host_prepared(
        config_path,
        Startup {
            session: Some(session_id),
            ..Startup::default()
        },
        host_args,
        quiet,
        logs,
    )
}

/// Quick-connect parameters from the command line
pub struct ConnectParams<'a> {
    pub host: &'a str,
    pub protocol: Protocol,
    pub port: Option<u32>,
    pub user: Option<&'a str>,
    pub password: Option<String>,
    pub load: Option<&'a str>,
}

/// `connect` command handler
pub fn cmd_connect(
    config_path: Option<&Path>,
    params: ConnectParams<'_>,
    host_args: &HostArgs,
    quiet: bool,
    logs: LogBuffer,
) -> Result<(), CliError> {
    if params.host.trim().is_empty() {
        return Err(CliError::Config("host must not be empty".to_string()));
    }

    let request = ReentryRequest::Connect {
        host: params.host.to_string(),
        protocol: params.protocol,
        port: params.port,
        username: params.user.map(str::to_string),
        saved_config: params.load.map(str::to_string),
    };
    if forward(&request)? {
        if params.password.is_some() && !quiet {
            eprintln!("Warning: password not forwarded to the running workspace");
        }
        if !quiet {
            println!("Connecting to '{}' in the running workspace", params.host);
        }
        return Ok(());
    }

    let quick_connect = QuickConnect {
        host: params.host.to_string(),
        protocol: params.protocol,
        port: params.port,
        username: params.user.map(str::to_string),
        password: params.password.map(SecretString::from),
        saved_config: params.load.map(str::to_string),
    };
    host_prepared(
        config_path,
        Startup {
            quick_connect: Some(quick_connect),
            ..Startup::default()
        },
        host_args,
        quiet,
        logs,
    )
}
