//! List saved sessions command.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use termdock_core::models::SessionDescriptor;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{column_width, escape_csv_field};
use crate::util::{create_config_manager, load_registry};

/// `sessions` command handler
pub fn cmd_sessions(
    config_path: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let manager = create_config_manager(config_path)?;
    let registry = load_registry(&manager, quiet)?;
    let sessions = registry.list_all();

    let output = match format {
        OutputFormat::Table => format_table(&sessions),
        OutputFormat::Json => format_json(&sessions)?,
        OutputFormat::Csv => format_csv(&sessions),
    };
    println!("{output}");
    Ok(())
}

/// Session row for JSON output; never carries credentials
#[derive(Debug, Serialize)]
struct SessionOutput<'a> {
    id: &'a str,
    name: &'a str,
    host: &'a str,
    port: u32,
    protocol: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_config: Option<&'a str>,
}

impl<'a> From<&'a SessionDescriptor> for SessionOutput<'a> {
    fn from(s: &'a SessionDescriptor) -> Self {
        Self {
            id: s.id.as_str(),
            name: s.title(),
            host: &s.host,
            port: s.port,
            protocol: s.protocol.as_str(),
            username: s.credentials.username.as_deref(),
            saved_config: s.saved_config.as_deref(),
        }
    }
}

/// Format sessions as a table string
#[must_use]
pub fn format_table(sessions: &[Arc<SessionDescriptor>]) -> String {
    if sessions.is_empty() {
        return "No saved sessions.".to_string();
    }

    let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
    let hosts: Vec<&str> = sessions.iter().map(|s| s.host.as_str()).collect();
    let id_width = column_width("ID", ids.iter().copied());
    let host_width = column_width("HOST", hosts.iter().copied());
    let port_width = 6;

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<id_width$}  {:<host_width$}  {:<port_width$}  PROTOCOL",
        "ID", "HOST", "PORT"
    );
    let _ = writeln!(
        output,
        "{:-<id_width$}  {:-<host_width$}  {:-<port_width$}  --------",
        "", "", ""
    );
    for session in sessions {
        let _ = writeln!(
            output,
            "{:<id_width$}  {:<host_width$}  {:<port_width$}  {}",
            session.id, session.host, session.port, session.protocol
        );
    }
    output.trim_end().to_string()
}

/// Format sessions as JSON
///
/// # Errors
///
/// Returns `CliError::Config` if JSON serialization fails.
pub fn format_json(sessions: &[Arc<SessionDescriptor>]) -> Result<String, CliError> {
    let output: Vec<SessionOutput<'_>> = sessions.iter().map(|s| s.as_ref().into()).collect();
    serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))
}

/// Format sessions as CSV
#[must_use]
pub fn format_csv(sessions: &[Arc<SessionDescriptor>]) -> String {
    let mut output = String::from("id,name,host,port,protocol\n");
    for s in sessions {
        let _ = writeln!(
            output,
            "{},{},{},{},{}",
            escape_csv_field(s.id.as_str()),
            escape_csv_field(s.title()),
            escape_csv_field(&s.host),
            s.port,
            s.protocol.as_str()
        );
    }
    output.trim_end().to_string()
}
