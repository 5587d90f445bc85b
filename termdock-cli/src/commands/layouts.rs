//! List saved layouts command.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use termdock_core::layout::{LayoutCatalog, LayoutStore, XmlLayoutStore};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::{column_width, escape_csv_field};
use crate::util::create_config_manager;

/// One saved layout, as listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutRow {
    /// Layout name
    pub name: String,
    /// Layout file
    pub path: String,
    /// Terminal panels, or `None` if the file cannot be read
    pub sessions: Option<usize>,
    /// Save time, RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    /// Whether this is the configured starting layout
    pub starting: bool,
}

/// `layouts` command handler
pub fn cmd_layouts(config_path: Option<&Path>, format: OutputFormat) -> Result<(), CliError> {
    let manager = create_config_manager(config_path)?;
    let settings = manager.load_settings()?;
    let mut catalog = LayoutCatalog::new(manager.layouts_dir(&settings));
    catalog
        .scan()
        .map_err(|e| CliError::Layout(e.to_string()))?;

    let store = XmlLayoutStore::new();
    let starting = settings.layouts.starting_layout.as_deref();
    let rows: Vec<LayoutRow> = catalog
        .list()
        .iter()
        .map(|entry| {
            let layout = store.load(&entry.path);
            if let Err(ref e) = layout {
                tracing::warn!(layout = %entry.name, error = %e, "Unreadable layout");
            }
            let layout = layout.ok();
            LayoutRow {
                name: entry.name.clone(),
                path: entry.path.display().to_string(),
                sessions: layout.as_ref().map(|l| l.session_ids().len()),
                saved_at: layout
                    .and_then(|l| l.saved_at)
                    .map(|t| t.to_rfc3339()),
                starting: starting.is_some_and(|s| s.eq_ignore_ascii_case(&entry.name)),
            }
        })
        .collect();

    let output = match format {
        OutputFormat::Table => format_table(&rows),
        OutputFormat::Json => serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))?,
        OutputFormat::Csv => format_csv(&rows),
    };
    println!("{output}");
    Ok(())
}

fn sessions_cell(row: &LayoutRow) -> String {
    row.sessions
        .map_or_else(|| "unreadable".to_string(), |n| n.to_string())
}

/// Format layouts as a table string; `*` marks the starting layout
#[must_use]
pub fn format_table(rows: &[LayoutRow]) -> String {
    if rows.is_empty() {
        return "No saved layouts.".to_string();
    }

    let name_width = column_width("NAME", rows.iter().map(|r| r.name.as_str())) + 2;
    let mut output = String::new();
    let _ = writeln!(output, "{:<name_width$}  {:<10}  PATH", "NAME", "SESSIONS");
    let _ = writeln!(output, "{:-<name_width$}  {:-<10}  ----", "", "");
    for row in rows {
        let marker = if row.starting { " *" } else { "" };
        let name = format!("{}{marker}", row.name);
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<10}  {}",
            name,
            sessions_cell(row),
            row.path
        );
    }
    output.trim_end().to_string()
}

/// Format layouts as CSV
#[must_use]
pub fn format_csv(rows: &[LayoutRow]) -> String {
    let mut output = String::from("name,sessions,saved_at,path\n");
    for row in rows {
        let _ = writeln!(
            output,
            "{},{},{},{}",
            escape_csv_field(&row.name),
            sessions_cell(row),
            row.saved_at.as_deref().unwrap_or_default(),
            escape_csv_field(&row.path)
        );
    }
    output.trim_end().to_string()
}
