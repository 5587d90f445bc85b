//! Shared utility functions used across command modules.

use std::path::Path;
use std::sync::Arc;

use termdock_core::config::{ConfigManager, WorkspaceSettings};
use termdock_core::models::{Protocol, SESSION_ID_SEPARATOR, SessionDescriptor, SessionId};
use termdock_core::registry::{SessionRegistry, TREE_NAMESPACE};
use termdock_core::tracing::{
    LogBuffer, TracingConfig, TracingLevel, TracingOutput, init_tracing,
};

use crate::error::CliError;

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Parses a protocol name for clap
pub fn parse_protocol(s: &str) -> Result<Protocol, String> {
    s.parse()
}

/// Loads saved sessions into a fresh registry
///
/// Entries that cannot be registered are reported on stderr and skipped.
pub fn load_registry(manager: &ConfigManager, quiet: bool) -> Result<SessionRegistry, CliError> {
    let sessions = manager
        .load_sessions()
        .map_err(|e| CliError::Config(format!("Failed to load sessions: {e}")))?;
    let mut registry = SessionRegistry::new();
    for (label, error) in sessions.register_all(&mut registry) {
        if !quiet {
            eprintln!("Warning: skipping saved session '{label}': {error}");
        }
    }
    Ok(registry)
}

/// Qualifies a bare label with the session tree namespace
#[must_use]
pub fn qualify_session_id(name_or_id: &str) -> SessionId {
    let name_or_id = name_or_id.trim();
    if name_or_id.contains(SESSION_ID_SEPARATOR) {
        SessionId::from(name_or_id)
    } else {
        SessionId::combine(TREE_NAMESPACE, name_or_id)
    }
}

/// Find a session by id, label or display name
pub fn find_session(
    registry: &SessionRegistry,
    name_or_id: &str,
) -> Result<Arc<SessionDescriptor>, CliError> {
    // Exact id, or a label in the session tree
    if let Ok(descriptor) = registry.resolve(&qualify_session_id(name_or_id)) {
        return Ok(descriptor);
    }

    let sessions = registry.list_all();

    // Case-insensitive display name
    if let Some(descriptor) = sessions
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name_or_id))
    {
        return Ok(Arc::clone(descriptor));
    }

    // Unique prefix of the display name
    let needle = name_or_id.to_lowercase();
    let matches: Vec<_> = sessions
        .iter()
        .filter(|s| s.name.to_lowercase().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [] => Err(CliError::SessionNotFound(name_or_id.to_string())),
        [only] => Ok(Arc::clone(only)),
        _ => {
            let names: Vec<_> = matches.iter().map(|s| s.id.as_str()).collect();
            Err(CliError::Config(format!(
                "Ambiguous session name '{}'. Matches: {}",
                name_or_id,
                names.join(", ")
            )))
        }
    }
}

/// Initializes logging and returns the buffer feeding the log viewer
///
/// `-v` flags override the configured level. A workspace with a console
/// keeps stderr quiet unless asked, so logs only reach the buffer and the
/// configured file.
pub fn init_logging(
    config_path: Option<&Path>,
    verbose: u8,
    quiet: bool,
    hosting: bool,
) -> LogBuffer {
    let settings = create_config_manager(config_path)
        .and_then(|m| m.load_settings().map_err(CliError::from))
        .unwrap_or_else(|_| WorkspaceSettings::default());

    let level = match verbose {
        0 if quiet => TracingLevel::Error,
        0 if hosting => settings.logging.level.parse().unwrap_or_default(),
        0 => TracingLevel::Warn,
        1 => TracingLevel::Info,
        2 => TracingLevel::Debug,
        _ => TracingLevel::Trace,
    };
    let output = match settings.logging.file {
        Some(path) => TracingOutput::File {
            path: shellexpand::tilde(&path.to_string_lossy()).into_owned().into(),
        },
        None if hosting && verbose == 0 => TracingOutput::BufferOnly,
        None => TracingOutput::Stderr,
    };

    let buffer = LogBuffer::new(settings.logging.buffer_lines);
    let config = TracingConfig::new()
        .with_level(level)
        .with_output(output)
        .with_thread_ids(false)
        .with_buffer(buffer.clone());
    if let Err(e) = init_tracing(&config) {
        eprintln!("Warning: logging not initialized: {e}");
    }
    buffer
}
