//! Error types for `termdock`
//!
//! Each concern has its own `thiserror` enum; [`TermDockError`] wraps them so
//! callers that only want to report a failure can use a single type.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::SessionId;

/// Top-level error type for the workspace core
#[derive(Debug, Error)]
pub enum TermDockError {
    /// Launching an embedded session failed
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// Session registry lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Layout load/save failed
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A layout transition is already running
    #[error(transparent)]
    Transition(#[from] TransitionConflict),

    /// Dock host rejected an operation
    #[error(transparent)]
    Dock(#[from] DockError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Native window / process platform error
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result type alias using [`TermDockError`]
pub type Result<T> = std::result::Result<T, TermDockError>;

/// Errors raised while bringing up an embedded session
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The configured terminal executable does not resolve on disk
    #[error("Terminal executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    /// The OS refused to start the process
    #[error("Failed to start terminal process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// The process exited before its window appeared
    #[error("Terminal process for '{0}' exited before its window appeared")]
    ProcessExited(SessionId),

    /// No top-level window appeared within the retry budget
    #[error("No window appeared for '{session_id}' after {attempts} attempts")]
    WindowTimeout {
        /// Session that failed to show a window
        session_id: SessionId,
        /// Number of polls made before giving up
        attempts: u32,
    },

    /// Reparenting or sizing the new window failed
    #[error("Failed to embed terminal window: {0}")]
    Platform(#[from] PlatformError),
}

/// Result type for launch operations
pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

/// Session registry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No session with this id is registered
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// Label was empty after trimming
    #[error("Session label cannot be empty")]
    EmptyLabel,

    /// Disambiguation ran out of suffixes
    #[error("Could not find a unique id for '{0}'")]
    Exhausted(String),
}

/// Result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Layout persistence errors
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Reading or writing the layout file failed
    #[error("Layout I/O error for {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The layout file could not be parsed
    #[error("Failed to parse layout {}: {message}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The layout could not be serialized
    #[error("Failed to serialize layout: {0}")]
    Serialize(String),

    /// No layout with this name exists in the catalog
    #[error("Layout not found: {0}")]
    NotFound(String),

    /// The current layout is the unsaved default and needs a path
    #[error("Current layout has not been saved yet; choose a file")]
    Unsaved,
}

/// Result type for layout operations
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;

/// A saved layout referenced something that no longer exists
///
/// Recoverable: the panel is skipped and the rest of the layout restores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutResolutionWarning {
    /// The saved terminal panel's session id is no longer registered
    MissingSession(SessionId),
    /// The persist token does not name any known panel kind
    UnknownToken(String),
    /// The session resolved but its terminal could not be launched
    LaunchFailed {
        /// Session that failed
        session_id: SessionId,
        /// Launch error message
        message: String,
    },
}

impl std::fmt::Display for LayoutResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSession(id) => write!(f, "session '{id}' no longer exists, panel skipped"),
            Self::UnknownToken(token) => write!(f, "unknown panel '{token}', panel skipped"),
            Self::LaunchFailed {
                session_id,
                message,
            } => write!(f, "session '{session_id}' failed to launch: {message}"),
        }
    }
}

/// A layout transition was requested while another one was running
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Layout transition to '{requested}' rejected: a transition is already in progress")]
pub struct TransitionConflict {
    /// Layout the rejected request asked for
    pub requested: String,
}

/// Dock host errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DockError {
    /// The panel is not attached to the dock
    #[error("Panel is not docked: {0}")]
    NotDocked(String),

    /// The panel is already attached
    #[error("Panel is already docked: {0}")]
    AlreadyDocked(String),

    /// Placement refers to a panel that is not docked
    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),
}

/// Result type for dock operations
pub type DockResult<T> = std::result::Result<T, DockError>;

/// Native window / process errors
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The native window no longer exists
    #[error("Window {0} no longer exists")]
    WindowGone(u64),

    /// A helper program failed
    #[error("{program} failed: {message}")]
    CommandFailed {
        /// Helper program name
        program: String,
        /// Error output
        message: String,
    },

    /// I/O error talking to the platform
    #[error("Platform I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for platform operations
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration directory could be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// Reading or writing a config file failed
    #[error("Config I/O error for {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file contents are invalid
    #[error("Failed to parse {}: {message}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
