//! CLI error types and exit codes.

use termdock_core::error::{ConfigError, LaunchError, TermDockError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, layout, I/O or other non-session errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Session failure - the session is unknown or its terminal could not be
    /// launched
    pub const SESSION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Terminal launch failed
    #[error("Launch failed: {0}")]
    Launch(String),

    /// Layout error
    #[error("Layout error: {0}")]
    Layout(String),

    /// Window system or process platform error
    #[error("Platform error: {0}")]
    Platform(String),

    /// Talking to a running workspace failed
    #[error("Re-entry error: {0}")]
    Reentry(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TermDockError> for CliError {
    fn from(err: TermDockError) -> Self {
        match err {
            TermDockError::Launch(LaunchError::ExecutableNotFound(path)) => Self::Launch(format!(
                "terminal executable not found: {}",
                path.display()
            )),
            TermDockError::Launch(e) => Self::Launch(e.to_string()),
            TermDockError::Registry(e) => Self::SessionNotFound(e.to_string()),
            TermDockError::Layout(e) => Self::Layout(e.to_string()),
            TermDockError::Transition(e) => Self::Layout(e.to_string()),
            TermDockError::Dock(e) => Self::Platform(e.to_string()),
            TermDockError::Config(e) => Self::Config(e.to_string()),
            TermDockError::Platform(e) => Self::Platform(e.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, layout, platform, re-entry, IO)
    /// - 2: Session failure (unknown session, launch failed)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::SessionNotFound(_) | Self::Launch(_) => exit_codes::SESSION_FAILURE,
            Self::Config(_)
            | Self::Layout(_)
            | Self::Platform(_)
            | Self::Reentry(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
