//! Settings and saved sessions file formats

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bridge::{
    DEFAULT_CLOSE_GRACE_ATTEMPTS, DEFAULT_WINDOW_WAIT_ATTEMPTS, DEFAULT_WINDOW_WAIT_INTERVAL_MS,
    WindowWaitConfig,
};
use crate::error::RegistryError;
use crate::models::{Credentials, Protocol, SessionDescriptor};
use crate::registry::{SessionRegistry, TREE_NAMESPACE};

/// Default terminal program
pub const DEFAULT_TERMINAL_EXECUTABLE: &str = "putty";

/// Default liveness poll interval in milliseconds
pub const DEFAULT_LIVENESS_INTERVAL_MS: u64 = 1000;

/// Top-level `settings.toml`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Terminal program and launch policy
    pub terminal: TerminalSettings,
    /// Layout files
    pub layouts: LayoutSettings,
    /// Workspace behaviour
    pub workspace: BehaviorSettings,
    /// Logging
    pub logging: LoggingSettings,
}

/// Terminal program settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Terminal executable; `~` is expanded, bare names are looked up in `PATH`
    pub executable: PathBuf,
    /// Window polls before a launch times out
    pub window_wait_attempts: u32,
    /// Delay between window polls in milliseconds
    pub window_wait_interval_ms: u64,
    /// Polls to wait for a graceful close before killing
    pub close_grace_attempts: u32,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_TERMINAL_EXECUTABLE),
            window_wait_attempts: DEFAULT_WINDOW_WAIT_ATTEMPTS,
            window_wait_interval_ms: DEFAULT_WINDOW_WAIT_INTERVAL_MS,
            close_grace_attempts: DEFAULT_CLOSE_GRACE_ATTEMPTS,
        }
    }
}

impl TerminalSettings {
    /// Window wait policy for the process bridge
    #[must_use]
    pub fn window_wait(&self) -> WindowWaitConfig {
        WindowWaitConfig::default()
            .with_attempts(self.window_wait_attempts)
            .with_interval(Duration::from_millis(self.window_wait_interval_ms.max(1)))
            .with_close_grace_attempts(self.close_grace_attempts)
    }
}

/// Layout settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Layouts directory; defaults to `<config dir>/layouts`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Layout loaded at startup; the default arrangement when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_layout: Option<String>,
}

/// Workspace behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorSettings {
    /// How often dead terminal panels are swept, in milliseconds
    pub liveness_interval_ms: u64,
    /// Main window title prefix
    pub window_title: String,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            liveness_interval_ms: DEFAULT_LIVENESS_INTERVAL_MS,
            window_title: "termdock".to_string(),
        }
    }
}

impl BehaviorSettings {
    /// Liveness poll interval
    #[must_use]
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms.max(10))
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level: error, warn, info, debug or trace
    pub level: String,
    /// Optional log file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Lines kept for the log viewer
    pub buffer_lines: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            buffer_lines: crate::tracing::DEFAULT_LOG_BUFFER_LINES,
        }
    }
}

/// One saved session in `sessions.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    /// Label; the session id is `tree/<label>`
    pub label: String,
    /// Display name; the label when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Host, serial device or shell command
    pub host: String,
    /// Protocol
    #[serde(default)]
    pub protocol: Protocol,
    /// Port; the protocol default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
    /// Login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Saved terminal configuration to load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_config: Option<String>,
}

impl SavedSession {
    /// Creates an entry with protocol defaults
    #[must_use]
    pub fn new(label: impl Into<String>, host: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            label: label.into(),
            name: None,
            host: host.into(),
            protocol,
            port: None,
            username: None,
            saved_config: None,
        }
    }

    /// Builds the runtime descriptor
    #[must_use]
    pub fn to_descriptor(&self) -> SessionDescriptor {
        let mut descriptor = SessionDescriptor::new(
            self.name.clone().unwrap_or_else(|| self.label.clone()),
            self.host.clone(),
            self.protocol,
        );
        if let Some(port) = self.port {
            descriptor = descriptor.with_port(port);
        }
        if let Some(ref user) = self.username {
            descriptor = descriptor.with_credentials(Credentials::user(user.clone()));
        }
        if let Some(ref saved) = self.saved_config {
            descriptor = descriptor.with_saved_config(saved.clone());
        }
        descriptor
    }
}

/// `sessions.toml`: the saved session tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionsFile {
    /// Saved sessions, in tree order
    #[serde(default, rename = "session")]
    pub sessions: Vec<SavedSession>,
}

impl SessionsFile {
    /// Registers every saved session under the `tree` namespace
    ///
    /// Entries that fail to register are skipped and returned with their
    /// error.
    pub fn register_all(
        &self,
        registry: &mut SessionRegistry,
    ) -> Vec<(String, RegistryError)> {
        let mut failures = Vec::new();
        for saved in &self.sessions {
            if let Err(e) = registry.register(TREE_NAMESPACE, &saved.label, saved.to_descriptor()) {
                tracing::warn!(label = %saved.label, error = %e, "Skipping saved session");
                failures.push((saved.label.clone(), e));
            }
        }
        failures
    }
}
