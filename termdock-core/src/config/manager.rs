//! Loads and saves the TOML configuration files

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::settings::{SessionsFile, WorkspaceSettings};
use crate::error::{ConfigError, ConfigResult};

/// Directory name under the user config directory
pub const APP_DIR_NAME: &str = "termdock";
/// Settings file name
pub const SETTINGS_FILE: &str = "settings.toml";
/// Saved sessions file name
pub const SESSIONS_FILE: &str = "sessions.toml";
/// Default layouts subdirectory
pub const LAYOUTS_DIR: &str = "layouts";

/// Configuration directory access
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses `~/.config/termdock` (or the platform equivalent)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if no config directory is known.
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_config_dir(base.join(APP_DIR_NAME)))
    }

    /// Uses an explicit configuration directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Layouts directory for the given settings
    #[must_use]
    pub fn layouts_dir(&self, settings: &WorkspaceSettings) -> PathBuf {
        match settings.layouts.directory {
            Some(ref dir) => {
                let raw = dir.to_string_lossy();
                PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
            }
            None => self.config_dir.join(LAYOUTS_DIR),
        }
    }

    /// Creates the config and layouts directories
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if a directory cannot be created.
    pub fn ensure_dirs(&self, settings: &WorkspaceSettings) -> ConfigResult<()> {
        for dir in [self.config_dir.clone(), self.layouts_dir(settings)] {
            fs::create_dir_all(&dir).map_err(|source| ConfigError::Io { path: dir, source })?;
        }
        Ok(())
    }

    /// Loads `settings.toml`, or defaults when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_settings(&self) -> ConfigResult<WorkspaceSettings> {
        self.load_toml(SETTINGS_FILE)
    }

    /// Writes `settings.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_settings(&self, settings: &WorkspaceSettings) -> ConfigResult<()> {
        self.save_toml(SETTINGS_FILE, settings)
    }

    /// Loads `sessions.toml`, or an empty tree when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_sessions(&self) -> ConfigResult<SessionsFile> {
        self.load_toml(SESSIONS_FILE)
    }

    /// Writes `sessions.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_sessions(&self, sessions: &SessionsFile) -> ConfigResult<()> {
        self.save_toml(SESSIONS_FILE, sessions)
    }

    fn load_toml<T: DeserializeOwned + Default>(&self, file_name: &str) -> ConfigResult<T> {
        let _span = tracing::debug_span!(crate::tracing::span_names::CONFIG_LOAD, file = file_name)
            .entered();
        let path = self.config_dir.join(file_name);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file missing, using defaults");
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path,
            message: e.to_string(),
        })
    }

    fn save_toml<T: Serialize>(&self, file_name: &str, value: &T) -> ConfigResult<()> {
        fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;
        let path = self.config_dir.join(file_name);
        let content =
            toml::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(&path, content).map_err(|source| ConfigError::Io { path, source })
    }
}
