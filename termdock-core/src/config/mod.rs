//! Configuration management for `termdock`
//!
//! This module provides the `ConfigManager` for loading and saving
//! configuration files in TOML format.

mod manager;
pub mod settings;

pub use manager::{APP_DIR_NAME, ConfigManager, LAYOUTS_DIR, SESSIONS_FILE, SETTINGS_FILE};
pub use settings::{
    BehaviorSettings, LayoutSettings, LoggingSettings, SavedSession, SessionsFile,
    TerminalSettings, WorkspaceSettings,
};
