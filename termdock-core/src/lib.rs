//! `termdock` Core Library
//!
//! This crate provides the workspace logic behind `termdock`: external
//! terminal processes embedded in dock panels, saved layouts, and command
//! broadcast to every open terminal.
//!
//! # Crate Structure
//!
//! - [`models`] - Session descriptors, panel kinds and layout descriptors
//! - [`registry`] - Session lookup by unique id
//! - [`bridge`] - Launching terminal processes and embedding their windows
//! - [`platform`] - Process and window system seams, with real and fake backends
//! - [`dock`] - Dock host seam and panel types
//! - [`layout`] - Layout files, the layout catalog and the transition state machine
//! - [`broadcast`] - Typing one command into every terminal
//! - [`workspace`] - The orchestrator that ties everything together
//! - [`config`] - Settings and saved sessions
//! - [`tracing`] - Structured logging setup and the in-memory log buffer

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod bridge;
pub mod broadcast;
pub mod config;
pub mod dock;
pub mod error;
pub mod layout;
pub mod models;
pub mod platform;
pub mod registry;
pub mod tracing;
pub mod workspace;

pub use bridge::{
    CommandLine, EmbeddedSession, ProcessBridge, WindowWaitConfig, build_command_line,
    resolve_executable,
};
pub use broadcast::{BroadcastReport, CommandBroadcaster};
pub use config::{ConfigManager, SavedSession, SessionsFile, WorkspaceSettings};
pub use dock::{DockHost, DockedPanel, Panel, PanelId, TerminalPanel, ToolPanel, VirtualDock};
pub use error::{
    ConfigError, DockError, LaunchError, LayoutError, LayoutResolutionWarning, PlatformError,
    RegistryError, Result, TermDockError, TransitionConflict,
};
pub use layout::{
    LayoutCatalog, LayoutEntry, LayoutStore, TransitionController, TransitionState,
    XmlLayoutStore,
};
pub use models::{
    DockArea, DockPlacement, LayoutDescriptor, LayoutTarget, PanelKind, PanelPlacement,
    Protocol, SessionDescriptor, SessionId,
};
pub use platform::{
    FakePlatform, HostSurface, InputEvent, InputKey, NativeWindow, ProcessLauncher,
    SurfaceSize, SystemLauncher, WindowSystem, XdotoolWindowSystem,
};
pub use registry::{CONNECT_BAR_NAMESPACE, SessionRegistry, TREE_NAMESPACE};
pub use tracing::{LogBuffer, LogLine, TracingConfig, TracingLevel, TracingOutput, init_tracing};
pub use workspace::{
    Orchestrator, QuickConnect, StartupOptions, StatusEvent, StatusLog, StatusObserver,
    TransitionReport, WorkspaceHandle, WorkspaceRequest, WorkspaceState, WorkspaceSummary,
};
