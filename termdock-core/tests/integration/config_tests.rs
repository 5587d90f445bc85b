//! Settings and saved sessions feeding a workspace

use std::rc::Rc;

use termdock_core::config::{ConfigManager, SavedSession, SessionsFile, WorkspaceSettings};
use termdock_core::models::{LayoutTarget, Protocol};
use termdock_core::platform::FakePlatform;
use termdock_core::registry::SessionRegistry;
use termdock_core::workspace::{Orchestrator, StartupOptions};
use termdock_core::{DockHost, VirtualDock};

use super::session_id;

fn create_test_sessions() -> SessionsFile {
    let mut db = SavedSession::new("db", "db.internal", Protocol::Ssh);
    db.username = Some("postgres".to_string());
    db.port = Some(2222);
    let mut console = SavedSession::new("console", "/dev/ttyUSB0", Protocol::Serial);
    console.port = Some(115_200);
    SessionsFile {
        sessions: vec![db, console, SavedSession::new("", "nowhere", Protocol::Raw)],
    }
}

#[test]
fn test_sessions_file_round_trip_through_config_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = ConfigManager::with_config_dir(dir.path().to_path_buf());
    let sessions = create_test_sessions();

    manager.save_sessions(&sessions).expect("save sessions");
    let loaded = manager.load_sessions().expect("load sessions");
    assert_eq!(loaded, sessions);

    let mut registry = SessionRegistry::new();
    let failures = loaded.register_all(&mut registry);
    assert_eq!(failures.len(), 1);
    assert_eq!(registry.len(), 2);
    let db = registry.resolve(&session_id("db")).expect("db session");
    assert_eq!(db.port, 2222);
    assert_eq!(db.credentials.username.as_deref(), Some("postgres"));
}

#[tokio::test]
async fn test_configured_starting_layout_is_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = ConfigManager::with_config_dir(dir.path().to_path_buf());
    let exe = dir.path().join("putty");
    std::fs::write(&exe, b"").expect("write executable");

    let mut settings = WorkspaceSettings::default();
    settings.terminal.executable = exe.clone();
    settings.terminal.window_wait_interval_ms = 1;
    settings.layouts.starting_layout = Some("morning".to_string());
    manager.save_settings(&settings).expect("save settings");
    manager.save_sessions(&create_test_sessions()).expect("save sessions");
    manager.ensure_dirs(&settings).expect("dirs");

    let settings = manager.load_settings().expect("load settings");
    let mut registry = SessionRegistry::new();
    manager
        .load_sessions()
        .expect("load sessions")
        .register_all(&mut registry);

    let platform = FakePlatform::new();
    let build = |registry: SessionRegistry| {
        Orchestrator::new(
            VirtualDock::new(),
            Box::new(platform.clone()),
            Rc::new(platform.clone()),
            settings.terminal.executable.clone(),
            manager.layouts_dir(&settings),
        )
        .with_settings(&settings)
        .with_registry(registry)
    };

    // First run: open a session and save it as the starting layout
    let mut workspace = build(registry.clone());
    workspace.open().expect("open");
    workspace.startup(StartupOptions::default()).await;
    assert!(workspace.state().active_layout().is_none());
    workspace
        .open_session(&session_id("db"))
        .await
        .expect("open db");
    workspace
        .save_layout_as(std::path::Path::new("morning"))
        .expect("save layout");
    workspace.close().await;

    // Second run picks it up
    let mut workspace = build(registry);
    workspace.open().expect("open");
    let starting_layout = settings
        .layouts
        .starting_layout
        .as_deref()
        .map(LayoutTarget::parse);
    workspace
        .startup(StartupOptions {
            starting_session: None,
            starting_layout,
        })
        .await;

    assert_eq!(
        workspace.state().active_layout().map(|l| l.name.as_str()),
        Some("morning")
    );
    assert_eq!(workspace.state().live_session_ids(), vec![session_id("db")]);
    assert_eq!(workspace.dock().window_title(), "termdock - db");
    assert_eq!(workspace.dock().panels().len(), 3);
}
