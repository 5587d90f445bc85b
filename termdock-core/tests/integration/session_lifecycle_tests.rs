//! Opening, activating, closing and losing terminal sessions

use termdock_core::error::{LaunchError, RegistryError};
use termdock_core::models::{PanelKind, Protocol, SessionId};
use termdock_core::platform::FakeBehavior;
use termdock_core::registry::CONNECT_BAR_NAMESPACE;
use termdock_core::workspace::{QuickConnect, StartupOptions, StatusEvent};
use termdock_core::{DockHost, Panel, TermDockError, TerminalPanel};

use super::{TestWorkspace, session_id};

#[tokio::test]
async fn test_missing_executable_leaves_live_set_unchanged() {
    let mut ws = TestWorkspace::without_executable();
    ws.reset().await;
    let docked_before = ws.workspace.dock().panels().len();

    let result = ws.workspace.open_session(&session_id("alpha")).await;

    assert!(matches!(
        result,
        Err(TermDockError::Launch(LaunchError::ExecutableNotFound(_)))
    ));
    assert_eq!(ws.workspace.state().terminal_count(), 0);
    assert_eq!(ws.workspace.dock().panels().len(), docked_before);
    assert!(ws.platform.launches().is_empty());
    assert!(
        ws.status
            .messages()
            .iter()
            .any(|m| m.starts_with("Failed to open"))
    );
}

#[tokio::test]
async fn test_window_timeout_kills_process_and_panel() {
    let mut ws = TestWorkspace::new();
    ws.platform.set_session_behavior(
        &session_id("alpha"),
        FakeBehavior {
            never_show_window: true,
            ..FakeBehavior::default()
        },
    );
    ws.reset().await;

    let result = ws.workspace.open_session(&session_id("alpha")).await;
    assert!(matches!(
        result,
        Err(TermDockError::Launch(LaunchError::WindowTimeout { .. }))
    ));
    assert_eq!(ws.platform.live_process_count(), 0);
    assert_eq!(ws.workspace.state().terminal_count(), 0);
}

#[tokio::test]
async fn test_unknown_session_is_reported() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let result = ws
        .workspace
        .open_session(&SessionId::from("tree/nobody"))
        .await;
    assert!(matches!(
        result,
        Err(TermDockError::Registry(RegistryError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_opening_live_session_activates_existing_panel() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let first = ws
        .workspace
        .open_session(&session_id("alpha"))
        .await
        .expect("first open");
    ws.open_all(&["beta"]).await;

    let second = ws
        .workspace
        .open_session(&session_id("alpha"))
        .await
        .expect("second open");
    assert_eq!(first, second);
    assert_eq!(ws.platform.launch_count_for(&session_id("alpha")), 1);
    assert_eq!(ws.workspace.state().focused(), Some(first));
    assert_eq!(ws.platform.focused_session(), Some(session_id("alpha")));
}

#[tokio::test]
async fn test_activation_sets_window_title() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let panel = ws
        .workspace
        .open_session(&session_id("gamma"))
        .await
        .expect("open");

    assert_eq!(ws.workspace.dock().window_title(), "termdock - gamma");
    assert!(ws.status.events().contains(&StatusEvent::ActivePanelChanged {
        panel_id: panel,
        window_title: "termdock - gamma".to_string(),
    }));
}

#[tokio::test]
async fn test_process_exit_evicts_panel() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha", "beta"]).await;

    assert!(ws.platform.exit_session(&session_id("beta")));
    ws.workspace.drain_exits();

    assert_eq!(ws.workspace.state().live_session_ids(), vec![session_id("alpha")]);
    assert!(ws.status.events().contains(&StatusEvent::SessionExited {
        session_id: session_id("beta")
    }));
    // Focus falls back to the remaining terminal
    let alpha_panel = ws
        .workspace
        .state()
        .terminal_for(&session_id("alpha"))
        .map(TerminalPanel::id);
    assert_eq!(ws.workspace.state().focused(), alpha_panel);
}

#[tokio::test]
async fn test_stale_exit_notice_spares_relaunched_session() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let first = ws
        .workspace
        .open_session(&session_id("alpha"))
        .await
        .expect("open");
    assert!(ws.workspace.close_panel(first).await);

    // The exit notice of the first launch is still queued
    let second = ws
        .workspace
        .open_session(&session_id("alpha"))
        .await
        .expect("reopen");
    ws.workspace.drain_exits();

    assert_ne!(first, second);
    assert!(ws.workspace.state().panel(second).is_some());
    assert_eq!(ws.workspace.evict_dead_panels(), 0);
}

#[tokio::test]
async fn test_tool_panels_cannot_be_closed() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let tree = ws
        .workspace
        .state()
        .panel_of_kind(&PanelKind::SessionTree)
        .map(Panel::id)
        .expect("session tree");

    assert!(!ws.workspace.close_panel(tree).await);
    assert!(ws.workspace.state().panel(tree).is_some());
}

#[tokio::test]
async fn test_close_panel_ends_process() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let panel = ws
        .workspace
        .open_session(&session_id("alpha"))
        .await
        .expect("open");

    assert!(ws.workspace.close_panel(panel).await);
    assert_eq!(ws.platform.live_process_count(), 0);
    assert!(ws.workspace.dock().entry(panel).is_none());
}

#[tokio::test]
async fn test_stubborn_terminal_is_killed_after_grace() {
    let mut ws = TestWorkspace::new();
    ws.platform.set_session_behavior(
        &session_id("alpha"),
        FakeBehavior {
            ignore_close: true,
            ..FakeBehavior::default()
        },
    );
    ws.reset().await;
    let panel = ws
        .workspace
        .open_session(&session_id("alpha"))
        .await
        .expect("open");

    assert!(ws.workspace.close_panel(panel).await);
    assert_eq!(ws.platform.live_process_count(), 0);
}

#[tokio::test]
async fn test_quick_connect_registers_under_connect_bar() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let request = QuickConnect::new("10.0.0.5", Protocol::Telnet).with_username("ops");

    ws.workspace
        .quick_connect(request)
        .await
        .expect("quick connect");

    let id = SessionId::combine(CONNECT_BAR_NAMESPACE, "10.0.0.5");
    assert!(ws.workspace.registry().contains(&id));
    let launch = ws.platform.launches().pop().expect("launch recorded");
    assert_eq!(
        launch.args,
        vec!["-telnet", "-P", "23", "-l", "ops", "10.0.0.5"]
    );
}

#[tokio::test]
async fn test_quick_connect_rejects_blank_host() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let result = ws
        .workspace
        .quick_connect(QuickConnect::new("  ", Protocol::Ssh))
        .await;
    assert!(matches!(
        result,
        Err(TermDockError::Registry(RegistryError::EmptyLabel))
    ));
}

#[tokio::test]
async fn test_startup_with_session_uses_default_layout() {
    let mut ws = TestWorkspace::new();
    ws.workspace
        .startup(StartupOptions {
            starting_session: Some(session_id("delta")),
            starting_layout: None,
        })
        .await;

    assert!(ws.workspace.state().active_layout().is_none());
    assert_eq!(ws.workspace.state().live_session_ids(), vec![session_id("delta")]);
}

#[tokio::test]
async fn test_log_viewer_is_created_once() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let first = ws.workspace.show_log_viewer().expect("log viewer");
    let second = ws.workspace.show_log_viewer().expect("log viewer");
    assert_eq!(first, second);
    assert_eq!(ws.workspace.state().focused(), Some(first));
    assert!(ws.workspace.close_panel(first).await);
}

#[tokio::test]
async fn test_close_workspace_ends_everything() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha", "beta", "gamma"]).await;

    ws.workspace.close().await;
    assert_eq!(ws.platform.live_process_count(), 0);
    assert!(ws.workspace.dock().panels().is_empty());
    assert!(ws.workspace.state().panels().is_empty());
    assert!(!ws.workspace.is_open());
}
