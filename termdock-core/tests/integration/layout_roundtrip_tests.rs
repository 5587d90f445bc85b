//! Layout save/restore and switching

use std::collections::HashSet;

use termdock_core::error::{LayoutError, LayoutResolutionWarning};
use termdock_core::models::{LayoutTarget, PanelKind};
use termdock_core::workspace::StatusEvent;
use termdock_core::{DockHost, PanelId, TransitionState};

use super::{TestWorkspace, session_id};

fn terminal(label: &str) -> PanelKind {
    PanelKind::Terminal {
        session_id: session_id(label),
    }
}

#[tokio::test]
async fn test_default_layout_docks_tool_panels() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;

    assert_eq!(
        ws.dock_kinds(),
        vec![PanelKind::SessionTree, PanelKind::LayoutList]
    );
    assert!(ws.workspace.state().active_layout().is_none());
    assert_eq!(ws.workspace.transition_state(), TransitionState::Idle);
    assert!(
        ws.status
            .messages()
            .contains(&"Initialized default layout".to_string())
    );
}

#[tokio::test]
async fn test_save_then_restore_reproduces_dock_order() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["gamma", "alpha", "beta"]).await;
    let saved_kinds = ws.dock_kinds();

    let path = ws.layout_path("work");
    ws.workspace.save_layout_as(&path).expect("save layout");
    assert!(path.is_file());
    assert!(ws.workspace.catalog().find("work").is_some());

    ws.reset().await;
    assert_eq!(ws.workspace.state().terminal_count(), 0);
    assert_eq!(ws.platform.live_process_count(), 0);

    let report = ws
        .workspace
        .switch_layout(LayoutTarget::Named("work".to_string()))
        .await
        .expect("restore layout");

    assert!(report.warnings.is_empty());
    assert_eq!(report.layout.as_deref(), Some("work"));
    assert_eq!(ws.dock_kinds(), saved_kinds);
    assert_eq!(
        ws.dock_kinds()[2..],
        [terminal("gamma"), terminal("alpha"), terminal("beta")]
    );
    assert_eq!(ws.platform.live_process_count(), 3);
    assert!(
        ws.status
            .messages()
            .iter()
            .any(|m| m.starts_with("Loaded layout: ") && m.ends_with("work.xml"))
    );
}

#[tokio::test]
async fn test_saved_layout_follows_dock_order_not_creation_order() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["gamma", "alpha"]).await;
    let gamma = ws
        .workspace
        .state()
        .terminal_for(&session_id("gamma"))
        .map(termdock_core::TerminalPanel::id)
        .expect("gamma panel");
    ws.workspace.dock_mut().move_panel(gamma, usize::MAX).unwrap();

    let path = ws.layout_path("dragged");
    let snapshot = ws.workspace.snapshot(&path);
    let kinds: Vec<_> = snapshot
        .panels
        .iter()
        .filter_map(|p| p.kind())
        .collect();
    assert_eq!(kinds[2..], [terminal("alpha"), terminal("gamma")]);

    ws.workspace.save_layout_as(&path).expect("save layout");
    ws.reset().await;
    ws.workspace
        .switch_layout(LayoutTarget::Named("dragged".to_string()))
        .await
        .expect("restore layout");
    assert_eq!(ws.dock_kinds()[2..], [terminal("alpha"), terminal("gamma")]);
}

#[tokio::test]
async fn test_restore_skips_sessions_closed_before_save() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha", "beta"]).await;
    ws.platform.exit_session(&session_id("beta"));

    let path = ws.layout_path("partial");
    ws.workspace.save_layout_as(&path).expect("save layout");
    ws.reset().await;
    let report = ws
        .workspace
        .switch_layout(LayoutTarget::File(path))
        .await
        .expect("restore layout");

    assert!(report.warnings.is_empty());
    assert_eq!(ws.workspace.state().live_session_ids(), vec![session_id("alpha")]);
}

#[tokio::test]
async fn test_switch_to_active_layout_rebuilds_every_panel() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha", "beta"]).await;
    let path = ws.layout_path("same");
    ws.workspace.save_layout_as(&path).expect("save layout");

    let before: HashSet<PanelId> = ws
        .workspace
        .state()
        .terminals()
        .map(termdock_core::TerminalPanel::id)
        .collect();
    let panel_count = ws.workspace.dock().panels().len();

    let report = ws
        .workspace
        .switch_layout(LayoutTarget::Named("same".to_string()))
        .await
        .expect("switch to same layout");

    assert_eq!(report.torn_down, panel_count);
    assert_eq!(report.rebuilt, panel_count);
    let after: HashSet<PanelId> = ws
        .workspace
        .state()
        .terminals()
        .map(termdock_core::TerminalPanel::id)
        .collect();
    assert_eq!(after.len(), 2);
    assert!(before.is_disjoint(&after));
    assert_eq!(ws.platform.launch_count_for(&session_id("alpha")), 2);
    assert_eq!(ws.platform.live_process_count(), 2);
}

#[tokio::test]
async fn test_missing_session_yields_one_warning() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha", "beta", "gamma"]).await;
    let path = ws.layout_path("three");
    ws.workspace.save_layout_as(&path).expect("save layout");

    ws.workspace.registry_mut().remove(&session_id("beta"));
    let report = ws
        .workspace
        .switch_layout(LayoutTarget::Named("three".to_string()))
        .await
        .expect("restore layout");

    assert_eq!(
        report.warnings,
        vec![LayoutResolutionWarning::MissingSession(session_id("beta"))]
    );
    assert_eq!(
        ws.dock_kinds(),
        vec![
            PanelKind::SessionTree,
            PanelKind::LayoutList,
            terminal("alpha"),
            terminal("gamma"),
        ]
    );
}

#[tokio::test]
async fn test_unknown_layout_name_falls_back_to_default() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha"]).await;

    let report = ws
        .workspace
        .switch_layout(LayoutTarget::Named("nowhere".to_string()))
        .await
        .expect("fallback switch");

    assert!(report.layout.is_none());
    assert_eq!(ws.workspace.state().terminal_count(), 0);
    assert!(ws.status.messages().iter().any(|m| m.contains("nowhere")));
}

#[tokio::test]
async fn test_unreadable_layout_leaves_workspace_untouched() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha"]).await;

    let path = ws.layout_path("broken");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(&path, "<layout><panel").expect("write broken layout");

    let result = ws.workspace.switch_layout(LayoutTarget::File(path)).await;
    assert!(matches!(
        result,
        Err(termdock_core::TermDockError::Layout(LayoutError::Parse { .. }))
    ));
    assert_eq!(ws.workspace.state().live_session_ids(), vec![session_id("alpha")]);
    assert_eq!(ws.workspace.transition_state(), TransitionState::Idle);
}

#[tokio::test]
async fn test_save_layout_requires_a_path_for_default() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    assert!(matches!(
        ws.workspace.save_layout(),
        Err(LayoutError::Unsaved)
    ));

    let path = ws.layout_path("named");
    ws.workspace.save_layout_as(&path).expect("save as");
    ws.status.clear();
    let saved = ws.workspace.save_layout().expect("save to current path");
    assert_eq!(saved, path);
    assert_eq!(
        ws.status.messages(),
        vec![format!("Saving layout: {}", path.display())]
    );
}

#[tokio::test]
async fn test_save_as_bare_name_goes_to_layouts_dir() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let path = ws
        .workspace
        .save_layout_as(std::path::Path::new("evening"))
        .expect("save as");
    assert_eq!(path, ws.layout_path("evening"));
    assert!(ws.status.events().contains(&StatusEvent::LayoutChanged {
        name: Some("evening".to_string())
    }));
}

#[tokio::test]
async fn test_tool_panels_survive_transitions() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let tree = ws
        .workspace
        .state()
        .panel_of_kind(&PanelKind::SessionTree)
        .map(termdock_core::Panel::id)
        .expect("session tree");
    let log_viewer = ws.workspace.show_log_viewer().expect("log viewer");

    ws.reset().await;
    let tree_after = ws
        .workspace
        .state()
        .panel_of_kind(&PanelKind::SessionTree)
        .map(termdock_core::Panel::id);
    assert_eq!(tree_after, Some(tree));
    assert!(ws.workspace.state().panel(log_viewer).is_none());
}
