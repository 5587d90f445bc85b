//! Requests arriving while a layout transition runs

use termdock_core::models::LayoutTarget;
use termdock_core::DockHost;
use termdock_core::workspace::WorkspaceRequest;

use super::{TestWorkspace, session_id};

#[tokio::test]
async fn test_requests_during_transition_wait_for_idle() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha"]).await;
    let handle = ws.workspace.handle();

    // Queued before the switch starts, absorbed between its steps
    assert!(handle.open_session(session_id("gamma")));
    assert!(handle.switch_layout(LayoutTarget::Named("other".to_string())));
    assert!(handle.broadcast("date"));

    ws.reset().await;
    assert_eq!(ws.workspace.deferred_len(), 2);
    assert_eq!(ws.workspace.state().terminal_count(), 0);
    assert!(
        ws.status
            .messages()
            .iter()
            .any(|m| m.contains("'other' rejected"))
    );

    assert!(ws.workspace.process_deferred().await);
    assert_eq!(ws.workspace.deferred_len(), 0);
    assert_eq!(ws.workspace.state().live_session_ids(), vec![session_id("gamma")]);
    assert_eq!(ws.platform.text_sent_to(&session_id("gamma")), "date\n");
}

#[tokio::test]
async fn test_run_loop_serves_requests_until_shutdown() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    let handle = ws.workspace.handle();

    assert!(handle.open_session(session_id("alpha")));
    assert!(handle.open_session(session_id("beta")));
    assert!(handle.broadcast("hostname"));
    assert!(handle.submit(WorkspaceRequest::Shutdown));

    ws.workspace.run().await;

    assert_eq!(ws.platform.text_sent_to(&session_id("alpha")), "hostname\n");
    assert_eq!(ws.platform.text_sent_to(&session_id("beta")), "hostname\n");
    assert_eq!(ws.platform.live_process_count(), 0);
    assert!(!ws.workspace.is_open());
}

#[tokio::test]
async fn test_shutdown_deferred_behind_transition_still_stops() {
    let mut ws = TestWorkspace::new();
    let handle = ws.workspace.handle();
    assert!(handle.shutdown());

    ws.reset().await;
    assert_eq!(ws.workspace.deferred_len(), 1);
    ws.workspace.run().await;
    assert_eq!(ws.workspace.deferred_len(), 0);
    assert!(ws.workspace.dock().panels().is_empty());
}

#[tokio::test]
async fn test_describe_reports_panels_in_dock_order() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["beta", "alpha"]).await;
    let handle = ws.workspace.handle();

    let (_, summary) = tokio::join!(ws.workspace.run(), async {
        let summary = handle.describe().await;
        handle.shutdown();
        summary
    });

    let summary = summary.expect("workspace answered");
    assert!(summary.layout.is_none());
    let titles: Vec<&str> = summary.panels.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Sessions", "Layouts", "beta", "alpha"]);
    assert!(summary.panels[3].active);
    assert!(summary.panels.iter().all(|p| p.alive));
}
