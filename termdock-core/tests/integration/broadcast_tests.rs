//! Command broadcast across docked terminals

use super::{TestWorkspace, session_id};

#[tokio::test]
async fn test_broadcast_without_terminals_sends_nothing() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;

    assert_eq!(ws.workspace.broadcast("ls"), 0);
    assert!(ws.platform.inputs().is_empty());
    assert_eq!(
        ws.status.last_message().as_deref(),
        Some("Sent command to 0 session(s)")
    );
}

#[tokio::test]
async fn test_broadcast_reaches_only_live_terminals() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha", "beta", "gamma", "delta"]).await;
    assert!(ws.platform.exit_session(&session_id("delta")));

    assert_eq!(ws.workspace.broadcast("ls"), 3);
    for label in ["alpha", "beta", "gamma"] {
        assert_eq!(ws.platform.text_sent_to(&session_id(label)), "ls\n");
    }
    assert_eq!(ws.platform.text_sent_to(&session_id("delta")), "");
    assert_eq!(ws.workspace.state().terminal_count(), 3);
}

fn panel_of(ws: &TestWorkspace, label: &str) -> termdock_core::PanelId {
    ws.workspace
        .state()
        .terminal_for(&session_id(label))
        .map(termdock_core::TerminalPanel::id)
        .expect("terminal panel")
}

fn broadcast_order(ws: &TestWorkspace) -> Vec<termdock_core::models::SessionId> {
    ws.platform
        .inputs()
        .into_iter()
        .map(|input| input.session_id)
        .fold(Vec::new(), |mut seen, id| {
            if seen.last() != Some(&id) {
                seen.push(id);
            }
            seen
        })
}

#[tokio::test]
async fn test_broadcast_follows_dock_order_not_creation_order() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha", "beta", "gamma"]).await;

    // Drag alpha's tab to the end and gamma's in front of beta
    let alpha = panel_of(&ws, "alpha");
    let gamma = panel_of(&ws, "gamma");
    ws.workspace.dock_mut().move_panel(alpha, usize::MAX).unwrap();
    ws.workspace.dock_mut().move_panel(gamma, 2).unwrap();
    ws.workspace.activate_panel(alpha);

    assert_eq!(ws.workspace.broadcast("uptime"), 3);
    assert_eq!(
        broadcast_order(&ws),
        vec![session_id("gamma"), session_id("beta"), session_id("alpha")]
    );
}

#[tokio::test]
async fn test_broadcast_empty_text_is_a_no_op() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha"]).await;
    ws.status.clear();

    assert_eq!(ws.workspace.broadcast(""), 0);
    assert!(ws.platform.inputs().is_empty());
    assert!(ws.status.messages().is_empty());
}

#[tokio::test]
async fn test_broadcast_failure_does_not_stop_other_terminals() {
    let mut ws = TestWorkspace::new();
    ws.reset().await;
    ws.open_all(&["alpha", "beta"]).await;
    ws.platform.fail_input_for(&session_id("alpha"));

    assert_eq!(ws.workspace.broadcast("whoami"), 1);
    assert_eq!(ws.platform.text_sent_to(&session_id("beta")), "whoami\n");
    assert!(
        ws.status
            .messages()
            .iter()
            .any(|m| m.starts_with("Failed to send command to"))
    );
}
