//! Shared fixtures for workspace integration tests

mod broadcast_tests;
mod config_tests;
mod layout_roundtrip_tests;
mod request_queue_tests;
mod session_lifecycle_tests;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use tempfile::TempDir;
use termdock_core::bridge::WindowWaitConfig;
use termdock_core::models::{PanelKind, Protocol, SessionDescriptor, SessionId};
use termdock_core::platform::FakePlatform;
use termdock_core::registry::{SessionRegistry, TREE_NAMESPACE};
use termdock_core::workspace::{Orchestrator, StatusLog};
use termdock_core::{DockHost, LayoutTarget, Panel, VirtualDock};

/// Labels registered by [`TestWorkspace::new`]
pub const TEST_SESSIONS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

/// Orchestrator on a fake platform with a scratch config directory
pub struct TestWorkspace {
    pub dir: TempDir,
    pub platform: FakePlatform,
    pub status: StatusLog,
    pub workspace: Orchestrator<VirtualDock>,
}

impl TestWorkspace {
    /// Workspace with the four test sessions and a working executable
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Workspace whose terminal executable does not exist
    pub fn without_executable() -> Self {
        Self::build(false)
    }

    fn build(with_executable: bool) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let exe = dir.path().join("putty");
        if with_executable {
            std::fs::write(&exe, b"").expect("write fake executable");
        }

        let platform = FakePlatform::new();
        let status = StatusLog::new();
        let mut workspace = Orchestrator::new(
            VirtualDock::new(),
            Box::new(platform.clone()),
            Rc::new(platform.clone()),
            exe,
            dir.path().join("layouts"),
        )
        .with_registry(create_test_registry())
        .with_window_wait(fast_window_wait())
        .with_observer(status.clone());
        workspace.open().expect("open workspace");

        Self {
            dir,
            platform,
            status,
            workspace,
        }
    }

    /// Path for a layout file in the scratch directory
    pub fn layout_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("layouts").join(format!("{name}.xml"))
    }

    /// Switches to the default arrangement, panicking on failure
    pub async fn reset(&mut self) {
        self.workspace
            .switch_layout(LayoutTarget::Default)
            .await
            .expect("reset to default layout");
    }

    /// Opens the given test sessions in order
    pub async fn open_all(&mut self, labels: &[&str]) {
        for label in labels {
            self.workspace
                .open_session(&session_id(label))
                .await
                .expect("open session");
        }
    }

    /// Panel kinds in dock order
    pub fn dock_kinds(&self) -> Vec<PanelKind> {
        self.workspace
            .dock()
            .panels()
            .iter()
            .filter_map(|docked| self.workspace.state().panel(docked.id))
            .map(Panel::kind)
            .collect()
    }
}

/// Tree-namespace id of a test session
pub fn session_id(label: &str) -> SessionId {
    SessionId::combine(TREE_NAMESPACE, label)
}

/// Registry holding [`TEST_SESSIONS`]
pub fn create_test_registry() -> SessionRegistry {
    let mut registry = SessionRegistry::new();
    for label in TEST_SESSIONS {
        let descriptor = SessionDescriptor::new(label, format!("{label}.example.com"), Protocol::Ssh);
        registry
            .register(TREE_NAMESPACE, label, descriptor)
            .expect("register test session");
    }
    registry
}

/// Window wait that gives up quickly
pub fn fast_window_wait() -> WindowWaitConfig {
    WindowWaitConfig::default()
        .with_attempts(5)
        .with_interval(Duration::from_millis(1))
        .with_close_grace_attempts(2)
}
