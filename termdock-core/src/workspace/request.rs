//! Requests submitted to a running workspace from other tasks

use std::path::PathBuf;

use secrecy::SecretString;
use tokio::sync::{mpsc, oneshot};

use super::state::WorkspaceSummary;
use crate::dock::PanelId;
use crate::models::{Credentials, LayoutTarget, Protocol, SessionDescriptor, SessionId};

/// Parameters of a quick-connect bar entry
#[derive(Debug, Default)]
pub struct QuickConnect {
    /// Host, serial line or shell command
    pub host: String,
    /// Protocol
    pub protocol: Protocol,
    /// Port; the protocol default when unset
    pub port: Option<u32>,
    /// Login name
    pub username: Option<String>,
    /// Password, passed to the terminal for SSH
    pub password: Option<SecretString>,
    /// Saved terminal configuration to load
    pub saved_config: Option<String>,
}

impl QuickConnect {
    /// Quick connect to a host with protocol defaults
    #[must_use]
    pub fn new(host: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            host: host.into(),
            protocol,
            ..Self::default()
        }
    }

    /// Sets the login name
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the port
    #[must_use]
    pub const fn with_port(mut self, port: u32) -> Self {
        self.port = Some(port);
        self
    }

    /// Builds the session descriptor; the host is also the display name
    #[must_use]
    pub fn into_descriptor(self) -> SessionDescriptor {
        let host = self.host.trim().to_string();
        let mut descriptor = SessionDescriptor::new(host.clone(), host, self.protocol);
        if let Some(port) = self.port {
            descriptor = descriptor.with_port(port);
        }
        descriptor.credentials = Credentials {
            username: self.username.filter(|u| !u.is_empty()),
            password: self.password,
        };
        descriptor.saved_config = self.saved_config;
        descriptor
    }
}

/// What a caller can ask the workspace to do
#[derive(Debug)]
pub enum WorkspaceRequest {
    /// Open a registered session
    OpenSession(SessionId),
    /// Register and open an ad-hoc session
    QuickConnect(QuickConnect),
    /// Switch layout
    SwitchLayout(LayoutTarget),
    /// Save the current layout to its file
    SaveLayout,
    /// Save the current layout to a new file
    SaveLayoutAs(PathBuf),
    /// Type a line into every terminal
    Broadcast(String),
    /// Make a panel active
    ActivatePanel(PanelId),
    /// Close a panel
    ClosePanel(PanelId),
    /// Show (creating if needed) the log viewer
    ShowLogViewer,
    /// Report the current layout and panels
    Describe(oneshot::Sender<WorkspaceSummary>),
    /// Close the workspace and stop the run loop
    Shutdown,
}

impl WorkspaceRequest {
    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenSession(_) => "open-session",
            Self::QuickConnect(_) => "quick-connect",
            Self::SwitchLayout(_) => "switch-layout",
            Self::SaveLayout => "save-layout",
            Self::SaveLayoutAs(_) => "save-layout-as",
            Self::Broadcast(_) => "broadcast",
            Self::ActivatePanel(_) => "activate-panel",
            Self::ClosePanel(_) => "close-panel",
            Self::ShowLogViewer => "show-log-viewer",
            Self::Describe(_) => "describe",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Clonable sender for [`WorkspaceRequest`]s
///
/// Requests are handled in order on the workspace's thread. While a layout
/// transition runs, further layout switches are rejected and every other
/// request waits until the transition is over.
#[derive(Debug, Clone)]
pub struct WorkspaceHandle {
    tx: mpsc::UnboundedSender<WorkspaceRequest>,
}

impl WorkspaceHandle {
    pub(crate) const fn new(tx: mpsc::UnboundedSender<WorkspaceRequest>) -> Self {
        Self { tx }
    }

    /// Queues a request; returns `false` once the workspace is gone
    pub fn submit(&self, request: WorkspaceRequest) -> bool {
        self.tx.send(request).is_ok()
    }

    /// Queues an open-session request
    pub fn open_session(&self, session_id: SessionId) -> bool {
        self.submit(WorkspaceRequest::OpenSession(session_id))
    }

    /// Queues a layout switch
    pub fn switch_layout(&self, target: LayoutTarget) -> bool {
        self.submit(WorkspaceRequest::SwitchLayout(target))
    }

    /// Queues a broadcast
    pub fn broadcast(&self, text: impl Into<String>) -> bool {
        self.submit(WorkspaceRequest::Broadcast(text.into()))
    }

    /// Asks for the current layout and panels
    ///
    /// Returns `None` if the workspace stopped before answering.
    pub async fn describe(&self) -> Option<WorkspaceSummary> {
        let (tx, rx) = oneshot::channel();
        if !self.submit(WorkspaceRequest::Describe(tx)) {
            return None;
        }
        rx.await.ok()
    }

    /// Asks the workspace to shut down
    pub fn shutdown(&self) -> bool {
        self.submit(WorkspaceRequest::Shutdown)
    }

    /// Whether the workspace has stopped
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
