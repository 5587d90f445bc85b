//! Docked panels and their lifecycle callbacks

use crate::bridge::{EmbeddedSession, ProcessBridge};
use crate::error::PlatformResult;
use crate::models::{PanelKind, SessionId};
use crate::platform::{InputEvent, LaunchId, SurfaceSize};

use super::PanelId;

/// A dock panel hosting one embedded terminal
///
/// The dock's lifecycle events are forwarded to the bridge: activation
/// focuses the window, resizing follows the surface, closing ends the
/// process.
#[derive(Debug)]
pub struct TerminalPanel {
    id: PanelId,
    session: EmbeddedSession,
}

impl TerminalPanel {
    /// Wraps a launched session
    #[must_use]
    pub const fn new(id: PanelId, session: EmbeddedSession) -> Self {
        Self { id, session }
    }

    /// Panel id
    #[must_use]
    pub const fn id(&self) -> PanelId {
        self.id
    }

    /// Session shown in the panel
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.session.session_id()
    }

    /// Launch backing the panel
    #[must_use]
    pub const fn launch_id(&self) -> LaunchId {
        self.session.launch_id()
    }

    /// Tab title
    #[must_use]
    pub fn title(&self) -> &str {
        self.session.descriptor().title()
    }

    /// Panel kind, for layout persistence
    #[must_use]
    pub fn kind(&self) -> PanelKind {
        PanelKind::Terminal {
            session_id: self.session_id().clone(),
        }
    }

    /// Whether the terminal process is still running
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.session.is_alive()
    }

    /// Dock activated the panel: give the terminal keyboard focus
    pub fn on_activated(&mut self, bridge: &ProcessBridge) -> bool {
        bridge.focus(&mut self.session)
    }

    /// Dock resized the panel
    pub fn on_resized(&mut self, bridge: &ProcessBridge, size: SurfaceSize) {
        bridge.resize(&mut self.session, size);
    }

    /// Dock closed the panel: end the terminal
    pub async fn on_close(self, bridge: &ProcessBridge) {
        tracing::debug!(panel_id = %self.id, session_id = %self.session_id(), "Closing terminal panel");
        bridge.close(self.session).await;
    }

    /// Sends input to the terminal
    ///
    /// Returns `Ok(false)` if the process is gone.
    ///
    /// # Errors
    ///
    /// Returns the platform error if delivery failed.
    pub fn send_input(
        &mut self,
        bridge: &ProcessBridge,
        events: &[InputEvent],
    ) -> PlatformResult<bool> {
        bridge.send_input(&mut self.session, events)
    }
}

/// A fixed or on-demand tool panel (session tree, layout list, log viewer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPanel {
    id: PanelId,
    kind: PanelKind,
}

impl ToolPanel {
    /// Creates a tool panel with a fresh id
    #[must_use]
    pub fn new(kind: PanelKind) -> Self {
        Self {
            id: PanelId::new(),
            kind,
        }
    }

    /// Panel id
    #[must_use]
    pub const fn id(&self) -> PanelId {
        self.id
    }

    /// Panel kind
    #[must_use]
    pub const fn kind(&self) -> &PanelKind {
        &self.kind
    }
}

/// Any panel the workspace owns
#[derive(Debug)]
pub enum Panel {
    /// Tool panel
    Tool(ToolPanel),
    /// Embedded terminal
    Terminal(TerminalPanel),
}

impl Panel {
    /// Panel id
    #[must_use]
    pub const fn id(&self) -> PanelId {
        match self {
            Self::Tool(tool) => tool.id(),
            Self::Terminal(terminal) => terminal.id(),
        }
    }

    /// Panel kind
    #[must_use]
    pub fn kind(&self) -> PanelKind {
        match self {
            Self::Tool(tool) => tool.kind().clone(),
            Self::Terminal(terminal) => terminal.kind(),
        }
    }

    /// Title shown on the panel's tab
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Tool(tool) => tool.kind().to_string(),
            Self::Terminal(terminal) => terminal.title().to_string(),
        }
    }

    /// Whether the panel is destroyed on teardown
    #[must_use]
    pub fn is_closable(&self) -> bool {
        match self {
            Self::Tool(tool) => tool.kind().is_closable(),
            Self::Terminal(_) => true,
        }
    }

    /// The terminal, for terminal panels
    #[must_use]
    pub const fn as_terminal(&self) -> Option<&TerminalPanel> {
        match self {
            Self::Terminal(terminal) => Some(terminal),
            Self::Tool(_) => None,
        }
    }

    /// The terminal, mutably
    pub fn as_terminal_mut(&mut self) -> Option<&mut TerminalPanel> {
        match self {
            Self::Terminal(terminal) => Some(terminal),
            Self::Tool(_) => None,
        }
    }
}
