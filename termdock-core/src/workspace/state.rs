//! Workspace state owned by the orchestrator

use crate::dock::{Panel, PanelId, TerminalPanel};
use crate::models::{LayoutDescriptor, PanelKind, SessionId};

/// Summary of one docked panel, for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelInfo {
    /// Panel id
    pub id: PanelId,
    /// Panel kind
    pub kind: PanelKind,
    /// Tab title
    pub title: String,
    /// Whether this is the active panel
    pub active: bool,
    /// For terminals, whether the process is running
    pub alive: bool,
}

/// Point-in-time view of the workspace for listings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspaceSummary {
    /// Current layout name; `None` is the unsaved default
    pub layout: Option<String>,
    /// Panels in dock order
    pub panels: Vec<PanelInfo>,
}

/// Current layout, live panels and focus
///
/// Only the orchestrator mutates it. Panels are kept in dock order.
#[derive(Debug, Default)]
pub struct WorkspaceState {
    pub(super) active_layout: Option<LayoutDescriptor>,
    pub(super) panels: Vec<Panel>,
    pub(super) focused: Option<PanelId>,
}

impl WorkspaceState {
    /// Current layout; `None` is the unsaved default
    #[must_use]
    pub const fn active_layout(&self) -> Option<&LayoutDescriptor> {
        self.active_layout.as_ref()
    }

    /// Focused panel
    #[must_use]
    pub const fn focused(&self) -> Option<PanelId> {
        self.focused
    }

    /// All panels, in dock order
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Looks up a panel
    #[must_use]
    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id() == id)
    }

    /// Terminal panels, in dock order
    pub fn terminals(&self) -> impl Iterator<Item = &TerminalPanel> {
        self.panels.iter().filter_map(Panel::as_terminal)
    }

    /// Terminal panel showing a session
    #[must_use]
    pub fn terminal_for(&self, session_id: &SessionId) -> Option<&TerminalPanel> {
        self.terminals().find(|t| t.session_id() == session_id)
    }

    /// Sessions with a live panel, in dock order
    #[must_use]
    pub fn live_session_ids(&self) -> Vec<SessionId> {
        self.terminals()
            .filter(|t| t.is_alive())
            .map(|t| t.session_id().clone())
            .collect()
    }

    /// Number of terminal panels
    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.terminals().count()
    }

    /// Panel with a given kind (tool panels are unique)
    #[must_use]
    pub fn panel_of_kind(&self, kind: &PanelKind) -> Option<&Panel> {
        self.panels.iter().find(|p| &p.kind() == kind)
    }

    /// Listing of every panel
    #[must_use]
    pub fn describe(&self) -> Vec<PanelInfo> {
        self.panels
            .iter()
            .map(|p| PanelInfo {
                id: p.id(),
                kind: p.kind(),
                title: p.title(),
                active: self.focused == Some(p.id()),
                alive: p.as_terminal().is_none_or(TerminalPanel::is_alive),
            })
            .collect()
    }

    /// Summary of the current layout and panels
    #[must_use]
    pub fn summary(&self) -> WorkspaceSummary {
        WorkspaceSummary {
            layout: self.active_layout.as_ref().map(|l| l.name.clone()),
            panels: self.describe(),
        }
    }

    pub(super) fn position(&self, id: PanelId) -> Option<usize> {
        self.panels.iter().position(|p| p.id() == id)
    }

    pub(super) fn remove(&mut self, id: PanelId) -> Option<Panel> {
        let index = self.position(id)?;
        if self.focused == Some(id) {
            self.focused = None;
        }
        Some(self.panels.remove(index))
    }

    /// Reorders panels to match the dock
    pub(super) fn sort_by_dock_order(&mut self, order: &[PanelId]) {
        self.panels.sort_by_key(|p| {
            order
                .iter()
                .position(|id| *id == p.id())
                .unwrap_or(usize::MAX)
        });
    }
}
