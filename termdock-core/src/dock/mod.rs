//! Dock host abstraction
//!
//! The docking framework is an external collaborator: the workspace only
//! attaches, detaches and activates panels by [`PanelId`] and asks for the
//! current arrangement when saving a layout.

mod panel;
mod virtual_dock;

pub use panel::{Panel, TerminalPanel, ToolPanel};
pub use virtual_dock::{DockEntry, VirtualDock};

use std::fmt;

use uuid::Uuid;

use crate::error::DockResult;
use crate::models::{DockArea, DockPlacement, PanelKind};
use crate::platform::{HostSurface, SurfaceSize};

/// Unique identifier for a docked panel
///
/// A new id is minted every time a panel is created, so a terminal
/// restored by a layout switch never reuses the id of the panel it
/// replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(pub Uuid);

impl PanelId {
    /// Creates a new random panel ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for console listings
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for PanelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Panel({})", self.0)
    }
}

/// A panel as the dock reports it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockedPanel {
    /// Panel id
    pub id: PanelId,
    /// Where it is docked
    pub placement: DockPlacement,
}

/// Docking framework seam
pub trait DockHost {
    /// Attaches a panel and returns the surface its content renders into
    ///
    /// # Errors
    ///
    /// Returns `DockError::AlreadyDocked` if the id is attached.
    fn attach(
        &mut self,
        panel: PanelId,
        kind: &PanelKind,
        title: &str,
        placement: DockPlacement,
    ) -> DockResult<HostSurface>;

    /// Detaches a panel; its surface is gone afterwards
    ///
    /// # Errors
    ///
    /// Returns `DockError::NotDocked` if the id is not attached.
    fn detach(&mut self, panel: PanelId) -> DockResult<()>;

    /// Makes a panel the active one
    ///
    /// # Errors
    ///
    /// Returns `DockError::NotDocked` if the id is not attached.
    fn activate(&mut self, panel: PanelId) -> DockResult<()>;

    /// The active panel
    fn active(&self) -> Option<PanelId>;

    /// Docked panels in dock order
    fn panels(&self) -> Vec<DockedPanel>;

    /// Current surface size of a docked panel
    fn surface_size(&self, panel: PanelId) -> Option<SurfaceSize>;

    /// Sets the main window title
    fn set_window_title(&mut self, title: &str);
}

/// Default arrangement: session tree on the right, layout list below it
#[must_use]
pub fn default_tool_placements() -> [(PanelKind, DockPlacement); 2] {
    [
        (PanelKind::SessionTree, DockPlacement::edge(DockArea::Right)),
        (
            PanelKind::LayoutList,
            DockPlacement::below(DockArea::Right, 0.5),
        ),
    ]
}
