//! In-memory dock host
//!
//! Tracks attached panels, their order and the active panel without any
//! toolkit behind it. Used by the console front end and by tests.

use crate::error::{DockError, DockResult};
use crate::models::{DockArea, DockPlacement, PanelKind};
use crate::platform::{HostSurface, SurfaceSize};

use super::{DockHost, DockedPanel, PanelId};

/// Size handed to document panels
const DOCUMENT_SIZE: SurfaceSize = SurfaceSize::new(1024, 768);
/// Size handed to edge panels
const EDGE_SIZE: SurfaceSize = SurfaceSize::new(280, 768);
/// First synthetic surface id
const FIRST_SURFACE_ID: u64 = 0x0a00_0000;

/// One attached panel
#[derive(Debug, Clone, PartialEq)]
pub struct DockEntry {
    /// Panel id
    pub id: PanelId,
    /// What the panel shows
    pub kind: PanelKind,
    /// Tab title
    pub title: String,
    /// Placement
    pub placement: DockPlacement,
    /// Surface handed out on attach
    pub surface: HostSurface,
}

/// Dock host without a toolkit
#[derive(Debug, Clone)]
pub struct VirtualDock {
    entries: Vec<DockEntry>,
    active: Option<PanelId>,
    window_title: String,
    next_surface: u64,
    headless: bool,
}

impl Default for VirtualDock {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDock {
    /// Dock that hands out synthetic container ids
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            active: None,
            window_title: String::new(),
            next_surface: FIRST_SURFACE_ID,
            headless: false,
        }
    }

    /// Dock whose surfaces have no native container, so terminal windows
    /// stay top-level
    #[must_use]
    pub fn headless() -> Self {
        Self {
            headless: true,
            ..Self::new()
        }
    }

    /// Attached panels in dock order
    #[must_use]
    pub fn entries(&self) -> &[DockEntry] {
        &self.entries
    }

    /// Looks up an attached panel
    #[must_use]
    pub fn entry(&self, panel: PanelId) -> Option<&DockEntry> {
        self.entries.iter().find(|e| e.id == panel)
    }

    /// Main window title
    #[must_use]
    pub fn window_title(&self) -> &str {
        &self.window_title
    }

    /// Changes a panel's surface size, as a user drag would
    ///
    /// # Errors
    ///
    /// Returns `DockError::NotDocked` if the id is not attached.
    pub fn resize(&mut self, panel: PanelId, size: SurfaceSize) -> DockResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == panel)
            .ok_or_else(|| DockError::NotDocked(panel.to_string()))?;
        entry.surface.size = size;
        Ok(())
    }

    /// Moves a panel to `index` in dock order, as dragging its tab would
    ///
    /// An index past the end moves the panel to the end.
    ///
    /// # Errors
    ///
    /// Returns `DockError::NotDocked` if the id is not attached.
    pub fn move_panel(&mut self, panel: PanelId, index: usize) -> DockResult<()> {
        let from = self
            .entries
            .iter()
            .position(|e| e.id == panel)
            .ok_or_else(|| DockError::NotDocked(panel.to_string()))?;
        let entry = self.entries.remove(from);
        let to = index.min(self.entries.len());
        self.entries.insert(to, entry);
        tracing::trace!(panel_id = %panel, from, to, "Panel moved");
        Ok(())
    }

    fn size_for(&self, placement: &DockPlacement) -> SurfaceSize {
        match (placement.area, placement.split_ratio) {
            (DockArea::Document, _) => DOCUMENT_SIZE,
            (_, Some(ratio)) => SurfaceSize::new(
                EDGE_SIZE.width,
                (f64::from(EDGE_SIZE.height) * ratio).round() as u32,
            ),
            (_, None) => EDGE_SIZE,
        }
    }
}

impl DockHost for VirtualDock {
    fn attach(
        &mut self,
        panel: PanelId,
        kind: &PanelKind,
        title: &str,
        placement: DockPlacement,
    ) -> DockResult<HostSurface> {
        if self.entry(panel).is_some() {
            return Err(DockError::AlreadyDocked(panel.to_string()));
        }
        if placement.split_ratio.is_some()
            && !self
                .entries
                .iter()
                .any(|e| e.placement.area == placement.area)
        {
            return Err(DockError::InvalidPlacement(format!(
                "nothing docked in {:?} to split",
                placement.area
            )));
        }

        let id = if self.headless {
            0
        } else {
            let id = self.next_surface;
            self.next_surface += 1;
            id
        };
        let surface = HostSurface {
            id,
            size: self.size_for(&placement),
        };
        self.entries.push(DockEntry {
            id: panel,
            kind: kind.clone(),
            title: title.to_string(),
            placement,
            surface,
        });
        tracing::trace!(panel_id = %panel, kind = %kind, "Panel attached");
        Ok(surface)
    }

    fn detach(&mut self, panel: PanelId) -> DockResult<()> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == panel)
            .ok_or_else(|| DockError::NotDocked(panel.to_string()))?;
        self.entries.remove(index);
        if self.active == Some(panel) {
            self.active = None;
        }
        Ok(())
    }

    fn activate(&mut self, panel: PanelId) -> DockResult<()> {
        if self.entry(panel).is_none() {
            return Err(DockError::NotDocked(panel.to_string()));
        }
        self.active = Some(panel);
        Ok(())
    }

    fn active(&self) -> Option<PanelId> {
        self.active
    }

    fn panels(&self) -> Vec<DockedPanel> {
        self.entries
            .iter()
            .map(|e| DockedPanel {
                id: e.id,
                placement: e.placement,
            })
            .collect()
    }

    fn surface_size(&self, panel: PanelId) -> Option<SurfaceSize> {
        self.entry(panel).map(|e| e.surface.size)
    }

    fn set_window_title(&mut self, title: &str) {
        self.window_title = title.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_detach_keeps_order() {
        let mut dock = VirtualDock::new();
        let a = PanelId::new();
        let b = PanelId::new();
        dock.attach(a, &PanelKind::SessionTree, "Sessions", DockPlacement::edge(DockArea::Right))
            .unwrap();
        dock.attach(b, &PanelKind::LogViewer, "Log", DockPlacement::document())
            .unwrap();
        assert_eq!(
            dock.panels().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![a, b]
        );

        dock.activate(b).unwrap();
        dock.detach(b).unwrap();
        assert_eq!(dock.active(), None);
        assert!(matches!(dock.detach(b), Err(DockError::NotDocked(_))));
    }

    #[test]
    fn duplicate_attach_rejected() {
        let mut dock = VirtualDock::new();
        let a = PanelId::new();
        dock.attach(a, &PanelKind::LogViewer, "Log", DockPlacement::document())
            .unwrap();
        assert!(matches!(
            dock.attach(a, &PanelKind::LogViewer, "Log", DockPlacement::document()),
            Err(DockError::AlreadyDocked(_))
        ));
    }

    #[test]
    fn split_needs_existing_panel_in_area() {
        let mut dock = VirtualDock::new();
        let result = dock.attach(
            PanelId::new(),
            &PanelKind::LayoutList,
            "Layouts",
            DockPlacement::below(DockArea::Left, 0.5),
        );
        assert!(matches!(result, Err(DockError::InvalidPlacement(_))));
    }

    #[test]
    fn headless_surfaces_have_no_container() {
        let mut dock = VirtualDock::headless();
        let surface = dock
            .attach(PanelId::new(), &PanelKind::LogViewer, "Log", DockPlacement::document())
            .unwrap();
        assert_eq!(surface.id, 0);
        assert_eq!(surface.size, DOCUMENT_SIZE);
    }

    #[test]
    fn move_panel_reorders_dock() {
        let mut dock = VirtualDock::new();
        let ids: Vec<PanelId> = (0..3).map(|_| PanelId::new()).collect();
        for id in &ids {
            dock.attach(*id, &PanelKind::LogViewer, "Log", DockPlacement::document())
                .unwrap();
        }

        dock.move_panel(ids[0], 99).unwrap();
        dock.move_panel(ids[2], 0).unwrap();
        assert_eq!(
            dock.panels().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![ids[2], ids[1], ids[0]]
        );
        assert!(matches!(
            dock.move_panel(PanelId::new(), 0),
            Err(DockError::NotDocked(_))
        ));
    }

    #[test]
    fn resize_updates_surface() {
        let mut dock = VirtualDock::new();
        let a = PanelId::new();
        dock.attach(a, &PanelKind::LogViewer, "Log", DockPlacement::document())
            .unwrap();
        dock.resize(a, SurfaceSize::new(10, 20)).unwrap();
        assert_eq!(dock.surface_size(a), Some(SurfaceSize::new(10, 20)));
    }
}
