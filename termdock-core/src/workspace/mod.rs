//! Workspace orchestrator
//!
//! One [`Orchestrator`] per workspace window. It owns the session registry,
//! the process bridge, the dock host and the [`WorkspaceState`], drives
//! layout transitions and command broadcast, and reports progress to
//! [`StatusObserver`]s. Everything runs on the thread that owns it; process
//! exits and requests from other tasks arrive over channels and are applied
//! here.

mod request;
mod state;
mod status;

pub use request::{QuickConnect, WorkspaceHandle, WorkspaceRequest};
pub use state::{PanelInfo, WorkspaceState, WorkspaceSummary};
pub use status::{StatusEvent, StatusLog, StatusObserver};

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::bridge::{ProcessBridge, WindowWaitConfig};
use crate::broadcast::CommandBroadcaster;
use crate::config::WorkspaceSettings;
use crate::dock::{
    DockHost, Panel, PanelId, TerminalPanel, ToolPanel, default_tool_placements,
};
use crate::error::{
    DockError, LayoutError, LayoutResolutionWarning, LayoutResult, Result, TransitionConflict,
};
use crate::layout::{
    LayoutCatalog, LayoutStore, RestoreStep, TransitionController, TransitionState,
    XmlLayoutStore, resolve_layout,
};
use crate::models::{
    DockArea, DockPlacement, LayoutDescriptor, LayoutTarget, PanelKind, PanelPlacement,
    SessionDescriptor, SessionId,
};
use crate::platform::{ProcessExit, ProcessLauncher, WindowSystem};
use crate::registry::{CONNECT_BAR_NAMESPACE, SessionRegistry};
use crate::tracing::{LogBuffer, LogLine};

/// Default main window title
pub const DEFAULT_WINDOW_TITLE: &str = "termdock";

/// How the workspace comes up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupOptions {
    /// Session to open on an otherwise default layout
    pub starting_session: Option<SessionId>,
    /// Layout to load when no starting session is given
    pub starting_layout: Option<LayoutTarget>,
}

/// Outcome of a layout switch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionReport {
    /// Layout now active; `None` for the default arrangement
    pub layout: Option<String>,
    /// Panels detached during teardown
    pub torn_down: usize,
    /// Panels attached while rebuilding
    pub rebuilt: usize,
    /// Records that were skipped
    pub warnings: Vec<LayoutResolutionWarning>,
}

/// Composes the registry, bridge, dock, layout store and broadcaster
pub struct Orchestrator<D: DockHost> {
    registry: SessionRegistry,
    bridge: ProcessBridge,
    dock: D,
    store: Box<dyn LayoutStore>,
    catalog: LayoutCatalog,
    transitions: TransitionController,
    broadcaster: CommandBroadcaster,
    observers: Vec<Box<dyn StatusObserver>>,
    state: WorkspaceState,
    exits: mpsc::UnboundedReceiver<ProcessExit>,
    request_tx: mpsc::UnboundedSender<WorkspaceRequest>,
    requests: mpsc::UnboundedReceiver<WorkspaceRequest>,
    deferred: VecDeque<WorkspaceRequest>,
    log_buffer: Option<LogBuffer>,
    window_title: String,
    liveness_interval: Duration,
    opened: bool,
}

impl<D: DockHost> std::fmt::Debug for Orchestrator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("bridge", &self.bridge)
            .field("transition", &self.transitions.state())
            .field("state", &self.state)
            .field("deferred", &self.deferred.len())
            .finish_non_exhaustive()
    }
}

impl<D: DockHost> Orchestrator<D> {
    /// Creates a workspace around a dock host and a platform
    ///
    /// Layouts default to XML files in `layouts_dir`.
    #[must_use]
    pub fn new(
        dock: D,
        launcher: Box<dyn ProcessLauncher>,
        windows: Rc<dyn WindowSystem>,
        executable: impl Into<PathBuf>,
        layouts_dir: impl Into<PathBuf>,
    ) -> Self {
        let (exit_tx, exits) = mpsc::unbounded_channel();
        let (request_tx, requests) = mpsc::unbounded_channel();
        Self {
            registry: SessionRegistry::new(),
            bridge: ProcessBridge::new(executable, launcher, windows, exit_tx),
            dock,
            store: Box::new(XmlLayoutStore::new()),
            catalog: LayoutCatalog::new(layouts_dir),
            transitions: TransitionController::new(),
            broadcaster: CommandBroadcaster::new(),
            observers: Vec::new(),
            state: WorkspaceState::default(),
            exits,
            request_tx,
            requests,
            deferred: VecDeque::new(),
            log_buffer: None,
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            liveness_interval: Duration::from_secs(1),
            opened: false,
        }
    }

    /// Uses a pre-filled session registry
    #[must_use]
    pub fn with_registry(mut self, registry: SessionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Uses a different layout store
    #[must_use]
    pub fn with_layout_store(mut self, store: Box<dyn LayoutStore>) -> Self {
        self.store = store;
        self
    }

    /// Sets the window wait budget for launches
    #[must_use]
    pub fn with_window_wait(mut self, wait: WindowWaitConfig) -> Self {
        self.bridge = self.bridge.with_window_wait(wait);
        self
    }

    /// Adds a status observer
    #[must_use]
    pub fn with_observer(mut self, observer: impl StatusObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Log buffer shown by the log viewer panel
    #[must_use]
    pub fn with_log_buffer(mut self, buffer: LogBuffer) -> Self {
        self.log_buffer = Some(buffer);
        self
    }

    /// Main window title prefix
    #[must_use]
    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    /// How often the run loop sweeps dead panels
    #[must_use]
    pub fn with_liveness_interval(mut self, interval: Duration) -> Self {
        self.liveness_interval = interval;
        self
    }

    /// Applies launch policy, window title and liveness interval from settings
    #[must_use]
    pub fn with_settings(self, settings: &WorkspaceSettings) -> Self {
        self.with_window_wait(settings.terminal.window_wait())
            .with_window_title(settings.workspace.window_title.clone())
            .with_liveness_interval(settings.workspace.liveness_interval())
    }

    /// Handle for submitting requests from other tasks
    #[must_use]
    pub fn handle(&self) -> WorkspaceHandle {
        WorkspaceHandle::new(self.request_tx.clone())
    }

    /// Session registry
    #[must_use]
    pub const fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Session registry, for adding sessions
    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    /// Saved layouts
    #[must_use]
    pub const fn catalog(&self) -> &LayoutCatalog {
        &self.catalog
    }

    /// Dock host
    #[must_use]
    pub const fn dock(&self) -> &D {
        &self.dock
    }

    /// Dock host, for driving it like a user would
    pub fn dock_mut(&mut self) -> &mut D {
        &mut self.dock
    }

    /// Workspace state
    #[must_use]
    pub const fn state(&self) -> &WorkspaceState {
        &self.state
    }

    /// Layout transition state
    #[must_use]
    pub const fn transition_state(&self) -> TransitionState {
        self.transitions.state()
    }

    /// Requests waiting for the current transition to finish
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Process bridge
    #[must_use]
    pub const fn bridge(&self) -> &ProcessBridge {
        &self.bridge
    }

    /// Recent log lines for the log viewer
    #[must_use]
    pub fn log_lines(&self, n: usize) -> Vec<LogLine> {
        self.log_buffer
            .as_ref()
            .map(|b| b.tail(n))
            .unwrap_or_default()
    }

    fn notify(&mut self, event: &StatusEvent) {
        for observer in &mut self.observers {
            observer.on_status(event);
        }
    }

    fn status(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!(status = %text, "Status");
        self.notify(&StatusEvent::Message(text));
    }

    fn warn_status(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!(status = %text, "Status warning");
        self.notify(&StatusEvent::Warning(text));
    }

    /// Opens the workspace: scans saved layouts
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Io` if the layouts directory cannot be read.
    pub fn open(&mut self) -> LayoutResult<()> {
        let count = self.catalog.scan()?;
        self.opened = true;
        tracing::info!(
            layouts = count,
            sessions = self.registry.len(),
            dir = %self.catalog.dir().display(),
            "Workspace opened"
        );
        Ok(())
    }

    /// Whether [`Self::open`] ran and [`Self::close`] did not
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.opened
    }

    /// Brings up the first layout
    ///
    /// With a starting session the default arrangement is built and the
    /// session opened in it; otherwise the starting layout (or the default
    /// arrangement) is loaded.
    pub async fn startup(&mut self, options: StartupOptions) {
        if let Some(session_id) = options.starting_session {
            if let Err(e) = self.switch_layout(LayoutTarget::Default).await {
                tracing::warn!(error = %e, "Default layout failed");
            }
            let _ = self.open_session(&session_id).await;
        } else {
            let target = options.starting_layout.unwrap_or(LayoutTarget::Default);
            if let Err(e) = self.switch_layout(target).await {
                tracing::warn!(error = %e, "Starting layout failed, using default");
                let _ = self.switch_layout(LayoutTarget::Default).await;
            }
        }
    }

    /// Closes every panel and ends every terminal
    pub async fn close(&mut self) {
        self.drain_exits();
        let order = self.dock_order();
        self.state.sort_by_dock_order(&order);

        let panels = std::mem::take(&mut self.state.panels);
        let count = panels.len();
        for panel in panels {
            self.detach_best_effort(panel.id());
            if let Panel::Terminal(terminal) = panel {
                terminal.on_close(&self.bridge).await;
            }
        }
        self.state.focused = None;
        self.state.active_layout = None;
        self.opened = false;
        tracing::info!(panels = count, "Workspace closed");
        self.status("Workspace closed");
    }

    /// Ids of docked panels in dock order
    fn dock_order(&self) -> Vec<PanelId> {
        self.dock.panels().iter().map(|p| p.id).collect()
    }

    fn detach_best_effort(&mut self, panel: PanelId) {
        if let Err(e) = self.dock.detach(panel) {
            tracing::error!(panel_id = %panel, error = %e, "Failed to detach panel");
        }
    }

    /// Attaches a panel, falling back to a plain edge placement when a
    /// split has nothing to split
    fn attach(
        &mut self,
        panel: PanelId,
        kind: &PanelKind,
        title: &str,
        placement: DockPlacement,
    ) -> std::result::Result<crate::platform::HostSurface, DockError> {
        match self.dock.attach(panel, kind, title, placement) {
            Err(DockError::InvalidPlacement(reason)) => {
                tracing::debug!(panel_id = %panel, %reason, "Placement rejected, docking at edge");
                self.dock
                    .attach(panel, kind, title, DockPlacement::edge(placement.area))
            }
            other => other,
        }
    }

    // ----- layout transitions -----

    /// Switches to a layout
    ///
    /// Every docked panel is detached; closable panels are destroyed, the
    /// session tree and layout list are kept for reuse. Then either the
    /// default arrangement is rebuilt or the saved layout is replayed.
    /// Switching to the active layout rebuilds it.
    ///
    /// A named layout that does not exist falls back to the default
    /// arrangement.
    ///
    /// # Errors
    ///
    /// Returns `TransitionConflict` if a transition is running, or a layout
    /// error if the layout file exists but cannot be read. In both cases
    /// nothing was torn down.
    pub async fn switch_layout(&mut self, target: LayoutTarget) -> Result<TransitionReport> {
        if !self.transitions.is_idle() {
            let conflict = TransitionConflict {
                requested: target.to_string(),
            };
            self.warn_status(conflict.to_string());
            return Err(conflict.into());
        }

        let layout = match self.load_target(&target) {
            Ok(layout) => layout,
            Err(e) => {
                self.warn_status(format!("Failed to load layout {target}: {e}"));
                return Err(e.into());
            }
        };

        let span = tracing::info_span!(
            crate::tracing::span_names::LAYOUT_TRANSITION,
            layout = %target
        );
        self.transitions.begin(&target)?;
        Ok(self.transition(layout).instrument(span).await)
    }

    async fn transition(&mut self, layout: Option<LayoutDescriptor>) -> TransitionReport {
        self.drain_exits();

        let mut report = TransitionReport::default();
        let reusable = self.tear_down(&mut report).await;

        match layout {
            None => {
                self.transitions.enter(TransitionState::Resetting);
                self.reset(reusable, &mut report);
            }
            Some(layout) => {
                self.transitions.enter(TransitionState::Restoring);
                self.restore(layout, reusable, &mut report).await;
            }
        }

        self.transitions.finish();
        self.absorb_requests();
        tracing::info!(
            layout = ?report.layout,
            torn_down = report.torn_down,
            rebuilt = report.rebuilt,
            warnings = report.warnings.len(),
            "Layout transition finished"
        );
        report
    }

    /// Loads the layout a target names; `None` means the default arrangement
    fn load_target(&mut self, target: &LayoutTarget) -> LayoutResult<Option<LayoutDescriptor>> {
        let path = match target {
            LayoutTarget::Default => return Ok(None),
            LayoutTarget::Named(name) => match self.catalog.find(name) {
                Some(entry) => entry.path.clone(),
                None => {
                    self.warn_status(LayoutError::NotFound(name.clone()).to_string());
                    return Ok(None);
                }
            },
            LayoutTarget::File(path) => {
                if !path.exists() {
                    self.warn_status(
                        LayoutError::NotFound(path.display().to_string()).to_string(),
                    );
                    return Ok(None);
                }
                path.clone()
            }
        };
        self.store.load(&path).map(Some)
    }

    /// Detaches every panel; returns the tool panels kept for reuse
    async fn tear_down(&mut self, report: &mut TransitionReport) -> HashMap<PanelKind, ToolPanel> {
        let order = self.dock_order();
        self.state.sort_by_dock_order(&order);
        let panels = std::mem::take(&mut self.state.panels);
        self.state.focused = None;

        let mut reusable = HashMap::new();
        for panel in panels {
            let panel_id = panel.id();
            self.detach_best_effort(panel_id);
            report.torn_down += 1;

            match panel {
                Panel::Terminal(terminal) => terminal.on_close(&self.bridge).await,
                Panel::Tool(tool) if tool.kind().is_closable() => {
                    tracing::debug!(panel_id = %panel_id, kind = %tool.kind(), "Tool panel closed");
                }
                Panel::Tool(tool) => {
                    reusable.insert(tool.kind().clone(), tool);
                }
            }
            self.absorb_requests();
        }

        // Anything the dock still holds was not ours
        for stray in self.dock_order() {
            tracing::error!(panel_id = %stray, "Unknown panel left in dock, detaching");
            self.detach_best_effort(stray);
        }
        reusable
    }

    fn reset(&mut self, mut reusable: HashMap<PanelKind, ToolPanel>, report: &mut TransitionReport) {
        for (kind, placement) in default_tool_placements() {
            let tool = reusable
                .remove(&kind)
                .unwrap_or_else(|| ToolPanel::new(kind.clone()));
            if self.dock_tool(tool, placement) {
                report.rebuilt += 1;
            }
        }
        self.state.active_layout = None;
        report.layout = None;
        self.status("Initialized default layout");
        self.notify(&StatusEvent::LayoutChanged { name: None });
    }

    async fn restore(
        &mut self,
        layout: LayoutDescriptor,
        mut reusable: HashMap<PanelKind, ToolPanel>,
        report: &mut TransitionReport,
    ) {
        let (steps, warnings) = resolve_layout(&layout, &self.registry);
        for warning in &warnings {
            self.warn_status(warning.to_string());
        }
        report.warnings.extend(warnings);

        let mut last_terminal = None;
        for step in steps {
            match step {
                RestoreStep::Tool { kind, placement } => {
                    let tool = reusable
                        .remove(&kind)
                        .unwrap_or_else(|| ToolPanel::new(kind.clone()));
                    if self.dock_tool(tool, placement) {
                        report.rebuilt += 1;
                    }
                }
                RestoreStep::Terminal {
                    descriptor,
                    placement,
                } => {
                    let session_id = descriptor.id.clone();
                    match self.launch_terminal(descriptor, placement).await {
                        Ok(panel_id) => {
                            report.rebuilt += 1;
                            last_terminal = Some(panel_id);
                        }
                        Err(e) => {
                            let warning = LayoutResolutionWarning::LaunchFailed {
                                session_id,
                                message: e.to_string(),
                            };
                            self.warn_status(warning.to_string());
                            report.warnings.push(warning);
                        }
                    }
                }
            }
            self.absorb_requests();
        }

        if let Some(panel_id) = last_terminal {
            self.activate_panel(panel_id);
        }

        report.layout = Some(layout.name.clone());
        let path = layout.path.display().to_string();
        let name = layout.name.clone();
        self.state.active_layout = Some(layout);
        self.status(format!("Loaded layout: {path}"));
        self.notify(&StatusEvent::LayoutChanged { name: Some(name) });
    }

    fn dock_tool(&mut self, tool: ToolPanel, placement: DockPlacement) -> bool {
        let kind = tool.kind().clone();
        match self.attach(tool.id(), &kind, &kind.to_string(), placement) {
            Ok(_) => {
                self.state.panels.push(Panel::Tool(tool));
                true
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Failed to dock tool panel");
                false
            }
        }
    }

    /// Attaches a new terminal panel and launches its process into it
    ///
    /// On failure the panel is detached again and nothing is added.
    async fn launch_terminal(
        &mut self,
        descriptor: Arc<SessionDescriptor>,
        placement: DockPlacement,
    ) -> Result<PanelId> {
        let panel_id = PanelId::new();
        let kind = PanelKind::Terminal {
            session_id: descriptor.id.clone(),
        };
        let surface = self.attach(panel_id, &kind, descriptor.title(), placement)?;

        let span = tracing::info_span!(
            crate::tracing::span_names::SESSION_LAUNCH,
            session_id = %descriptor.id,
            panel_id = %panel_id
        );

        match self.bridge.open(descriptor, surface).instrument(span).await {
            Ok(session) => {
                self.state
                    .panels
                    .push(Panel::Terminal(TerminalPanel::new(panel_id, session)));
                Ok(panel_id)
            }
            Err(e) => {
                self.detach_best_effort(panel_id);
                Err(e.into())
            }
        }
    }

    // ----- requests from other tasks -----

    /// Pulls queued requests while a transition runs
    ///
    /// Layout switches are rejected; everything else waits for `Idle`.
    fn absorb_requests(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            if self.transitions.is_idle() {
                self.deferred.push_back(request);
                continue;
            }
            match request {
                WorkspaceRequest::SwitchLayout(target) => {
                    let conflict = TransitionConflict {
                        requested: target.to_string(),
                    };
                    self.warn_status(conflict.to_string());
                }
                other => {
                    tracing::debug!(request = other.name(), "Deferring request until idle");
                    self.deferred.push_back(other);
                }
            }
        }
    }

    /// Handles one request; returns `false` for shutdown
    pub async fn handle_request(&mut self, request: WorkspaceRequest) -> bool {
        if !self.transitions.is_idle() {
            match request {
                WorkspaceRequest::SwitchLayout(target) => {
                    let conflict = TransitionConflict {
                        requested: target.to_string(),
                    };
                    self.warn_status(conflict.to_string());
                }
                other => self.deferred.push_back(other),
            }
            return true;
        }

        tracing::debug!(request = request.name(), "Handling request");
        match request {
            WorkspaceRequest::OpenSession(session_id) => {
                let _ = self.open_session(&session_id).await;
            }
            WorkspaceRequest::QuickConnect(quick) => {
                let _ = self.quick_connect(quick).await;
            }
            WorkspaceRequest::SwitchLayout(target) => {
                let _ = self.switch_layout(target).await;
            }
            WorkspaceRequest::SaveLayout => {
                let _ = self.save_layout();
            }
            WorkspaceRequest::SaveLayoutAs(path) => {
                let _ = self.save_layout_as(&path);
            }
            WorkspaceRequest::Broadcast(text) => {
                self.broadcast(&text);
            }
            WorkspaceRequest::ActivatePanel(panel_id) => {
                self.activate_panel(panel_id);
            }
            WorkspaceRequest::ClosePanel(panel_id) => {
                self.close_panel(panel_id).await;
            }
            WorkspaceRequest::ShowLogViewer => {
                self.show_log_viewer();
            }
            WorkspaceRequest::Describe(reply) => {
                self.evict_dead_panels();
                let order = self.dock_order();
                self.state.sort_by_dock_order(&order);
                let _ = reply.send(self.state.summary());
            }
            WorkspaceRequest::Shutdown => return false,
        }
        true
    }

    /// Replays deferred requests in order; returns `false` on shutdown
    pub async fn process_deferred(&mut self) -> bool {
        while let Some(request) = self.deferred.pop_front() {
            if !self.handle_request(request).await {
                return false;
            }
        }
        true
    }

    /// Serves requests, exit notices and liveness ticks until shutdown,
    /// then closes the workspace
    pub async fn run(&mut self) {
        let mut tick = tokio::time::interval(self.liveness_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if !self.process_deferred().await {
                break;
            }
            tokio::select! {
                Some(exit) = self.exits.recv() => self.on_process_exit(&exit),
                request = self.requests.recv() => {
                    let Some(request) = request else { break };
                    if !self.handle_request(request).await {
                        break;
                    }
                }
                _ = tick.tick() => {
                    self.evict_dead_panels();
                }
            }
        }

        self.close().await;
    }

    // ----- sessions -----

    /// Opens a registered session in a new terminal panel
    ///
    /// If the session already has a live panel, that panel is activated.
    ///
    /// # Errors
    ///
    /// Returns a registry error for unknown ids or the launch error; the
    /// workspace is unchanged in both cases.
    pub async fn open_session(&mut self, session_id: &SessionId) -> Result<PanelId> {
        self.evict_dead_panels();

        let descriptor = match self.registry.resolve(session_id) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                self.warn_status(e.to_string());
                return Err(e.into());
            }
        };

        if let Some(existing) = self.state.terminal_for(session_id).map(TerminalPanel::id) {
            self.activate_panel(existing);
            return Ok(existing);
        }

        let title = descriptor.title().to_string();
        match self.launch_terminal(descriptor, DockPlacement::document()).await {
            Ok(panel_id) => {
                self.status(format!("Opened session: {title}"));
                self.activate_panel(panel_id);
                Ok(panel_id)
            }
            Err(e) => {
                self.warn_status(format!("Failed to open {session_id}: {e}"));
                Err(e)
            }
        }
    }

    /// Registers an ad-hoc session under the connect bar namespace and
    /// opens it
    ///
    /// # Errors
    ///
    /// Returns a registry error for an empty host or the launch error.
    pub async fn quick_connect(&mut self, request: QuickConnect) -> Result<PanelId> {
        let label = request.host.trim().to_string();
        let descriptor = request.into_descriptor();
        let session_id = match self
            .registry
            .register(CONNECT_BAR_NAMESPACE, &label, descriptor)
        {
            Ok(id) => id,
            Err(e) => {
                self.warn_status(e.to_string());
                return Err(e.into());
            }
        };
        self.open_session(&session_id).await
    }

    /// Makes a panel active; terminals get keyboard focus
    ///
    /// Returns `false` if the panel is not docked or its terminal has died
    /// (it is evicted in that case).
    pub fn activate_panel(&mut self, panel_id: PanelId) -> bool {
        self.evict_dead_panels();
        let Some(index) = self.state.position(panel_id) else {
            return false;
        };
        if let Err(e) = self.dock.activate(panel_id) {
            tracing::error!(panel_id = %panel_id, error = %e, "Dock refused activation");
            return false;
        }

        let panel = &mut self.state.panels[index];
        if let Some(terminal) = panel.as_terminal_mut() {
            terminal.on_activated(&self.bridge);
        }
        let title = panel.title();
        self.state.focused = Some(panel_id);

        let window_title = format!("{} - {title}", self.window_title);
        self.dock.set_window_title(&window_title);
        self.notify(&StatusEvent::ActivePanelChanged {
            panel_id,
            window_title,
        });
        true
    }

    /// Closes a panel; terminals end their process
    ///
    /// The session tree and layout list cannot be closed. Returns whether
    /// the panel was closed.
    pub async fn close_panel(&mut self, panel_id: PanelId) -> bool {
        let Some(panel) = self.state.panel(panel_id) else {
            return false;
        };
        if !panel.is_closable() {
            let title = panel.title();
            self.warn_status(format!("{title} cannot be closed"));
            return false;
        }
        let was_focused = self.state.focused == Some(panel_id);
        let Some(panel) = self.state.remove(panel_id) else {
            return false;
        };

        self.detach_best_effort(panel_id);
        if let Panel::Terminal(terminal) = panel {
            let session_id = terminal.session_id().clone();
            terminal.on_close(&self.bridge).await;
            tracing::info!(session_id = %session_id, panel_id = %panel_id, "Panel closed");
        }

        if was_focused {
            self.activate_fallback();
        }
        true
    }

    fn activate_fallback(&mut self) {
        let order = self.dock_order();
        self.state.sort_by_dock_order(&order);
        let next = self
            .state
            .terminals()
            .filter(|t| t.is_alive())
            .last()
            .map(TerminalPanel::id);
        if let Some(panel_id) = next {
            self.activate_panel(panel_id);
        }
    }

    /// Shows the log viewer, creating it at the bottom edge if needed
    pub fn show_log_viewer(&mut self) -> Option<PanelId> {
        if let Some(existing) = self
            .state
            .panel_of_kind(&PanelKind::LogViewer)
            .map(Panel::id)
        {
            self.activate_panel(existing);
            return Some(existing);
        }

        let tool = ToolPanel::new(PanelKind::LogViewer);
        let panel_id = tool.id();
        if !self.dock_tool(tool, DockPlacement::edge(DockArea::Bottom)) {
            return None;
        }
        self.activate_panel(panel_id);
        Some(panel_id)
    }

    /// Forwards a dock resize to the panel's terminal
    pub fn panel_resized(&mut self, panel_id: PanelId) {
        let Some(size) = self.dock.surface_size(panel_id) else {
            return;
        };
        let Some(index) = self.state.position(panel_id) else {
            return;
        };
        if let Some(terminal) = self.state.panels[index].as_terminal_mut() {
            terminal.on_resized(&self.bridge, size);
        }
    }

    // ----- liveness -----

    /// Applies queued process exit notices
    pub fn drain_exits(&mut self) {
        while let Ok(exit) = self.exits.try_recv() {
            self.on_process_exit(&exit);
        }
    }

    fn on_process_exit(&mut self, exit: &ProcessExit) {
        let panel_id = self
            .state
            .terminals()
            .find(|t| t.session_id() == &exit.session_id && t.launch_id() == exit.launch_id)
            .map(TerminalPanel::id);
        match panel_id {
            Some(panel_id) => self.evict(panel_id),
            None => tracing::trace!(session_id = %exit.session_id, "Exit for a panel already gone"),
        }
    }

    /// Removes every terminal panel whose process has exited
    ///
    /// Returns the number of panels removed.
    pub fn evict_dead_panels(&mut self) -> usize {
        self.drain_exits();
        let dead: Vec<PanelId> = self
            .state
            .terminals()
            .filter(|t| !t.is_alive())
            .map(TerminalPanel::id)
            .collect();
        let count = dead.len();
        for panel_id in dead {
            self.evict(panel_id);
        }
        count
    }

    fn evict(&mut self, panel_id: PanelId) {
        let was_focused = self.state.focused == Some(panel_id);
        let Some(Panel::Terminal(terminal)) = self.state.remove(panel_id) else {
            return;
        };
        let session_id = terminal.session_id().clone();
        self.detach_best_effort(panel_id);
        drop(terminal);

        tracing::info!(session_id = %session_id, panel_id = %panel_id, "Terminal exited, panel removed");
        self.notify(&StatusEvent::SessionExited {
            session_id: session_id.clone(),
        });
        self.status(format!("Session exited: {session_id}"));
        if was_focused {
            self.activate_fallback();
        }
    }

    // ----- broadcast -----

    /// Types `text` followed by Enter into every docked terminal, in dock
    /// order; returns how many received it
    ///
    /// Empty text does nothing. Terminals whose process has exited are
    /// skipped and removed afterwards.
    pub fn broadcast(&mut self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let order = self.dock_order();
        self.state.sort_by_dock_order(&order);

        let span = tracing::info_span!(crate::tracing::span_names::BROADCAST);
        let _enter = span.enter();

        let report = self.broadcaster.broadcast(
            &self.bridge,
            self.state
                .panels
                .iter_mut()
                .filter_map(Panel::as_terminal_mut),
            text,
        );
        for (session_id, error) in &report.failed {
            self.warn_status(format!("Failed to send command to {session_id}: {error}"));
        }
        self.status(report.status());
        if !report.skipped_dead.is_empty() {
            self.evict_dead_panels();
        }
        report.sent()
    }

    // ----- saving -----

    /// Current arrangement as a layout for `path`
    #[must_use]
    pub fn snapshot(&self, path: &Path) -> LayoutDescriptor {
        let mut layout = LayoutDescriptor::for_path(path);
        layout.saved_at = Some(Utc::now());
        layout.panels = self
            .dock
            .panels()
            .into_iter()
            .filter_map(|docked| {
                let panel = self.state.panel(docked.id)?;
                if panel.as_terminal().is_some_and(|t| !t.is_alive()) {
                    return None;
                }
                Some(PanelPlacement::new(&panel.kind(), docked.placement))
            })
            .collect();
        layout
    }

    /// Saves the current layout to its own file
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Unsaved` when the current layout is the default
    /// arrangement, or the store's error.
    pub fn save_layout(&mut self) -> LayoutResult<PathBuf> {
        let Some(path) = self.state.active_layout.as_ref().map(|l| l.path.clone()) else {
            self.warn_status(LayoutError::Unsaved.to_string());
            return Err(LayoutError::Unsaved);
        };
        self.status(format!("Saving layout: {}", path.display()));
        self.write_layout(&path)?;
        Ok(path)
    }

    /// Saves the current layout to a new file, which becomes the current
    /// layout; a bare name is saved in the layouts directory
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub fn save_layout_as(&mut self, path: &Path) -> LayoutResult<PathBuf> {
        let path = if path.components().count() == 1 && path.extension().is_none() {
            self.catalog.path_for(&path.to_string_lossy())
        } else {
            path.to_path_buf()
        };
        self.status(format!("Saving layout as: {}", path.display()));
        let layout = self.write_layout(&path)?;
        self.catalog.add_layout(&path);
        let name = layout.name.clone();
        self.state.active_layout = Some(layout);
        self.notify(&StatusEvent::LayoutChanged { name: Some(name) });
        Ok(path)
    }

    fn write_layout(&mut self, path: &Path) -> LayoutResult<LayoutDescriptor> {
        self.evict_dead_panels();
        let layout = self.snapshot(path);
        let span = tracing::info_span!(
            crate::tracing::span_names::LAYOUT_SAVE,
            layout = %layout.name
        );
        let _enter = span.enter();

        if let Err(e) = self.store.save(path, &layout) {
            self.warn_status(format!("Failed to save layout: {e}"));
            return Err(e);
        }
        tracing::info!(path = %path.display(), panels = layout.panels.len(), "Layout saved");
        Ok(layout)
    }
}
