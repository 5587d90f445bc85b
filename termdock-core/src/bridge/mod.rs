//! Process bridge
//!
//! Launches a terminal program for a session, waits for its top-level window,
//! and reparents it into a dock surface. An [`EmbeddedSession`] owns the
//! process; its native window is only handed out while the process lives.

mod command;

pub use command::{CommandLine, build_command_line, resolve_executable};

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{LaunchError, LaunchResult, PlatformResult};
use crate::models::{SessionDescriptor, SessionId};
use crate::platform::{
    ExitNotifier, HostSurface, InputEvent, LaunchId, NativeWindow, ProcessExit, ProcessHandle,
    ProcessLauncher, SurfaceSize, WindowSystem,
};

/// Default number of window polls
pub const DEFAULT_WINDOW_WAIT_ATTEMPTS: u32 = 50;

/// Default delay between window polls in milliseconds
pub const DEFAULT_WINDOW_WAIT_INTERVAL_MS: u64 = 100;

/// Default polls to wait for a graceful close before killing
pub const DEFAULT_CLOSE_GRACE_ATTEMPTS: u32 = 20;

/// Bounded retry budget for the window wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowWaitConfig {
    /// Polls before giving up
    pub attempts: u32,
    /// Delay between polls
    pub interval: Duration,
    /// Polls to wait for the process to end after a graceful close
    pub close_grace_attempts: u32,
}

impl Default for WindowWaitConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_WINDOW_WAIT_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_WINDOW_WAIT_INTERVAL_MS),
            close_grace_attempts: DEFAULT_CLOSE_GRACE_ATTEMPTS,
        }
    }
}

impl WindowWaitConfig {
    /// Sets the attempt count (at least one)
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Sets the poll interval
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the graceful close budget
    #[must_use]
    pub const fn with_close_grace_attempts(mut self, attempts: u32) -> Self {
        self.close_grace_attempts = attempts;
        self
    }

    /// Upper bound on the time spent waiting for a window
    #[must_use]
    pub fn total_wait(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// A running terminal process with its window embedded in a dock surface
pub struct EmbeddedSession {
    descriptor: Arc<SessionDescriptor>,
    launch_id: LaunchId,
    process: Box<dyn ProcessHandle>,
    window: Option<NativeWindow>,
    surface: HostSurface,
    released: bool,
}

impl std::fmt::Debug for EmbeddedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedSession")
            .field("session_id", &self.descriptor.id)
            .field("launch_id", &self.launch_id)
            .field("window", &self.window)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl EmbeddedSession {
    /// Session this process belongs to
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.descriptor.id
    }

    /// Descriptor the process was launched from
    #[must_use]
    pub fn descriptor(&self) -> &Arc<SessionDescriptor> {
        &self.descriptor
    }

    /// Launch this session belongs to
    #[must_use]
    pub const fn launch_id(&self) -> LaunchId {
        self.launch_id
    }

    /// Whether the process is still running
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.process.is_alive()
    }

    /// The embedded window, only while the process is alive
    pub fn window(&mut self) -> Option<NativeWindow> {
        if self.window.is_some() && !self.process.is_alive() {
            self.window = None;
        }
        self.window
    }

    /// Surface the window is embedded in
    #[must_use]
    pub const fn surface(&self) -> HostSurface {
        self.surface
    }
}

impl Drop for EmbeddedSession {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.process.kill();
        }
    }
}

/// Kills a just-launched process unless disarmed
///
/// Covers every early return of [`ProcessBridge::open`], including the
/// future being dropped mid-wait.
struct LaunchGuard {
    process: Option<Box<dyn ProcessHandle>>,
}

impl LaunchGuard {
    fn process(&self) -> Option<&dyn ProcessHandle> {
        self.process.as_deref()
    }

    fn disarm(mut self) -> Option<Box<dyn ProcessHandle>> {
        self.process.take()
    }
}

impl Drop for LaunchGuard {
    fn drop(&mut self) {
        if let Some(mut process) = self.process.take() {
            if process.is_alive() {
                tracing::debug!(pid = ?process.pid(), "Killing abandoned terminal process");
                let _ = process.kill();
            }
        }
    }
}

/// Launches and drives embedded terminal sessions
pub struct ProcessBridge {
    executable: PathBuf,
    wait: WindowWaitConfig,
    launcher: Box<dyn ProcessLauncher>,
    windows: Rc<dyn WindowSystem>,
    exits: mpsc::UnboundedSender<ProcessExit>,
    next_launch: Cell<u64>,
}

impl std::fmt::Debug for ProcessBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessBridge")
            .field("executable", &self.executable)
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl ProcessBridge {
    /// Creates a bridge; exit notices go to `exits`
    #[must_use]
    pub fn new(
        executable: impl Into<PathBuf>,
        launcher: Box<dyn ProcessLauncher>,
        windows: Rc<dyn WindowSystem>,
        exits: mpsc::UnboundedSender<ProcessExit>,
    ) -> Self {
        Self {
            executable: executable.into(),
            wait: WindowWaitConfig::default(),
            launcher,
            windows,
            exits,
            next_launch: Cell::new(1),
        }
    }

    /// Sets the window wait budget
    #[must_use]
    pub const fn with_window_wait(mut self, wait: WindowWaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Configured terminal executable
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Window wait budget
    #[must_use]
    pub const fn window_wait(&self) -> WindowWaitConfig {
        self.wait
    }

    /// Starts the terminal for `descriptor` and embeds its window into `surface`
    ///
    /// Returns only once the window is reparented. On every failure path the
    /// process has been terminated.
    ///
    /// # Errors
    ///
    /// - `ExecutableNotFound` before anything is spawned
    /// - `SpawnFailed` if the OS refuses the process
    /// - `ProcessExited` if it dies before showing a window
    /// - `WindowTimeout` if no window appears within the budget
    /// - `Platform` if reparenting fails
    pub async fn open(
        &self,
        descriptor: Arc<SessionDescriptor>,
        surface: HostSurface,
    ) -> LaunchResult<EmbeddedSession> {
        let program = resolve_executable(&self.executable)
            .ok_or_else(|| LaunchError::ExecutableNotFound(self.executable.clone()))?;
        let command = build_command_line(&program, &descriptor);

        let launch_id = LaunchId(self.next_launch.get());
        self.next_launch.set(launch_id.0 + 1);

        tracing::info!(
            session_id = %descriptor.id,
            protocol = %descriptor.protocol,
            command = %command,
            "Launching terminal"
        );

        let notifier = ExitNotifier::new(descriptor.id.clone(), launch_id, self.exits.clone());
        let process = self
            .launcher
            .launch(&command, notifier)
            .map_err(LaunchError::SpawnFailed)?;
        let guard = LaunchGuard {
            process: Some(process),
        };

        let window = self.wait_for_window(&descriptor.id, &guard).await?;

        self.windows.reparent(window, &surface)?;
        let Some(process) = guard.disarm() else {
            return Err(LaunchError::ProcessExited(descriptor.id.clone()));
        };

        tracing::info!(
            session_id = %descriptor.id,
            window = %window,
            "Terminal window embedded"
        );

        Ok(EmbeddedSession {
            descriptor,
            launch_id,
            process,
            window: Some(window),
            surface,
            released: false,
        })
    }

    async fn wait_for_window(
        &self,
        session_id: &SessionId,
        guard: &LaunchGuard,
    ) -> LaunchResult<NativeWindow> {
        for attempt in 1..=self.wait.attempts {
            let Some(pid) = guard.process().and_then(|p| p.pid()) else {
                return Err(LaunchError::ProcessExited(session_id.clone()));
            };

            match self.windows.find_process_window(pid) {
                Ok(Some(window)) => {
                    tracing::debug!(%session_id, attempt, window = %window, "Window found");
                    return Ok(window);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(%session_id, attempt, error = %e, "Window lookup failed"),
            }

            if attempt < self.wait.attempts {
                tokio::time::sleep(self.wait.interval).await;
            }
        }

        tracing::warn!(
            %session_id,
            attempts = self.wait.attempts,
            "Timed out waiting for terminal window"
        );
        Err(LaunchError::WindowTimeout {
            session_id: session_id.clone(),
            attempts: self.wait.attempts,
        })
    }

    /// Gives keyboard focus to the session's window
    ///
    /// Returns `false` if the process has exited.
    pub fn focus(&self, session: &mut EmbeddedSession) -> bool {
        let Some(window) = session.window() else {
            return false;
        };
        match self.windows.focus(window) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(session_id = %session.session_id(), error = %e, "Focus failed");
                false
            }
        }
    }

    /// Resizes the embedded window to a new surface size
    pub fn resize(&self, session: &mut EmbeddedSession, size: SurfaceSize) {
        session.surface.size = size;
        if let Some(window) = session.window() {
            if let Err(e) = self.windows.resize(window, size) {
                tracing::debug!(session_id = %session.session_id(), error = %e, "Resize failed");
            }
        }
    }

    /// Delivers input events to the session's window
    ///
    /// Returns `Ok(false)` without sending anything if the process is gone.
    ///
    /// # Errors
    ///
    /// Returns the platform error if delivery failed.
    pub fn send_input(
        &self,
        session: &mut EmbeddedSession,
        events: &[InputEvent],
    ) -> PlatformResult<bool> {
        let Some(window) = session.window() else {
            return Ok(false);
        };
        self.windows.send_input(window, events)?;
        Ok(true)
    }

    /// Whether the session's process is still running
    #[must_use]
    pub fn is_alive(&self, session: &EmbeddedSession) -> bool {
        session.is_alive()
    }

    /// Asks the session's window to close and releases it from the host
    /// surface, then kills the process if it lingers
    ///
    /// Safe to call on a session whose process already exited.
    pub async fn close(&self, mut session: EmbeddedSession) {
        let session_id = session.session_id().clone();
        session.released = true;

        let Some(window) = session.window() else {
            tracing::debug!(%session_id, "Session already exited");
            return;
        };

        if let Err(e) = self.windows.close(window) {
            tracing::debug!(%session_id, error = %e, "Close request failed");
        }
        if let Err(e) = self.windows.release(window) {
            tracing::debug!(%session_id, error = %e, "Release failed");
        }

        for _ in 0..self.wait.close_grace_attempts {
            if !session.process.is_alive() {
                tracing::debug!(%session_id, "Session closed");
                return;
            }
            tokio::time::sleep(self.wait.interval).await;
        }

        if session.process.is_alive() {
            tracing::warn!(%session_id, "Terminal ignored close request, killing");
            if let Err(e) = session.process.kill() {
                tracing::warn!(%session_id, error = %e, "Failed to kill terminal process");
            }
        }
    }
}
