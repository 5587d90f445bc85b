//! Native process and window seams
//!
//! Everything OS-specific sits behind two traits: [`ProcessLauncher`] starts
//! terminal processes and [`WindowSystem`] finds, reparents and drives their
//! top-level windows. The rest of the workspace only ever sees the opaque
//! [`NativeWindow`] and [`HostSurface`] tokens.

mod fake;
mod system;
mod xdotool;

pub use fake::{FakeBehavior, FakePlatform, InjectedInput};
pub use system::SystemLauncher;
pub use xdotool::XdotoolWindowSystem;

use std::fmt;
use std::io;

use tokio::sync::mpsc;

use crate::bridge::CommandLine;
use crate::error::PlatformResult;
use crate::models::SessionId;

/// Opaque handle to a native top-level window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeWindow(u64);

impl NativeWindow {
    /// Wraps a raw window id from the platform
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw window id
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NativeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Pixel size of a host surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl SurfaceSize {
    /// Creates a size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Region of a dock panel that an embedded window is reparented into
///
/// `id` is the platform id of the container window; `0` means the dock has
/// no native container (headless), in which case windows stay top-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostSurface {
    /// Native container id
    pub id: u64,
    /// Current size
    pub size: SurfaceSize,
}

/// Non-printable keys the workspace injects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKey {
    /// Return / Enter
    Enter,
    /// Tab
    Tab,
    /// Escape
    Escape,
}

impl InputKey {
    /// X keysym name
    #[must_use]
    pub const fn keysym(self) -> &'static str {
        match self {
            Self::Enter => "Return",
            Self::Tab => "Tab",
            Self::Escape => "Escape",
        }
    }
}

/// One synthesized input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A printable character
    Char(char),
    /// A special key
    Key(InputKey),
}

/// Identifies one launch of a terminal process
///
/// A session relaunched by a layout switch gets a new launch id, so a late
/// exit notice from the old process cannot evict the new panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaunchId(pub u64);

/// Exit notice delivered to the workspace thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// Session whose process ended
    pub session_id: SessionId,
    /// Launch that ended
    pub launch_id: LaunchId,
}

/// Sender half given to a launcher so it can report process exit
#[derive(Debug, Clone)]
pub struct ExitNotifier {
    session_id: SessionId,
    launch_id: LaunchId,
    tx: mpsc::UnboundedSender<ProcessExit>,
}

impl ExitNotifier {
    /// Creates a notifier for one launch
    #[must_use]
    pub const fn new(
        session_id: SessionId,
        launch_id: LaunchId,
        tx: mpsc::UnboundedSender<ProcessExit>,
    ) -> Self {
        Self {
            session_id,
            launch_id,
            tx,
        }
    }

    /// Reports that the process ended; ignored once the workspace is gone
    pub fn notify(&self) {
        let _ = self.tx.send(ProcessExit {
            session_id: self.session_id.clone(),
            launch_id: self.launch_id,
        });
    }

    /// Session this notifier reports for
    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

/// A running terminal process
pub trait ProcessHandle {
    /// OS process id, if the process is still known to the OS
    fn pid(&self) -> Option<u32>;

    /// Whether the process is still running
    fn is_alive(&self) -> bool;

    /// Forcibly terminates the process; a no-op if it already exited
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the signal could not be delivered.
    fn kill(&mut self) -> io::Result<()>;
}

/// Starts terminal processes
pub trait ProcessLauncher {
    /// Spawns `command`; `exits` must be notified when the process ends
    ///
    /// # Errors
    ///
    /// Returns the OS error if the process could not be started.
    fn launch(
        &self,
        command: &CommandLine,
        exits: ExitNotifier,
    ) -> io::Result<Box<dyn ProcessHandle>>;
}

/// Native window operations
pub trait WindowSystem {
    /// Finds the visible top-level window owned by `pid`, if it exists yet
    ///
    /// # Errors
    ///
    /// Returns an error if the window system could not be queried.
    fn find_process_window(&self, pid: u32) -> PlatformResult<Option<NativeWindow>>;

    /// Reparents `window` into `surface` and sizes it to fill it
    ///
    /// # Errors
    ///
    /// Returns an error if the window is gone or the call failed.
    fn reparent(&self, window: NativeWindow, surface: &HostSurface) -> PlatformResult<()>;

    /// Undoes reparenting so the window no longer draws into the dock
    ///
    /// # Errors
    ///
    /// Returns an error if the call failed.
    fn release(&self, window: NativeWindow) -> PlatformResult<()>;

    /// Resizes `window`
    ///
    /// # Errors
    ///
    /// Returns an error if the window is gone or the call failed.
    fn resize(&self, window: NativeWindow, size: SurfaceSize) -> PlatformResult<()>;

    /// Gives keyboard focus to `window`
    ///
    /// # Errors
    ///
    /// Returns an error if the window is gone or the call failed.
    fn focus(&self, window: NativeWindow) -> PlatformResult<()>;

    /// Asks `window` to close
    ///
    /// # Errors
    ///
    /// Returns an error if the window is gone or the call failed.
    fn close(&self, window: NativeWindow) -> PlatformResult<()>;

    /// Delivers input events to `window`, in order
    ///
    /// # Errors
    ///
    /// Returns an error if any event could not be delivered.
    fn send_input(&self, window: NativeWindow, events: &[InputEvent]) -> PlatformResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_window_display_is_hex() {
        assert_eq!(NativeWindow::from_raw(0x3a0000c).to_string(), "0x3a0000c");
        assert_eq!(NativeWindow::from_raw(7).as_raw(), 7);
    }

    #[test]
    fn exit_notifier_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = ExitNotifier::new(SessionId::from("tree/a"), LaunchId(3), tx);
        notifier.notify();
        let exit = rx.try_recv().unwrap();
        assert_eq!(exit.session_id.as_str(), "tree/a");
        assert_eq!(exit.launch_id, LaunchId(3));
    }

    #[test]
    fn notify_after_receiver_dropped_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ExitNotifier::new(SessionId::from("x"), LaunchId(1), tx).notify();
    }
}
