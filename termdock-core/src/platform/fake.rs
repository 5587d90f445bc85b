//! In-memory platform for tests and headless runs
//!
//! [`FakePlatform`] implements both [`ProcessLauncher`] and [`WindowSystem`].
//! Clones share state, so a test can hand one clone to the workspace and
//! keep another to kill processes and inspect injected input.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::rc::Rc;

use super::{
    ExitNotifier, HostSurface, InputEvent, InputKey, NativeWindow, ProcessHandle, ProcessLauncher,
    SurfaceSize, WindowSystem,
};
use crate::bridge::CommandLine;
use crate::error::{PlatformError, PlatformResult};
use crate::models::SessionId;

const FIRST_PID: u32 = 4000;
const FIRST_WINDOW: u64 = 0x0100_0000;

/// How fake processes behave after launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FakeBehavior {
    /// Window polls that return nothing before the window appears
    pub window_after_polls: u32,
    /// The process never shows a window
    pub never_show_window: bool,
    /// The process exits right after starting
    pub exit_immediately: bool,
    /// Spawning fails
    pub fail_spawn: bool,
    /// Closing the window does not end the process
    pub ignore_close: bool,
}

/// One recorded input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedInput {
    /// Target window
    pub window: NativeWindow,
    /// Session owning the window
    pub session_id: SessionId,
    /// The event
    pub event: InputEvent,
}

#[derive(Debug)]
struct FakeProcess {
    session_id: SessionId,
    alive: bool,
    polls: u32,
    window: Option<NativeWindow>,
    behavior: FakeBehavior,
    exits: ExitNotifier,
}

#[derive(Debug)]
struct FakeWindow {
    pid: u32,
    parent: Option<u64>,
    size: SurfaceSize,
    released: bool,
}

#[derive(Debug)]
struct FakeState {
    next_pid: u32,
    next_window: u64,
    processes: BTreeMap<u32, FakeProcess>,
    windows: BTreeMap<u64, FakeWindow>,
    default_behavior: FakeBehavior,
    session_behavior: HashMap<SessionId, FakeBehavior>,
    failing_input: HashSet<SessionId>,
    launches: Vec<CommandLine>,
    inputs: Vec<InjectedInput>,
    close_requests: Vec<(SessionId, Option<u64>)>,
    focused: Option<NativeWindow>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            next_pid: FIRST_PID,
            next_window: FIRST_WINDOW,
            processes: BTreeMap::new(),
            windows: BTreeMap::new(),
            default_behavior: FakeBehavior::default(),
            session_behavior: HashMap::new(),
            failing_input: HashSet::new(),
            launches: Vec::new(),
            inputs: Vec::new(),
            close_requests: Vec::new(),
            focused: None,
        }
    }
}

impl FakeState {
    fn end_process(&mut self, pid: u32) -> bool {
        let Some(process) = self.processes.get_mut(&pid) else {
            return false;
        };
        if !process.alive {
            return false;
        }
        process.alive = false;
        if let Some(window) = process.window.take() {
            self.windows.remove(&window.as_raw());
            if self.focused == Some(window) {
                self.focused = None;
            }
        }
        process.exits.notify();
        true
    }

    fn live_window(&self, window: NativeWindow) -> PlatformResult<&FakeWindow> {
        self.windows
            .get(&window.as_raw())
            .ok_or(PlatformError::WindowGone(window.as_raw()))
    }

    fn live_pid_for(&self, session_id: &SessionId) -> Option<u32> {
        self.processes
            .iter()
            .rev()
            .find(|(_, p)| p.alive && &p.session_id == session_id)
            .map(|(pid, _)| *pid)
    }
}

/// Shared in-memory launcher and window system
#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    state: Rc<RefCell<FakeState>>,
}

impl FakePlatform {
    /// Creates a platform where windows appear on the first poll
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the behavior for processes launched from now on
    pub fn set_default_behavior(&self, behavior: FakeBehavior) {
        self.state.borrow_mut().default_behavior = behavior;
    }

    /// Overrides the behavior for one session's future launches
    pub fn set_session_behavior(&self, session_id: &SessionId, behavior: FakeBehavior) {
        self.state
            .borrow_mut()
            .session_behavior
            .insert(session_id.clone(), behavior);
    }

    /// Makes input injection into this session's window fail
    pub fn fail_input_for(&self, session_id: &SessionId) {
        self.state
            .borrow_mut()
            .failing_input
            .insert(session_id.clone());
    }

    /// Ends the newest live process of a session, as if the user typed `exit`
    ///
    /// Returns `false` if the session has no live process.
    pub fn exit_session(&self, session_id: &SessionId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.live_pid_for(session_id) {
            Some(pid) => state.end_process(pid),
            None => false,
        }
    }

    /// Number of processes still running
    #[must_use]
    pub fn live_process_count(&self) -> usize {
        self.state
            .borrow()
            .processes
            .values()
            .filter(|p| p.alive)
            .count()
    }

    /// Number of launches made for a session
    #[must_use]
    pub fn launch_count_for(&self, session_id: &SessionId) -> usize {
        self.state
            .borrow()
            .processes
            .values()
            .filter(|p| &p.session_id == session_id)
            .count()
    }

    /// Every command line launched, in order
    #[must_use]
    pub fn launches(&self) -> Vec<CommandLine> {
        self.state.borrow().launches.clone()
    }

    /// Window of the session's live process
    #[must_use]
    pub fn window_for_session(&self, session_id: &SessionId) -> Option<NativeWindow> {
        let state = self.state.borrow();
        let pid = state.live_pid_for(session_id)?;
        state.processes.get(&pid).and_then(|p| p.window)
    }

    /// Container a window is reparented into
    #[must_use]
    pub fn parent_of(&self, window: NativeWindow) -> Option<u64> {
        self.state
            .borrow()
            .windows
            .get(&window.as_raw())
            .and_then(|w| w.parent)
    }

    /// Current size of a window
    #[must_use]
    pub fn size_of(&self, window: NativeWindow) -> Option<SurfaceSize> {
        self.state
            .borrow()
            .windows
            .get(&window.as_raw())
            .map(|w| w.size)
    }

    /// Window holding keyboard focus
    #[must_use]
    pub fn focused_window(&self) -> Option<NativeWindow> {
        self.state.borrow().focused
    }

    /// Session whose window holds keyboard focus
    #[must_use]
    pub fn focused_session(&self) -> Option<SessionId> {
        let state = self.state.borrow();
        let window = state.focused?;
        let pid = state.windows.get(&window.as_raw())?.pid;
        state.processes.get(&pid).map(|p| p.session_id.clone())
    }

    /// Close requests in order, with the surface each window was docked in
    /// when the request arrived
    #[must_use]
    pub fn close_requests(&self) -> Vec<(SessionId, Option<u64>)> {
        self.state.borrow().close_requests.clone()
    }

    /// All recorded input, in delivery order
    #[must_use]
    pub fn inputs(&self) -> Vec<InjectedInput> {
        self.state.borrow().inputs.clone()
    }

    /// Text typed into a session; Enter shows as `\n`
    #[must_use]
    pub fn text_sent_to(&self, session_id: &SessionId) -> String {
        self.state
            .borrow()
            .inputs
            .iter()
            .filter(|i| &i.session_id == session_id)
            .filter_map(|i| match i.event {
                InputEvent::Char(c) => Some(c),
                InputEvent::Key(InputKey::Enter) => Some('\n'),
                InputEvent::Key(_) => None,
            })
            .collect()
    }
}

/// Handle to a fake process
struct FakeProcessHandle {
    pid: u32,
    state: Rc<RefCell<FakeState>>,
}

impl ProcessHandle for FakeProcessHandle {
    fn pid(&self) -> Option<u32> {
        self.is_alive().then_some(self.pid)
    }

    fn is_alive(&self) -> bool {
        self.state
            .borrow()
            .processes
            .get(&self.pid)
            .is_some_and(|p| p.alive)
    }

    fn kill(&mut self) -> io::Result<()> {
        self.state.borrow_mut().end_process(self.pid);
        Ok(())
    }
}

impl ProcessLauncher for FakePlatform {
    fn launch(
        &self,
        command: &CommandLine,
        exits: ExitNotifier,
    ) -> io::Result<Box<dyn ProcessHandle>> {
        let mut state = self.state.borrow_mut();
        let session_id = exits.session_id().clone();
        let behavior = state
            .session_behavior
            .get(&session_id)
            .copied()
            .unwrap_or(state.default_behavior);

        if behavior.fail_spawn {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "fake spawn failure",
            ));
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        state.launches.push(command.clone());
        state.processes.insert(
            pid,
            FakeProcess {
                session_id,
                alive: true,
                polls: 0,
                window: None,
                behavior,
                exits,
            },
        );
        if behavior.exit_immediately {
            state.end_process(pid);
        }

        Ok(Box::new(FakeProcessHandle {
            pid,
            state: Rc::clone(&self.state),
        }))
    }
}

impl WindowSystem for FakePlatform {
    fn find_process_window(&self, pid: u32) -> PlatformResult<Option<NativeWindow>> {
        let mut state = self.state.borrow_mut();
        let next_window = state.next_window;
        let Some(process) = state.processes.get_mut(&pid) else {
            return Ok(None);
        };
        if !process.alive {
            return Ok(None);
        }
        if let Some(window) = process.window {
            return Ok(Some(window));
        }
        process.polls += 1;
        if process.behavior.never_show_window || process.polls <= process.behavior.window_after_polls
        {
            return Ok(None);
        }

        let window = NativeWindow::from_raw(next_window);
        process.window = Some(window);
        state.next_window += 1;
        state.windows.insert(
            window.as_raw(),
            FakeWindow {
                pid,
                parent: None,
                size: SurfaceSize::default(),
                released: false,
            },
        );
        Ok(Some(window))
    }

    fn reparent(&self, window: NativeWindow, surface: &HostSurface) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .windows
            .get_mut(&window.as_raw())
            .ok_or(PlatformError::WindowGone(window.as_raw()))?;
        entry.parent = (surface.id != 0).then_some(surface.id);
        entry.size = surface.size;
        entry.released = false;
        Ok(())
    }

    fn release(&self, window: NativeWindow) -> PlatformResult<()> {
        if let Some(entry) = self.state.borrow_mut().windows.get_mut(&window.as_raw()) {
            entry.parent = None;
            entry.released = true;
        }
        Ok(())
    }

    fn resize(&self, window: NativeWindow, size: SurfaceSize) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .windows
            .get_mut(&window.as_raw())
            .ok_or(PlatformError::WindowGone(window.as_raw()))?;
        entry.size = size;
        Ok(())
    }

    fn focus(&self, window: NativeWindow) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        state.live_window(window)?;
        state.focused = Some(window);
        Ok(())
    }

    fn close(&self, window: NativeWindow) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        let (pid, parent) = {
            let entry = state.live_window(window)?;
            (entry.pid, entry.parent)
        };
        let session_id = state.processes.get(&pid).map(|p| p.session_id.clone());
        if let Some(session_id) = session_id {
            state.close_requests.push((session_id, parent));
        }
        let ignore = state
            .processes
            .get(&pid)
            .is_some_and(|p| p.behavior.ignore_close);
        if !ignore {
            state.end_process(pid);
        }
        Ok(())
    }

    fn send_input(&self, window: NativeWindow, events: &[InputEvent]) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        let pid = state.live_window(window)?.pid;
        let session_id = state
            .processes
            .get(&pid)
            .map(|p| p.session_id.clone())
            .ok_or(PlatformError::WindowGone(window.as_raw()))?;
        if state.failing_input.contains(&session_id) {
            return Err(PlatformError::CommandFailed {
                program: "fake".to_string(),
                message: format!("input rejected by {window}"),
            });
        }
        state
            .inputs
            .extend(events.iter().map(|event| InjectedInput {
                window,
                session_id: session_id.clone(),
                event: *event,
            }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::sync::mpsc;

    use super::*;
    use crate::platform::LaunchId;

    fn launch(platform: &FakePlatform, session: &str) -> Box<dyn ProcessHandle> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let command = CommandLine {
            program: PathBuf::from("putty"),
            args: vec![session.to_string()],
        };
        platform
            .launch(
                &command,
                ExitNotifier::new(SessionId::from(session), LaunchId(1), tx),
            )
            .unwrap()
    }

    #[test]
    fn window_appears_after_configured_polls() {
        let platform = FakePlatform::new();
        platform.set_default_behavior(FakeBehavior {
            window_after_polls: 2,
            ..FakeBehavior::default()
        });
        let handle = launch(&platform, "a");
        let pid = handle.pid().unwrap();
        assert_eq!(platform.find_process_window(pid).unwrap(), None);
        assert_eq!(platform.find_process_window(pid).unwrap(), None);
        let window = platform.find_process_window(pid).unwrap().unwrap();
        assert_eq!(platform.find_process_window(pid).unwrap(), Some(window));
    }

    #[test]
    fn exit_session_invalidates_window() {
        let platform = FakePlatform::new();
        let handle = launch(&platform, "a");
        let window = platform
            .find_process_window(handle.pid().unwrap())
            .unwrap()
            .unwrap();

        assert!(platform.exit_session(&SessionId::from("a")));
        assert!(!handle.is_alive());
        assert!(matches!(
            platform.focus(window),
            Err(PlatformError::WindowGone(_))
        ));
        assert!(!platform.exit_session(&SessionId::from("a")));
    }

    #[test]
    fn input_is_recorded_per_session() {
        let platform = FakePlatform::new();
        let handle = launch(&platform, "a");
        let window = platform
            .find_process_window(handle.pid().unwrap())
            .unwrap()
            .unwrap();
        platform
            .send_input(
                window,
                &[
                    InputEvent::Char('l'),
                    InputEvent::Char('s'),
                    InputEvent::Key(InputKey::Enter),
                ],
            )
            .unwrap();
        assert_eq!(platform.text_sent_to(&SessionId::from("a")), "ls\n");
    }

    #[test]
    fn close_ends_process_unless_ignored() {
        let platform = FakePlatform::new();
        platform.set_session_behavior(
            &SessionId::from("stubborn"),
            FakeBehavior {
                ignore_close: true,
                ..FakeBehavior::default()
            },
        );
        let polite = launch(&platform, "polite");
        let stubborn = launch(&platform, "stubborn");
        for handle in [&polite, &stubborn] {
            let window = platform
                .find_process_window(handle.pid().unwrap())
                .unwrap()
                .unwrap();
            platform.close(window).unwrap();
        }
        assert!(!polite.is_alive());
        assert!(stubborn.is_alive());
    }
}
