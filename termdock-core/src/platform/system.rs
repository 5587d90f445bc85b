//! Process launcher backed by `tokio::process`

use std::io;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::process::{Child, Command};

use super::{ExitNotifier, ProcessHandle, ProcessLauncher};
use crate::bridge::CommandLine;

/// How often the watcher checks for exit
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Spawns terminal processes on the host OS
///
/// Each child gets a watcher task that flips the handle's alive flag and
/// sends the exit notice. Must be used inside a tokio runtime. Children are
/// killed when the last reference to them is dropped, including when the
/// runtime shuts down with the watcher still pending.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    /// Creates a launcher
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn lock(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProcessLauncher for SystemLauncher {
    fn launch(
        &self,
        command: &CommandLine,
        exits: ExitNotifier,
    ) -> io::Result<Box<dyn ProcessHandle>> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child.id();
        let child = Arc::new(Mutex::new(child));
        let alive = Arc::new(AtomicBool::new(true));

        let watched = Arc::clone(&child);
        let watcher_alive = Arc::clone(&alive);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(EXIT_POLL_INTERVAL);
            loop {
                tick.tick().await;
                let status = lock(&watched).try_wait();
                match status {
                    Ok(None) => continue,
                    Ok(Some(status)) => tracing::debug!(
                        session_id = %exits.session_id(),
                        ?pid,
                        %status,
                        "Terminal process exited"
                    ),
                    Err(e) => tracing::warn!(
                        session_id = %exits.session_id(),
                        error = %e,
                        "Failed to wait on terminal process"
                    ),
                }
                break;
            }
            watcher_alive.store(false, Ordering::SeqCst);
            exits.notify();
        });

        Ok(Box::new(SystemProcess { pid, alive, child }))
    }
}

/// Handle to a child spawned by [`SystemLauncher`]
struct SystemProcess {
    pid: Option<u32>,
    alive: Arc<AtomicBool>,
    child: Arc<Mutex<Child>>,
}

impl ProcessHandle for SystemProcess {
    fn pid(&self) -> Option<u32> {
        self.is_alive().then_some(self.pid).flatten()
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn kill(&mut self) -> io::Result<()> {
        if !self.is_alive() {
            return Ok(());
        }
        let mut child = lock(&self.child);
        // Already reaped by the watcher
        if child.id().is_none() {
            return Ok(());
        }
        child.start_kill()?;
        tracing::debug!(pid = ?self.pid, "Terminal process killed");
        Ok(())
    }
}
