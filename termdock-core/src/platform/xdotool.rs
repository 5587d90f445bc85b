//! X11 window system driven through the `xdotool` helper

use std::path::PathBuf;
use std::process::Command;

use super::{HostSurface, InputEvent, NativeWindow, SurfaceSize, WindowSystem};
use crate::error::{PlatformError, PlatformResult};

/// Default helper program name, looked up in `PATH`
pub const XDOTOOL_PROGRAM: &str = "xdotool";

/// [`WindowSystem`] for X11 desktops
///
/// Every call shells out to `xdotool`; calls are short and synchronous.
#[derive(Debug, Clone)]
pub struct XdotoolWindowSystem {
    program: PathBuf,
}

impl Default for XdotoolWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl XdotoolWindowSystem {
    /// Uses `xdotool` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(XDOTOOL_PROGRAM),
        }
    }

    /// Uses a specific helper binary
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the helper can be executed
    #[must_use]
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn run(&self, args: &[String]) -> PlatformResult<String> {
        let output = Command::new(&self.program).args(args).output()?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(PlatformError::CommandFailed {
                program: self.program.display().to_string(),
                message: format!(
                    "{} ({})",
                    String::from_utf8_lossy(&output.stderr).trim(),
                    output.status
                ),
            })
        }
    }

    fn run_on(&self, command: &str, window: NativeWindow, extra: &[String]) -> PlatformResult<()> {
        let mut args = vec![command.to_string(), window.as_raw().to_string()];
        args.extend_from_slice(extra);
        self.run(&args).map(|_| ())
    }
}

/// Parses `xdotool search` output: one decimal window id per line
fn parse_window_ids(stdout: &str) -> Vec<NativeWindow> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse::<u64>().ok())
        .map(NativeWindow::from_raw)
        .collect()
}

impl WindowSystem for XdotoolWindowSystem {
    fn find_process_window(&self, pid: u32) -> PlatformResult<Option<NativeWindow>> {
        let output = Command::new(&self.program)
            .args(["search", "--onlyvisible", "--pid", &pid.to_string()])
            .output()?;
        // search exits 1 when nothing matched yet
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_window_ids(&String::from_utf8_lossy(&output.stdout))
            .into_iter()
            .next())
    }

    fn reparent(&self, window: NativeWindow, surface: &HostSurface) -> PlatformResult<()> {
        if surface.id != 0 {
            self.run_on("windowreparent", window, &[surface.id.to_string()])?;
            self.run_on("windowmove", window, &["0".to_string(), "0".to_string()])?;
        }
        self.resize(window, surface.size)
    }

    fn release(&self, window: NativeWindow) -> PlatformResult<()> {
        self.run_on("windowunmap", window, &[])
    }

    fn resize(&self, window: NativeWindow, size: SurfaceSize) -> PlatformResult<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        self.run_on(
            "windowsize",
            window,
            &[size.width.to_string(), size.height.to_string()],
        )
    }

    fn focus(&self, window: NativeWindow) -> PlatformResult<()> {
        self.run_on("windowfocus", window, &[])
    }

    fn close(&self, window: NativeWindow) -> PlatformResult<()> {
        self.run_on("windowclose", window, &[])
    }

    fn send_input(&self, window: NativeWindow, events: &[InputEvent]) -> PlatformResult<()> {
        let target = window.as_raw().to_string();
        let mut pending = String::new();

        for event in events {
            match event {
                InputEvent::Char(c) => pending.push(*c),
                InputEvent::Key(key) => {
                    if !pending.is_empty() {
                        self.run(&[
                            "type".to_string(),
                            "--window".to_string(),
                            target.clone(),
                            "--".to_string(),
                            std::mem::take(&mut pending),
                        ])?;
                    }
                    self.run(&[
                        "key".to_string(),
                        "--window".to_string(),
                        target.clone(),
                        key.keysym().to_string(),
                    ])?;
                }
            }
        }
        if !pending.is_empty() {
            self.run(&[
                "type".to_string(),
                "--window".to_string(),
                target,
                "--".to_string(),
                pending,
            ])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_output() {
        let ids = parse_window_ids("62914571\n\n  62914572 \nnot-a-window\n");
        assert_eq!(
            ids,
            vec![
                NativeWindow::from_raw(62_914_571),
                NativeWindow::from_raw(62_914_572)
            ]
        );
        assert!(parse_window_ids("").is_empty());
    }

    #[test]
    fn missing_helper_reports_io_error() {
        let windows = XdotoolWindowSystem::with_program("/nonexistent/xdotool");
        assert!(!windows.is_available());
        assert!(matches!(
            windows.focus(NativeWindow::from_raw(1)),
            Err(PlatformError::Io(_))
        ));
    }

    #[test]
    fn zero_size_resize_is_skipped() {
        let windows = XdotoolWindowSystem::with_program("/nonexistent/xdotool");
        assert!(
            windows
                .resize(NativeWindow::from_raw(1), SurfaceSize::default())
                .is_ok()
        );
    }
}
