//! Terminal command lines
//!
//! Builds the PuTTY-compatible argument vector for a session and resolves the
//! configured terminal executable on disk.

use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;

use crate::models::{Protocol, SessionDescriptor};

/// Serial line settings appended after the speed: 8 data bits, no parity,
/// one stop bit, no flow control
const SERIAL_LINE_SETTINGS: &str = "8,n,1,N";

/// Placeholder written to logs instead of a password
const REDACTED: &str = "****";

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Executable to run
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
}

impl CommandLine {
    /// Arguments with the value following `-pw` masked
    #[must_use]
    pub fn redacted_args(&self) -> Vec<String> {
        let mut masked = Vec::with_capacity(self.args.len());
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                masked.push(REDACTED.to_string());
                mask_next = false;
            } else {
                mask_next = arg == "-pw";
                masked.push(arg.clone());
            }
        }
        masked
    }
}

/// Displays the redacted form; safe for logs and status text
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in self.redacted_args() {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Builds the terminal command line for a session
#[must_use]
pub fn build_command_line(program: &Path, descriptor: &SessionDescriptor) -> CommandLine {
    let mut args = Vec::new();

    if let Some(ref saved) = descriptor.saved_config {
        args.push("-load".to_string());
        args.push(saved.clone());
    }

    match descriptor.protocol {
        Protocol::Serial => {
            args.push("-serial".to_string());
            args.push(descriptor.host.clone());
            args.push("-sercfg".to_string());
            args.push(format!("{},{SERIAL_LINE_SETTINGS}", descriptor.port));
        }
        Protocol::LocalShell => {
            args.push("-cygterm".to_string());
            let command = descriptor.host.trim();
            if command.is_empty() || command.eq_ignore_ascii_case("localhost") {
                args.push("-".to_string());
            } else {
                args.push(command.to_string());
            }
        }
        Protocol::Ssh | Protocol::Telnet | Protocol::Rlogin | Protocol::Raw => {
            args.push(format!("-{}", descriptor.protocol.as_str()));
            if descriptor.port != 0 {
                args.push("-P".to_string());
                args.push(descriptor.port.to_string());
            }
            if let Some(ref user) = descriptor.credentials.username {
                if !user.is_empty() {
                    args.push("-l".to_string());
                    args.push(user.clone());
                }
            }
            if descriptor.protocol == Protocol::Ssh {
                if let Some(ref password) = descriptor.credentials.password {
                    args.push("-pw".to_string());
                    args.push(password.expose_secret().to_string());
                }
            }
            args.push(descriptor.host.clone());
        }
    }

    CommandLine {
        program: program.to_path_buf(),
        args,
    }
}

/// Resolves the terminal executable
///
/// `~` is expanded. Paths with a directory component must point to an
/// existing file; bare names are searched in `PATH`.
#[must_use]
pub fn resolve_executable(configured: &Path) -> Option<PathBuf> {
    let raw = configured.to_string_lossy();
    if raw.trim().is_empty() {
        return None;
    }
    let expanded = PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref());

    if expanded.components().count() > 1 || expanded.is_absolute() {
        return expanded.is_file().then_some(expanded);
    }

    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(&expanded))
            .find(|candidate| candidate.is_file())
    })
}
