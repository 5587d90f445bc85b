//! Line-oriented console for a hosted workspace
//!
//! Stands in for the menus and toolbar: each stdin line becomes one
//! workspace request.

use std::path::PathBuf;

use termdock_core::models::{LayoutTarget, Protocol, SessionId};
use termdock_core::tracing::LogBuffer;
use termdock_core::workspace::{QuickConnect, WorkspaceHandle, WorkspaceRequest};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::util::qualify_session_id;

/// Log lines printed by `logs` without a count
const DEFAULT_LOG_TAIL: usize = 20;

const HELP: &str = "\
Commands:
  open <session>                 open a saved session (label or id)
  connect [protocol] <host> [user]  quick-connect
  layout <name|default>          switch layout
  save                           save the current layout
  save-as <name|path>            save the current layout under a new name
  broadcast <text>               type a line into every terminal
  panels                         list panels
  focus <n>                      activate panel n
  close <n>                      close panel n
  logs [n]                       show the log viewer and print recent lines
  help                           this text
  quit                           close the workspace";

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Open a saved session
    Open(SessionId),
    /// Quick connect
    Connect {
        /// Protocol
        protocol: Protocol,
        /// Host
        host: String,
        /// Login name
        user: Option<String>,
    },
    /// Switch layout
    Layout(LayoutTarget),
    /// Save to the current layout file
    Save,
    /// Save under a new name or path
    SaveAs(PathBuf),
    /// Broadcast a line
    Broadcast(String),
    /// Activate the n-th panel (1-based)
    Focus(usize),
    /// Close the n-th panel (1-based)
    Close(usize),
    /// List panels
    Panels,
    /// Show recent log lines
    Logs(usize),
    /// Print help
    Help,
    /// Close the workspace
    Quit,
}

/// Parses one console line; blank lines and `#` comments yield `None`
///
/// # Errors
///
/// Returns a usage message for unknown commands or missing arguments.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim_start();
    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    let rest_trimmed = rest.trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.to_lowercase().as_str() {
        "open" => match args.as_slice() {
            [session] => ConsoleCommand::Open(qualify_session_id(session)),
            _ => return Err("usage: open <session>".to_string()),
        },
        "connect" => parse_connect(&args)?,
        "layout" => ConsoleCommand::Layout(LayoutTarget::parse(rest_trimmed)),
        "save" => ConsoleCommand::Save,
        "save-as" | "saveas" => {
            if rest_trimmed.is_empty() {
                return Err("usage: save-as <name|path>".to_string());
            }
            ConsoleCommand::SaveAs(PathBuf::from(rest_trimmed))
        }
        "broadcast" | "bc" => ConsoleCommand::Broadcast(rest.trim_end_matches('\r').to_string()),
        "focus" => ConsoleCommand::Focus(parse_index(&args, "focus")?),
        "close" => ConsoleCommand::Close(parse_index(&args, "close")?),
        "panels" | "ls" => ConsoleCommand::Panels,
        "logs" => match args.as_slice() {
            [] => ConsoleCommand::Logs(DEFAULT_LOG_TAIL),
            [n] => ConsoleCommand::Logs(n.parse().map_err(|_| "usage: logs [n]".to_string())?),
            _ => return Err("usage: logs [n]".to_string()),
        },
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn parse_connect(args: &[&str]) -> Result<ConsoleCommand, String> {
    let usage = || "usage: connect [protocol] <host> [user]".to_string();
    let (protocol, rest) = match args {
        [first, rest @ ..] if !rest.is_empty() => match first.parse::<Protocol>() {
            Ok(protocol) => (protocol, rest),
            Err(_) => (Protocol::default(), args),
        },
        _ => (Protocol::default(), args),
    };
    match rest {
        [host] => Ok(ConsoleCommand::Connect {
            protocol,
            host: (*host).to_string(),
            user: None,
        }),
        [host, user] => Ok(ConsoleCommand::Connect {
            protocol,
            host: (*host).to_string(),
            user: Some((*user).to_string()),
        }),
        _ => Err(usage()),
    }
}

fn parse_index(args: &[&str], name: &str) -> Result<usize, String> {
    match args {
        [n] => match n.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("usage: {name} <n> (panel number from 'panels')")),
        },
        _ => Err(format!("usage: {name} <n>")),
    }
}

/// Reads commands from stdin until `quit` or end of input, then asks the
/// workspace to shut down
pub async fn run_console(handle: WorkspaceHandle, logs: LogBuffer) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Console read failed");
                break;
            }
        };
        match parse_command(&line) {
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => {
                if !execute(&handle, &logs, command).await {
                    return;
                }
            }
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }
    handle.shutdown();
}

/// Runs one command; returns `false` once the workspace is gone
async fn execute(handle: &WorkspaceHandle, logs: &LogBuffer, command: ConsoleCommand) -> bool {
    match command {
        ConsoleCommand::Open(session_id) => handle.open_session(session_id),
        ConsoleCommand::Connect {
            protocol,
            host,
            user,
        } => {
            let mut request = QuickConnect::new(host, protocol);
            if let Some(user) = user {
                request = request.with_username(user);
            }
            handle.submit(WorkspaceRequest::QuickConnect(request))
        }
        ConsoleCommand::Layout(target) => handle.switch_layout(target),
        ConsoleCommand::Save => handle.submit(WorkspaceRequest::SaveLayout),
        ConsoleCommand::SaveAs(path) => handle.submit(WorkspaceRequest::SaveLayoutAs(path)),
        ConsoleCommand::Broadcast(text) => handle.broadcast(text),
        ConsoleCommand::Focus(n) => panel_request(handle, n, false).await,
        ConsoleCommand::Close(n) => panel_request(handle, n, true).await,
        ConsoleCommand::Panels => {
            let Some(summary) = handle.describe().await else {
                return false;
            };
            println!(
                "Layout: {}",
                summary.layout.as_deref().unwrap_or("default")
            );
            for (i, panel) in summary.panels.iter().enumerate() {
                let marker = if panel.active { '*' } else { ' ' };
                let state = if panel.alive { "" } else { " (exited)" };
                println!("{marker}{:>3}  {}{state}", i + 1, panel.title);
            }
            true
        }
        ConsoleCommand::Logs(n) => {
            for line in logs.tail(n) {
                println!("{line}");
            }
            handle.submit(WorkspaceRequest::ShowLogViewer)
        }
        ConsoleCommand::Help => {
            println!("{HELP}");
            true
        }
        ConsoleCommand::Quit => handle.shutdown(),
    }
}

/// Activates or closes the n-th panel of the current listing
async fn panel_request(handle: &WorkspaceHandle, n: usize, close: bool) -> bool {
    let Some(summary) = handle.describe().await else {
        return false;
    };
    match summary.panels.get(n - 1) {
        Some(panel) if close => handle.submit(WorkspaceRequest::ClosePanel(panel.id)),
        Some(panel) => handle.submit(WorkspaceRequest::ActivatePanel(panel.id)),
        None => {
            eprintln!("no panel {n} ({} open)", summary.panels.len());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ConsoleCommand {
        parse_command(line).unwrap().unwrap()
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("# morning routine"), Ok(None));
    }

    #[test]
    fn open_qualifies_bare_labels() {
        assert_eq!(parse("open web"), ConsoleCommand::Open(SessionId::from("tree/web")));
        assert_eq!(
            parse("open ConnectBar/db"),
            ConsoleCommand::Open(SessionId::from("ConnectBar/db"))
        );
        assert!(parse_command("open").is_err());
    }

    #[test]
    fn connect_protocol_is_optional() {
        assert_eq!(
            parse("connect db.local"),
            ConsoleCommand::Connect {
                protocol: Protocol::Ssh,
                host: "db.local".to_string(),
                user: None,
            }
        );
        assert_eq!(
            parse("connect telnet 10.0.0.5 ops"),
            ConsoleCommand::Connect {
                protocol: Protocol::Telnet,
                host: "10.0.0.5".to_string(),
                user: Some("ops".to_string()),
            }
        );
        assert_eq!(
            parse("connect router admin"),
            ConsoleCommand::Connect {
                protocol: Protocol::Ssh,
                host: "router".to_string(),
                user: Some("admin".to_string()),
            }
        );
    }

    #[test]
    fn broadcast_keeps_inner_spacing() {
        assert_eq!(
            parse("broadcast ls  -la /tmp"),
            ConsoleCommand::Broadcast("ls  -la /tmp".to_string())
        );
        assert_eq!(parse("broadcast"), ConsoleCommand::Broadcast(String::new()));
    }

    #[test]
    fn layout_and_save_targets() {
        assert_eq!(parse("layout default"), ConsoleCommand::Layout(LayoutTarget::Default));
        assert_eq!(
            parse("layout morning"),
            ConsoleCommand::Layout(LayoutTarget::Named("morning".to_string()))
        );
        assert_eq!(parse("save-as evening"), ConsoleCommand::SaveAs(PathBuf::from("evening")));
        assert!(parse_command("save-as").is_err());
    }

    #[test]
    fn panel_indices_are_one_based() {
        assert_eq!(parse("focus 2"), ConsoleCommand::Focus(2));
        assert!(parse_command("close 0").is_err());
        assert!(parse_command("focus two").is_err());
        assert_eq!(parse("logs"), ConsoleCommand::Logs(DEFAULT_LOG_TAIL));
        assert_eq!(parse("logs 5"), ConsoleCommand::Logs(5));
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(parse_command("reboot").unwrap_err().contains("unknown command"));
    }
}
