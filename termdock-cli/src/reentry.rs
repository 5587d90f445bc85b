//! Single-instance re-entry
//!
//! A running workspace listens on a per-user Unix socket. Later `open`,
//! `connect` and `layout` invocations hand their request over as one JSON
//! line instead of starting a second workspace.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use termdock_core::models::{LayoutTarget, Protocol, SessionId};
use termdock_core::workspace::{QuickConnect, WorkspaceHandle, WorkspaceRequest};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use crate::error::CliError;

/// Overrides the socket location
pub const SOCKET_ENV: &str = "TERMDOCK_SOCKET";

/// Returns the re-entry socket path for the current user.
///
/// Uses `$XDG_RUNTIME_DIR/termdock.sock` if available, otherwise
/// `<tmp>/termdock-{user}.sock`.
#[must_use]
pub fn socket_path() -> PathBuf {
    if let Some(path) = std::env::var_os(SOCKET_ENV) {
        return PathBuf::from(path);
    }
    if let Some(runtime) = dirs::runtime_dir() {
        return runtime.join("termdock.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "default".to_string());
    std::env::temp_dir().join(format!("termdock-{user}.sock"))
}

/// Request sent by a second invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReentryRequest {
    /// Liveness probe
    Ping,
    /// Open a saved session
    Open {
        /// Resolved session id
        session_id: SessionId,
    },
    /// Quick connect; passwords are never sent
    Connect {
        /// Host, serial line or shell command
        host: String,
        /// Protocol
        protocol: Protocol,
        /// Port or serial speed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<u32>,
        /// Login name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        /// Saved terminal configuration
        #[serde(default, skip_serializing_if = "Option::is_none")]
        saved_config: Option<String>,
    },
    /// Switch layout
    Layout {
        /// Layout name, file, or `default`
        name: String,
    },
    /// Type a line into every terminal
    Broadcast {
        /// Text to send
        text: String,
    },
}

/// Reply to a [`ReentryRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReentryResponse {
    /// Reply to `ping`
    Pong,
    /// The request was queued on the workspace
    Accepted,
    /// The request could not be queued
    Error {
        /// What went wrong
        message: String,
    },
}

impl ReentryRequest {
    /// Converts into the workspace request it stands for
    fn into_workspace_request(self) -> Option<WorkspaceRequest> {
        match self {
            Self::Ping => None,
            Self::Open { session_id } => Some(WorkspaceRequest::OpenSession(session_id)),
            Self::Connect {
                host,
                protocol,
                port,
                username,
                saved_config,
            } => Some(WorkspaceRequest::QuickConnect(QuickConnect {
                host,
                protocol,
                port,
                username,
                password: None,
                saved_config,
            })),
            Self::Layout { name } => Some(WorkspaceRequest::SwitchLayout(LayoutTarget::parse(&name))),
            Self::Broadcast { text } => Some(WorkspaceRequest::Broadcast(text)),
        }
    }
}

/// Listener owned by the running workspace; removes its socket on drop
#[derive(Debug)]
pub struct ReentryServer {
    listener: UnixListener,
    path: PathBuf,
}

impl ReentryServer {
    /// Binds the socket
    ///
    /// A socket file left behind by a crashed workspace is removed.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Reentry` if another workspace already answers on
    /// the socket or binding fails.
    pub async fn bind(path: &Path) -> Result<Self, CliError> {
        if path.exists() {
            if UnixStream::connect(path).await.is_ok() {
                return Err(CliError::Reentry(format!(
                    "a workspace is already running on {}",
                    path.display()
                )));
            }
            debug!(socket = %path.display(), "Removing stale socket");
            std::fs::remove_file(path).map_err(|e| {
                CliError::Reentry(format!(
                    "Failed to remove stale socket {}: {e}",
                    path.display()
                ))
            })?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let listener = UnixListener::bind(path).map_err(|e| {
            CliError::Reentry(format!("Failed to bind {}: {e}", path.display()))
        })?;
        info!(socket = %path.display(), "Re-entry socket listening");
        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    /// Socket path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accepts clients until the workspace stops
    pub async fn serve(self, handle: WorkspaceHandle) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    let handle = handle.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, &handle).await {
                            warn!(error = %e, "Re-entry connection error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Re-entry accept failed");
                    return;
                }
            }
            if handle.is_closed() {
                return;
            }
        }
    }
}

impl Drop for ReentryServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn handle_client(stream: UnixStream, handle: &WorkspaceHandle) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }

        let response = match serde_json::from_str::<ReentryRequest>(line.trim_end()) {
            Ok(ReentryRequest::Ping) => ReentryResponse::Pong,
            Ok(request) => {
                debug!(?request, "Re-entry request");
                match request.into_workspace_request().map(|request| handle.submit(request)) {
                    Some(true) => ReentryResponse::Accepted,
                    _ => ReentryResponse::Error {
                        message: "workspace is shutting down".to_string(),
                    },
                }
            }
            Err(e) => ReentryResponse::Error {
                message: format!("invalid request: {e}"),
            },
        };
        write_response(&mut write_half, &response).await?;
    }
}

async fn write_response<W>(writer: &mut W, response: &ReentryResponse) -> std::io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let mut payload = serde_json::to_string(response)
        .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
    payload.push('\n');
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await
}

/// Sends one request to a running workspace
///
/// Returns `None` when no workspace is listening.
///
/// # Errors
///
/// Returns `CliError::Reentry` if the workspace answered with garbage or the
/// connection broke mid-request.
pub async fn send(
    path: &Path,
    request: &ReentryRequest,
) -> Result<Option<ReentryResponse>, CliError> {
    let stream = match UnixStream::connect(path).await {
        Ok(stream) => stream,
        Err(e) if is_not_running(&e) => return Ok(None),
        Err(e) => return Err(CliError::Reentry(format!("connect failed: {e}"))),
    };

    let (read_half, mut write_half) = stream.into_split();
    let mut payload = serde_json::to_string(request)
        .map_err(|e| CliError::Reentry(format!("Failed to encode request: {e}")))?;
    payload.push('\n');
    write_half.write_all(payload.as_bytes()).await?;
    write_half.flush().await?;

    let mut line = String::new();
    BufReader::new(read_half).read_line(&mut line).await?;
    if line.is_empty() {
        return Err(CliError::Reentry("workspace closed the connection".to_string()));
    }
    serde_json::from_str(line.trim_end())
        .map(Some)
        .map_err(|e| CliError::Reentry(format!("invalid response: {e}")))
}

fn is_not_running(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::NotFound | ErrorKind::ConnectionRefused
    )
}

/// Hands a request to a running workspace
///
/// Returns `false` when none is running, so the caller starts one.
///
/// # Errors
///
/// Returns `CliError::Reentry` when the workspace rejects the request.
pub fn forward(request: &ReentryRequest) -> Result<bool, CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    match runtime.block_on(send(&socket_path(), request))? {
        None => Ok(false),
        Some(ReentryResponse::Error { message }) => Err(CliError::Reentry(message)),
        Some(_) => Ok(true),
    }
}
