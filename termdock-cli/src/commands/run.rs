//! Hosting a workspace: the `run`, `open` and `connect` entry points.

use std::path::Path;
use std::rc::Rc;

use termdock_core::config::{ConfigManager, WorkspaceSettings};
use termdock_core::dock::VirtualDock;
use termdock_core::models::{LayoutTarget, SessionId};
use termdock_core::platform::{FakePlatform, SystemLauncher, XdotoolWindowSystem};
use termdock_core::registry::SessionRegistry;
use termdock_core::tracing::LogBuffer;
use termdock_core::workspace::{Orchestrator, QuickConnect, StartupOptions, StatusEvent};

use crate::cli::HostArgs;
use crate::console::run_console;
use crate::error::CliError;
use crate::reentry::{ReentryServer, socket_path};
use crate::util::{create_config_manager, load_registry};

/// What the hosted workspace shows first
#[derive(Debug, Default)]
pub struct Startup {
    /// Layout name or file; the configured starting layout when unset
    pub layout: Option<String>,
    /// Session to open on the default layout
    pub session: Option<SessionId>,
    /// Quick connect run once the first layout is up
    pub quick_connect: Option<QuickConnect>,
}

/// Loaded configuration for a hosted workspace
struct Host {
    manager: ConfigManager,
    settings: WorkspaceSettings,
    registry: SessionRegistry,
}

impl Host {
    fn load(config_path: Option<&Path>, quiet: bool) -> Result<Self, CliError> {
        let manager = create_config_manager(config_path)?;
        let settings = manager.load_settings()?;
        manager.ensure_dirs(&settings)?;
        let registry = load_registry(&manager, quiet)?;
        Ok(Self {
            manager,
            settings,
            registry,
        })
    }
}

/// `run` command handler
pub fn cmd_run(
    config_path: Option<&Path>,
    layout: Option<String>,
    session: Option<&str>,
    host_args: &HostArgs,
    quiet: bool,
    logs: LogBuffer,
) -> Result<(), CliError> {
    let host = Host::load(config_path, quiet)?;
    let session = session
        .map(|name| crate::util::find_session(&host.registry, name).map(|s| s.id.clone()))
        .transpose()?;
    let startup = Startup {
        layout,
        session,
        quick_connect: None,
    };
    host_workspace(host, startup, host_args, quiet, logs)
}

/// Hosts a workspace in the current process until it shuts down
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the window system is
/// unavailable, or another workspace already owns the re-entry socket.
pub fn host_prepared(
    config_path: Option<&Path>,
    startup: Startup,
    host_args: &HostArgs,
    quiet: bool,
    logs: LogBuffer,
) -> Result<(), CliError> {
    let host = Host::load(config_path, quiet)?;
    host_workspace(host, startup, host_args, quiet, logs)
}

fn host_workspace(
    host: Host,
    startup: Startup,
    host_args: &HostArgs,
    quiet: bool,
    logs: LogBuffer,
) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_workspace(host, startup, host_args, quiet, logs));
    // The console may still be parked on a blocking stdin read
    runtime.shutdown_background();
    result
}

async fn run_workspace(
    host: Host,
    startup: Startup,
    host_args: &HostArgs,
    quiet: bool,
    logs: LogBuffer,
) -> Result<(), CliError> {
    let Host {
        manager,
        settings,
        registry,
    } = host;
    let layouts_dir = manager.layouts_dir(&settings);

    let workspace = if host_args.fake {
        let platform = FakePlatform::new();
        Orchestrator::new(
            VirtualDock::new(),
            Box::new(platform.clone()),
            Rc::new(platform),
            std::env::current_exe()?,
            layouts_dir,
        )
    } else {
        let windows = XdotoolWindowSystem::new();
        if !windows.is_available() {
            return Err(CliError::Platform(
                "xdotool not found in PATH (install it, or use --fake)".to_string(),
            ));
        }
        Orchestrator::new(
            VirtualDock::headless(),
            Box::new(SystemLauncher::new()),
            Rc::new(windows),
            settings.terminal.executable.clone(),
            layouts_dir,
        )
    };
    let mut workspace = workspace
        .with_settings(&settings)
        .with_registry(registry)
        .with_log_buffer(logs.clone());
    if !quiet {
        workspace = workspace.with_observer(|event: &StatusEvent| println!("{event}"));
    }

    workspace
        .open()
        .map_err(|e| CliError::Layout(e.to_string()))?;

    let server = ReentryServer::bind(&socket_path()).await?;
    let handle = workspace.handle();
    tokio::spawn(server.serve(handle.clone()));
    if !host_args.no_console {
        tokio::spawn(run_console(handle.clone(), logs));
    }
    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, closing workspace");
            interrupt.shutdown();
        }
    });

    let options = match startup.session {
        Some(session_id) => StartupOptions {
            starting_session: Some(session_id),
            starting_layout: None,
        },
        None => StartupOptions {
            starting_session: None,
            starting_layout: startup
                .layout
                .or(settings.layouts.starting_layout)
                .as_deref()
                .map(LayoutTarget::parse),
        },
    };
    workspace.startup(options).await;
    if let Some(request) = startup.quick_connect {
        if let Err(e) = workspace.quick_connect(request).await {
            tracing::warn!(error = %e, "Quick connect at startup failed");
        }
    }

    workspace.run().await;
    tracing::info!("Workspace stopped");
    Ok(())
}
