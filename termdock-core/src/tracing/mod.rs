//! Structured logging setup
//!
//! One subscriber per process: an [`EnvFilter`] scoped to the termdock
//! crates, an optional formatted sink (stdout, stderr or an append-only
//! file) and an optional [`LogBuffer`] that keeps recent events for the log
//! viewer panel.

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Default number of lines kept for the log viewer
pub const DEFAULT_LOG_BUFFER_LINES: usize = 1000;

/// Crates whose events pass the level filter
const LOGGED_CRATES: [&str; 2] = ["termdock_core", "termdock_cli"];

/// Logging setup failures
#[derive(Debug, Error)]
pub enum TracingError {
    /// A subscriber is already installed
    #[error("Logging is already initialized")]
    AlreadyInitialized,

    /// The filter directive does not parse
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// Directive as given
        filter: String,
        /// Parser message
        message: String,
    },

    /// The log file cannot be opened
    #[error("Cannot open log file {path}: {source}")]
    LogFile {
        /// Log file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Installing the subscriber failed
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Result type for logging setup
pub type TracingResult<T> = Result<T, TracingError>;

/// Verbosity, from least to most chatty
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TracingLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Status changes
    #[default]
    Info,
    /// Launch and layout details
    Debug,
    /// Everything, including window polls
    Trace,
}

impl FromStr for TracingLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        })
    }
}

/// Where formatted log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard output
    Stdout,
    /// Standard error
    #[default]
    Stderr,
    /// Appended to a file
    File {
        /// Log file; parent directories are created
        path: PathBuf,
    },
    /// Nowhere; only the [`LogBuffer`] sees events
    BufferOnly,
}

impl TracingOutput {
    /// Writer for the fmt layer and whether it gets ANSI colours
    fn writer(&self) -> TracingResult<Option<(BoxMakeWriter, bool)>> {
        let writer = match self {
            Self::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
            Self::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
            Self::File { path } => {
                let open = || {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    OpenOptions::new().create(true).append(true).open(path)
                };
                let file = open().map_err(|source| TracingError::LogFile {
                    path: path.clone(),
                    source,
                })?;
                (BoxMakeWriter::new(Mutex::new(file)), false)
            }
            Self::BufferOnly => return Ok(None),
        };
        Ok(Some(writer))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Level for the termdock crates
    pub level: TracingLevel,
    /// Formatted sink
    pub output: TracingOutput,
    /// Include thread ids in formatted lines
    pub thread_ids: bool,
    /// Full `EnvFilter` directive; replaces `level` when set
    pub filter: Option<String>,
    /// Log viewer buffer
    pub buffer: Option<LogBuffer>,
}

impl TracingConfig {
    /// Info level to stderr
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level
    #[must_use]
    pub fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the formatted sink
    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Includes thread ids
    #[must_use]
    pub fn with_thread_ids(mut self, include: bool) -> Self {
        self.thread_ids = include;
        self
    }

    /// Uses a full filter directive instead of the level
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Copies events into a log viewer buffer
    #[must_use]
    pub fn with_buffer(mut self, buffer: LogBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    fn env_filter(&self) -> TracingResult<EnvFilter> {
        let directive = self.filter.clone().unwrap_or_else(|| {
            LOGGED_CRATES
                .iter()
                .map(|krate| format!("{krate}={}", self.level))
                .collect::<Vec<_>>()
                .join(",")
        });
        EnvFilter::try_new(&directive).map_err(|e| TracingError::InvalidFilter {
            filter: directive,
            message: e.to_string(),
        })
    }
}

/// One captured log event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// When the event was recorded
    pub timestamp: DateTime<Local>,
    /// Event level
    pub level: Level,
    /// Event target (module path)
    pub target: String,
    /// Message followed by `key=value` fields
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>5} {}: {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level,
            self.target,
            self.message
        )
    }
}

/// Bounded ring of recent log lines, shared between threads
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<LogLine>>>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_BUFFER_LINES)
    }
}

impl LogBuffer {
    /// Creates a buffer keeping at most `capacity` lines
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity: capacity.max(1),
        }
    }

    /// Appends a line, dropping the oldest when full
    pub fn push(&self, line: LogLine) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == self.capacity {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    /// Copy of the buffered lines, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogLine> {
        self.tail(usize::MAX)
    }

    /// The last `n` lines, oldest first
    #[must_use]
    pub fn tail(&self, n: usize) -> Vec<LogLine> {
        self.lines
            .lock()
            .map(|lines| {
                let skip = lines.len().saturating_sub(n);
                lines.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Number of buffered lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    /// Whether the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscriber layer feeding this buffer
    #[must_use]
    pub fn layer(&self) -> LogBufferLayer {
        LogBufferLayer {
            buffer: self.clone(),
        }
    }
}

/// `tracing_subscriber` layer that records events into a [`LogBuffer`]
#[derive(Debug, Clone)]
pub struct LogBufferLayer {
    buffer: LogBuffer,
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        visitor.message.push_str(&visitor.fields);
        self.buffer.push(LogLine {
            timestamp: Local::now(),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
        });
    }
}

/// Installs the global subscriber
///
/// # Errors
///
/// Returns `TracingError::AlreadyInitialized` on a second call, or an error
/// for a bad filter, an unwritable log file, or a subscriber installed by
/// someone else.
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let fmt_layer = config.output.writer()?.map(|(writer, ansi)| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(config.thread_ids)
            .with_ansi(ansi)
            .with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(config.buffer.as_ref().map(LogBuffer::layer))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::Install(e.to_string()))?;

    tracing::debug!(level = %config.level, output = ?config.output, "Logging initialized");
    Ok(())
}

/// Whether [`init_tracing`] has run
#[must_use]
pub fn is_tracing_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::SeqCst)
}

/// Span names used across the workspace
pub mod span_names {
    /// Layout switch, teardown through rebuild
    pub const LAYOUT_TRANSITION: &str = "layout.transition";
    /// Writing a layout file
    pub const LAYOUT_SAVE: &str = "layout.save";
    /// Launching one terminal and waiting for its window
    pub const SESSION_LAUNCH: &str = "session.launch";
    /// Typing a line into every terminal
    pub const BROADCAST: &str = "broadcast.send";
    /// Reading a config file
    pub const CONFIG_LOAD: &str = "config.load";
}
