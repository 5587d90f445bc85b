//! Layout data: panel kinds, their persist tokens, and saved arrangements.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionId;

/// Persist token of the session tree tool panel
pub const SESSION_TREE_TOKEN: &str = "termdock.SessionTree";
/// Persist token of the layout list tool panel
pub const LAYOUT_LIST_TOKEN: &str = "termdock.LayoutList";
/// Persist token of the log viewer tool panel
pub const LOG_VIEWER_TOKEN: &str = "termdock.LogViewer";
/// Prefix of terminal panel persist tokens; the session id follows
pub const TERMINAL_TOKEN_PREFIX: &str = "termdock.Terminal?SessionId=";

/// What a docked panel shows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PanelKind {
    /// Saved sessions tree (fixed, no close button)
    SessionTree,
    /// Saved layouts list (fixed, no close button)
    LayoutList,
    /// Application log viewer (closable, created on demand)
    LogViewer,
    /// One embedded terminal session
    Terminal {
        /// Session shown in the panel
        session_id: SessionId,
    },
}

impl PanelKind {
    /// Token written to layout files for this panel
    #[must_use]
    pub fn persist_token(&self) -> String {
        match self {
            Self::SessionTree => SESSION_TREE_TOKEN.to_string(),
            Self::LayoutList => LAYOUT_LIST_TOKEN.to_string(),
            Self::LogViewer => LOG_VIEWER_TOKEN.to_string(),
            Self::Terminal { session_id } => format!("{TERMINAL_TOKEN_PREFIX}{session_id}"),
        }
    }

    /// Resolves a persist token back to a panel kind
    ///
    /// Returns `None` for tokens this workspace does not know.
    #[must_use]
    pub fn from_persist_token(token: &str) -> Option<Self> {
        match token {
            SESSION_TREE_TOKEN => Some(Self::SessionTree),
            LAYOUT_LIST_TOKEN => Some(Self::LayoutList),
            LOG_VIEWER_TOKEN => Some(Self::LogViewer),
            _ => token
                .strip_prefix(TERMINAL_TOKEN_PREFIX)
                .filter(|id| !id.is_empty())
                .map(|id| Self::Terminal {
                    session_id: SessionId::from(id),
                }),
        }
    }

    /// Whether the panel shows a close button
    ///
    /// Closable panels are destroyed on layout teardown; the others are
    /// detached and reused.
    #[must_use]
    pub const fn is_closable(&self) -> bool {
        matches!(self, Self::LogViewer | Self::Terminal { .. })
    }

    /// Session id for terminal panels
    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::Terminal { session_id } => Some(session_id),
            _ => None,
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionTree => write!(f, "Sessions"),
            Self::LayoutList => write!(f, "Layouts"),
            Self::LogViewer => write!(f, "Log Viewer"),
            Self::Terminal { session_id } => write!(f, "Terminal({session_id})"),
        }
    }
}

/// Dock area a panel is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockArea {
    /// Central document area (terminal tabs)
    #[default]
    Document,
    /// Left edge
    Left,
    /// Right edge
    Right,
    /// Top edge
    Top,
    /// Bottom edge
    Bottom,
}

/// Where a panel is placed in the dock
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DockPlacement {
    /// Dock area
    pub area: DockArea,
    /// When set, the panel is stacked below the previous panel of the same
    /// area, taking this fraction of its height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_ratio: Option<f64>,
}

impl DockPlacement {
    /// Placement in the document area
    #[must_use]
    pub const fn document() -> Self {
        Self {
            area: DockArea::Document,
            split_ratio: None,
        }
    }

    /// Placement on an edge
    #[must_use]
    pub const fn edge(area: DockArea) -> Self {
        Self {
            area,
            split_ratio: None,
        }
    }

    /// Placement stacked below the previous panel in `area`
    #[must_use]
    pub fn below(area: DockArea, ratio: f64) -> Self {
        Self {
            area,
            split_ratio: Some(ratio.clamp(0.1, 0.9)),
        }
    }
}

/// One saved panel: its persist token and placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelPlacement {
    /// Persist token identifying the panel kind
    pub token: String,
    /// Where the panel was docked
    #[serde(flatten)]
    pub placement: DockPlacement,
}

impl PanelPlacement {
    /// Creates a record for a panel kind
    #[must_use]
    pub fn new(kind: &PanelKind, placement: DockPlacement) -> Self {
        Self {
            token: kind.persist_token(),
            placement,
        }
    }

    /// Resolves the token to a panel kind
    #[must_use]
    pub fn kind(&self) -> Option<PanelKind> {
        PanelKind::from_persist_token(&self.token)
    }
}

/// A named, saved arrangement of docked panels
///
/// Read-only once loaded; saving writes a new descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDescriptor {
    /// Layout name (file stem)
    pub name: String,
    /// File the layout lives in
    pub path: PathBuf,
    /// Panels in dock order
    pub panels: Vec<PanelPlacement>,
    /// When the layout was written
    pub saved_at: Option<DateTime<Utc>>,
}

impl LayoutDescriptor {
    /// Creates an empty layout for a file path; the name is the file stem
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        Self {
            name: layout_name_for_path(path),
            path: path.to_path_buf(),
            panels: Vec::new(),
            saved_at: None,
        }
    }

    /// Session ids referenced by terminal panels, in dock order
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.panels
            .iter()
            .filter_map(|p| p.kind())
            .filter_map(|k| k.session_id().cloned())
            .collect()
    }
}

/// Layout name derived from a file path
#[must_use]
pub fn layout_name_for_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Layout switch target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTarget {
    /// The hard-coded default arrangement
    Default,
    /// A saved layout from the catalog, by name
    Named(String),
    /// A layout file, by path
    File(PathBuf),
}

impl LayoutTarget {
    /// Parses console input: `default` or a layout name
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case("default") {
            Self::Default
        } else if input.ends_with(".xml") || input.contains(std::path::MAIN_SEPARATOR) {
            Self::File(PathBuf::from(input))
        } else {
            Self::Named(input.to_string())
        }
    }
}

impl fmt::Display for LayoutTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Named(name) => write!(f, "{name}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}
