//! XML layout files
//!
//! ```xml
//! <layout version="1" saved_at="2026-10-19T08:00:00Z">
//!   <panel token="termdock.SessionTree" area="right"/>
//!   <panel token="termdock.LayoutList" area="right" split="0.5"/>
//!   <panel token="termdock.Terminal?SessionId=tree/web" area="document"/>
//! </layout>
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LayoutStore;
use crate::error::{LayoutError, LayoutResult};
use crate::models::{DockArea, DockPlacement, LayoutDescriptor, PanelPlacement};

/// Current file format version
const LAYOUT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "layout")]
struct LayoutFile {
    #[serde(rename = "@version", default = "default_version")]
    version: u32,
    #[serde(
        rename = "@saved_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    saved_at: Option<DateTime<Utc>>,
    #[serde(rename = "panel", default)]
    panels: Vec<PanelRecord>,
}

const fn default_version() -> u32 {
    LAYOUT_FORMAT_VERSION
}

#[derive(Debug, Serialize, Deserialize)]
struct PanelRecord {
    #[serde(rename = "@token")]
    token: String,
    #[serde(rename = "@area", default)]
    area: DockArea,
    #[serde(rename = "@split", default, skip_serializing_if = "Option::is_none")]
    split: Option<f64>,
}

impl From<&PanelPlacement> for PanelRecord {
    fn from(panel: &PanelPlacement) -> Self {
        Self {
            token: panel.token.clone(),
            area: panel.placement.area,
            split: panel.placement.split_ratio,
        }
    }
}

impl From<PanelRecord> for PanelPlacement {
    fn from(record: PanelRecord) -> Self {
        Self {
            token: record.token,
            placement: DockPlacement {
                area: record.area,
                split_ratio: record.split.map(|r| r.clamp(0.1, 0.9)),
            },
        }
    }
}

/// Reads and writes layouts as XML files
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlLayoutStore;

impl XmlLayoutStore {
    /// Creates a store
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Serializes a layout to an XML string
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Serialize` if serialization fails.
    pub fn to_xml(layout: &LayoutDescriptor) -> LayoutResult<String> {
        let file = LayoutFile {
            version: LAYOUT_FORMAT_VERSION,
            saved_at: layout.saved_at,
            panels: layout.panels.iter().map(PanelRecord::from).collect(),
        };
        quick_xml::se::to_string(&file).map_err(|e| LayoutError::Serialize(e.to_string()))
    }

    /// Parses a layout from XML; `path` names the layout
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Parse` for malformed input.
    pub fn from_xml(xml: &str, path: &Path) -> LayoutResult<LayoutDescriptor> {
        let file: LayoutFile = quick_xml::de::from_str(xml).map_err(|e| LayoutError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if file.version > LAYOUT_FORMAT_VERSION {
            tracing::warn!(
                path = %path.display(),
                version = file.version,
                "Layout written by a newer version, reading what is understood"
            );
        }

        let mut layout = LayoutDescriptor::for_path(path);
        layout.saved_at = file.saved_at;
        layout.panels = file.panels.into_iter().map(PanelPlacement::from).collect();
        Ok(layout)
    }
}

impl LayoutStore for XmlLayoutStore {
    fn load(&self, path: &Path) -> LayoutResult<LayoutDescriptor> {
        let xml = fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml(&xml, path)
    }

    fn save(&self, path: &Path, layout: &LayoutDescriptor) -> LayoutResult<()> {
        let xml = Self::to_xml(layout)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LayoutError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = path.with_extension("xml.tmp");
        fs::write(&tmp, xml)
            .and_then(|()| fs::rename(&tmp, path))
            .map_err(|source| LayoutError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}
