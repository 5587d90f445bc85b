//! Layout persistence and switching
//!
//! A [`LayoutStore`] reads and writes layout files, the [`LayoutCatalog`]
//! tracks the saved layouts in the layouts directory, and the
//! [`transition`] module holds the switch state machine and the token
//! resolver used when restoring.

pub mod transition;
mod xml;

pub use transition::{RestoreStep, TransitionController, TransitionState, resolve_layout};
pub use xml::XmlLayoutStore;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LayoutError, LayoutResult};
use crate::models::{LayoutDescriptor, layout_name_for_path};

/// File extension of layout files
pub const LAYOUT_EXTENSION: &str = "xml";

/// Reads and writes layout files
pub trait LayoutStore {
    /// Loads the layout stored at `path`
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Io` if the file cannot be read or
    /// `LayoutError::Parse` if it is malformed.
    fn load(&self, path: &Path) -> LayoutResult<LayoutDescriptor>;

    /// Writes `layout` to `path`, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Io` or `LayoutError::Serialize` on failure.
    fn save(&self, path: &Path, layout: &LayoutDescriptor) -> LayoutResult<()>;
}

/// A saved layout known to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    /// Layout name (file stem)
    pub name: String,
    /// Layout file
    pub path: PathBuf,
}

impl LayoutEntry {
    /// Entry for a layout file
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        Self {
            name: layout_name_for_path(path),
            path: path.to_path_buf(),
        }
    }
}

/// Saved layouts in the layouts directory
#[derive(Debug, Clone)]
pub struct LayoutCatalog {
    dir: PathBuf,
    entries: Vec<LayoutEntry>,
}

impl LayoutCatalog {
    /// Creates an empty catalog for a directory; call [`Self::scan`] to fill it
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: Vec::new(),
        }
    }

    /// Layouts directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Re-reads the directory; a missing directory yields an empty catalog
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Io` if the directory exists but cannot be read.
    pub fn scan(&mut self) -> LayoutResult<usize> {
        self.entries.clear();
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "Layouts directory does not exist");
            return Ok(0);
        }

        let read_dir = fs::read_dir(&self.dir).map_err(|source| LayoutError::Io {
            path: self.dir.clone(),
            source,
        })?;
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(LAYOUT_EXTENSION))
            {
                self.entries.push(LayoutEntry::for_path(&path));
            }
        }
        self.sort();

        tracing::debug!(dir = %self.dir.display(), count = self.entries.len(), "Scanned layouts");
        Ok(self.entries.len())
    }

    /// Adds (or replaces, by path) a layout after it was saved
    pub fn add_layout(&mut self, path: &Path) -> &LayoutEntry {
        let entry = LayoutEntry::for_path(path);
        self.entries.retain(|e| e.path != entry.path);
        self.entries.push(entry);
        self.sort();
        let index = self
            .entries
            .iter()
            .position(|e| e.path == path)
            .unwrap_or_default();
        &self.entries[index]
    }

    /// Finds a layout by name, case-insensitively
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&LayoutEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .or_else(|| self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
    }

    /// All known layouts, sorted by name
    #[must_use]
    pub fn list(&self) -> &[LayoutEntry] {
        &self.entries
    }

    /// File a layout of this name would be saved to
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{LAYOUT_EXTENSION}"))
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    }
}
