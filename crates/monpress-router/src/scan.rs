//! Route tree scanning
//!
//! Walks the route root depth-first.  Siblings are visited in reverse
//! lexicographic order, which fixes the order of the generated module; it has
//! no effect on which routes exist.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::GenerateError;

/// Entries whose name starts with this character are skipped, along with
/// everything beneath them.
pub const IGNORE_MARKER: char = '_';

/// A file under the route root that may contribute routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFile {
    /// Location on disk
    pub path: PathBuf,
    /// Path relative to the route root, `/`-separated
    pub relative: String,
}

/// Which files the scanner hands on to extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// File extensions (without the dot) that may hold route handlers
    pub extensions: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["rs".to_string()],
        }
    }
}

impl ScanOptions {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Returns `true` for names that carry the ignore marker.
pub fn is_ignored_name(name: &str) -> bool {
    name.starts_with(IGNORE_MARKER)
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map_or(false, is_ignored_name)
}

/// Collects candidate route files beneath `root`.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<Vec<RouteFile>, GenerateError> {
    if !root.is_dir() {
        return Err(GenerateError::MissingRoot(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by(|a, b| b.file_name().cmp(a.file_name()))
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| GenerateError::Scan {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() || !options.accepts(entry.path()) {
            continue;
        }

        match relative_path(root, entry.path()) {
            Some(relative) => files.push(RouteFile {
                path: entry.into_path(),
                relative,
            }),
            None => warn!(path = ?entry.path(), "skipping route file with a non UTF-8 path"),
        }
    }

    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}
