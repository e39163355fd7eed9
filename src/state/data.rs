/// Shared data structures for the asset catalog
///
/// These structs represent the data model that flows between
/// the catalog layer and whoever serves requests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

/// Cached metadata for one asset file, computed at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Filename only (e.g., "neko_042.png")
    pub name: String,
    pub size_bytes: u64,
    /// Binary-unit size, e.g. "1.50 KB"
    pub size: String,
    /// Sniffed from the first 512 bytes
    pub mime_type: String,
    /// Last modification, unix seconds
    pub modified_at: i64,
}

/// One complete, immutable load of a category directory
///
/// Snapshots are swapped wholesale on reload, never patched, so a reader
/// holding one always sees the name list and the metadata from the same
/// scan.
#[derive(Debug, Clone, Default)]
pub struct CategorySnapshot {
    names: Vec<String>,
    entries: HashMap<String, AssetEntry>,
}

impl CategorySnapshot {
    /// Build a snapshot from scanned file names and the metadata that could be read
    ///
    /// A name without metadata is still listed; it just has no cached entry.
    pub fn new(names: Vec<String>, entries: HashMap<String, AssetEntry>) -> Self {
        Self { names, entries }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact, case-sensitive membership
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn entry(&self, name: &str) -> Option<&AssetEntry> {
        self.entries.get(name)
    }
}

/// A registered category: its fixed directory and its current snapshot
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub path: PathBuf,
    pub snapshot: Arc<CategorySnapshot>,
}

impl Category {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            snapshot: Arc::new(CategorySnapshot::default()),
        }
    }

    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// Metadata as exposed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    pub name: String,
    pub category: String,
    pub path: String,
    pub size: String,
    pub size_bytes: u64,
    pub modified_at: i64,
    pub mime_type: String,
}

impl ImageMetadata {
    pub fn from_entry(category: &str, path: &Path, entry: &AssetEntry) -> Self {
        Self {
            name: entry.name.clone(),
            category: category.to_string(),
            path: path.to_string_lossy().to_string(),
            size: entry.size.clone(),
            size_bytes: entry.size_bytes,
            modified_at: entry.modified_at,
            mime_type: entry.mime_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> AssetEntry {
        AssetEntry {
            name: name.to_string(),
            size_bytes: 1536,
            size: "1.50 KB".to_string(),
            mime_type: "image/png".to_string(),
            modified_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_snapshot_lookup_is_exact() {
        let mut entries = HashMap::new();
        entries.insert("a.png".to_string(), entry("a.png"));
        let snapshot = CategorySnapshot::new(vec!["a.png".into()], entries);

        assert!(snapshot.contains("a.png"));
        assert!(!snapshot.contains("A.png"));
        assert!(!snapshot.contains("a.pn"));
        assert_eq!(snapshot.entry("a.png").map(|e| e.size_bytes), Some(1536));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_metadata_serialization() {
        let meta = ImageMetadata::from_entry("neko", Path::new("/assets/neko/a.png"), &entry("a.png"));
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["name"], "a.png");
        assert_eq!(json["category"], "neko");
        assert_eq!(json["path"], "/assets/neko/a.png");
        assert_eq!(json["size"], "1.50 KB");
        assert_eq!(json["size_bytes"], 1536);
        assert_eq!(json["modified_at"], 1_700_000_000i64);
        assert_eq!(json["mime_type"], "image/png");
    }
}
