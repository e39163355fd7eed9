use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use walkdir::WalkDir;

use super::data::{AssetEntry, Category, CategorySnapshot, ImageMetadata};
use super::sniff::{human_size, sniff_file};
use crate::error::CatalogError;

/// The AssetCatalog indexes `root/<category>/<asset>` in memory.
///
/// Each category owns one immutable [`CategorySnapshot`] behind an `Arc`.
/// A reload scans the directory without holding any lock, then swaps the
/// new snapshot in under a short write lock. Readers clone the `Arc` and
/// never observe a half-built list.
#[derive(Debug)]
pub struct AssetCatalog {
    root: PathBuf,
    categories: RwLock<HashMap<String, Category>>,
}

impl AssetCatalog {
    /// An empty catalog over `root`; nothing is scanned yet
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            categories: RwLock::new(HashMap::new()),
        }
    }

    /// Scan `root` and load every immediate subdirectory as a category.
    ///
    /// An unreadable root is an error. A category that fails to load is
    /// logged and skipped.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let catalog = Self::new(root);

        let entries = fs::read_dir(&catalog.root).map_err(|source| CatalogError::DirectoryRead {
            path: catalog.root.clone(),
            source,
        })?;

        for entry in entries.filter_map(|e| e.ok()) {
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Err(e) = catalog.load_category(&name) {
                tracing::warn!(category = %name, error = %e, "failed to load category");
            }
        }

        tracing::info!(
            root = %catalog.root.display(),
            categories = catalog.category_count(),
            "asset catalog initialized"
        );
        Ok(catalog)
    }

    /// Get the asset root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Category>> {
        self.categories.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Category>> {
        self.categories.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Category names must be a single plain path component
    fn validate_name(name: &str) -> Result<(), CatalogError> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if plain {
            Ok(())
        } else {
            Err(CatalogError::UnknownCategory(name.to_string()))
        }
    }

    /// Record a category and its directory without scanning it
    ///
    /// The path of an already registered category never changes.
    pub fn register_category(&self, name: &str) -> Result<PathBuf, CatalogError> {
        Self::validate_name(name)?;
        let mut categories = self.write();
        let category = categories
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name, self.root.join(name)));
        Ok(category.path.clone())
    }

    /// Rescan one category directory and swap in the fresh snapshot.
    ///
    /// On failure the previous snapshot stays in place. Returns the number
    /// of assets in the new snapshot.
    pub fn load_category(&self, name: &str) -> Result<usize, CatalogError> {
        Self::validate_name(name)?;
        let path = self
            .category_path(name)
            .unwrap_or_else(|| self.root.join(name));

        // Scan outside the lock so readers are only blocked for the swap
        let snapshot = scan_directory(&path)?;
        let count = snapshot.len();
        self.install_snapshot(name, path, snapshot);

        tracing::info!(category = name, files = count, "loaded category");
        Ok(count)
    }

    /// Swap in a snapshot, creating the category on first install
    pub(crate) fn install_snapshot(&self, name: &str, path: PathBuf, snapshot: CategorySnapshot) {
        let mut categories = self.write();
        let category = categories
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name, path));
        category.snapshot = Arc::new(snapshot);
    }

    /// Registered category names, sorted
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn category_count(&self) -> usize {
        self.read().len()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.read().contains_key(category)
    }

    pub fn category_path(&self, category: &str) -> Option<PathBuf> {
        self.read().get(category).map(|c| c.path.clone())
    }

    /// The current snapshot of a category
    pub fn snapshot(&self, category: &str) -> Option<Arc<CategorySnapshot>> {
        self.read().get(category).map(|c| Arc::clone(&c.snapshot))
    }

    /// A uniformly random asset name from the current snapshot
    pub fn get_random(&self, category: &str) -> Result<String, CatalogError> {
        let snapshot = self
            .snapshot(category)
            .ok_or_else(|| CatalogError::UnknownCategory(category.to_string()))?;
        snapshot
            .names()
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| CatalogError::EmptyCategory(category.to_string()))
    }

    /// Every asset name in the current snapshot; `None` for an unknown category
    pub fn get_files(&self, category: &str) -> Option<Vec<String>> {
        self.snapshot(category).map(|s| s.names().to_vec())
    }

    /// Full path of an asset listed in the current snapshot
    ///
    /// Matching is exact and case-sensitive.
    pub fn get_image_path(&self, category: &str, name: &str) -> Result<PathBuf, CatalogError> {
        let categories = self.read();
        categories
            .get(category)
            .filter(|c| c.snapshot.contains(name))
            .map(|c| c.asset_path(name))
            .ok_or_else(|| not_found(category, name))
    }

    /// Path and cached metadata of a listed asset, from one snapshot
    ///
    /// The entry is `None` when the file is listed but its metadata could
    /// not be read at load time.
    pub fn lookup(&self, category: &str, name: &str) -> Result<(PathBuf, Option<AssetEntry>), CatalogError> {
        let categories = self.read();
        categories
            .get(category)
            .filter(|c| c.snapshot.contains(name))
            .map(|c| (c.asset_path(name), c.snapshot.entry(name).cloned()))
            .ok_or_else(|| not_found(category, name))
    }

    /// Cached metadata of an asset
    pub fn get_image_meta(&self, category: &str, name: &str) -> Result<AssetEntry, CatalogError> {
        self.snapshot(category)
            .and_then(|s| s.entry(name).cloned())
            .ok_or_else(|| not_found(category, name))
    }

    /// Cached metadata in the exposed schema, with the resolved path
    pub fn image_metadata(&self, category: &str, name: &str) -> Result<ImageMetadata, CatalogError> {
        let categories = self.read();
        let found = categories
            .get(category)
            .and_then(|c| c.snapshot.entry(name).map(|entry| (c.asset_path(name), entry)));
        match found {
            Some((path, entry)) => Ok(ImageMetadata::from_entry(category, &path, entry)),
            None => Err(not_found(category, name)),
        }
    }
}

fn not_found(category: &str, name: &str) -> CatalogError {
    CatalogError::NotFound {
        category: category.to_string(),
        name: name.to_string(),
    }
}

fn directory_error(path: &Path, source: io::Error) -> CatalogError {
    CatalogError::DirectoryRead {
        path: path.to_path_buf(),
        source,
    }
}

/// Read one category directory into a fresh snapshot
///
/// Subdirectories are ignored. A file whose metadata cannot be read is
/// still listed, without a cached entry.
fn scan_directory(path: &Path) -> Result<CategorySnapshot, CatalogError> {
    let meta = fs::metadata(path).map_err(|e| directory_error(path, e))?;
    if !meta.is_dir() {
        return Err(directory_error(
            path,
            io::Error::new(io::ErrorKind::Other, "not a directory"),
        ));
    }

    let mut names = Vec::new();
    let mut entries = HashMap::new();

    let walker = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed"));
                return Err(directory_error(path, source));
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        names.push(name.clone());

        let Ok(file_meta) = entry.metadata() else {
            continue;
        };
        let size_bytes = file_meta.len();
        let modified_at = file_meta
            .modified()
            .map(|t| DateTime::<Utc>::from(t).timestamp())
            .unwrap_or(0);
        let mime_type = sniff_file(entry.path())
            .unwrap_or_else(|_| "application/octet-stream".to_string());

        entries.insert(
            name.clone(),
            AssetEntry {
                name,
                size_bytes,
                size: human_size(size_bytes),
                mime_type,
                modified_at,
            },
        );
    }

    Ok(CategorySnapshot::new(names, entries))
}
