/// Catalog state
///
/// This module handles everything the service knows about the asset tree:
/// - Shared data structures (data.rs)
/// - The category registry and its snapshots (catalog.rs)
/// - Keeping snapshots current as files change (watcher.rs)
/// - Content sniffing and size formatting (sniff.rs)

pub mod catalog;
pub mod data;
pub mod sniff;
pub mod watcher;

pub use catalog::AssetCatalog;
pub use data::{AssetEntry, Category, CategorySnapshot, ImageMetadata};
pub use watcher::{CatalogEvent, CatalogWatcher};
