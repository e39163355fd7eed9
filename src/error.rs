/// Error types shared across the crate
///
/// Catalog errors are mostly swallowed at the watcher boundary and only
/// logged; codec errors always surface to whoever asked for the transform.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the asset catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The asset is absent from the category's current snapshot
    #[error("asset '{name}' not found in category '{category}'")]
    NotFound { category: String, name: String },

    /// The category has never been loaded
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    /// The category exists but its snapshot holds no assets
    #[error("category '{0}' has no assets")]
    EmptyCategory(String),

    /// A directory scan failed; the previous snapshot is still served
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CatalogError {
    /// True for every "nothing to serve" condition
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound { .. }
                | CatalogError::UnknownCategory(_)
                | CatalogError::EmptyCategory(_)
        )
    }
}

/// Errors raised while decoding, transforming or encoding images
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to decode GIF: {0}")]
    GifDecode(#[from] gif::DecodingError),

    #[error("failed to encode GIF: {0}")]
    GifEncode(#[from] gif::EncodingError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("animation has no frames")]
    EmptySequence,

    /// GIF stores sizes and offsets as 16-bit values
    #[error("dimension {0} exceeds the GIF limit of 65535")]
    DimensionOverflow(u32),

    #[error("unrecognized image data")]
    UnsupportedFormat,
}

/// Errors raised while setting up the filesystem watcher
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("failed to spawn reload worker: {0}")]
    Spawn(#[source] io::Error),
}

/// Errors surfaced by the request-handling service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),

    #[error("filter task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// Lets an outer routing layer tell 404 apart from 500
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::Catalog(e) => e.is_not_found(),
            ServiceError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
