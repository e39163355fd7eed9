/// Request-handling service
///
/// Puts the catalog and the filter pipeline behind the operations an HTTP
/// layer needs. Collaborators come in through the constructor; the service
/// itself holds no mutable state.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::codec::{self, decode_gif, encode_gif, FrameSequenceProcessor, OutputFormat};
use crate::error::{CatalogError, CodecError, ServiceError};
use crate::filters::FilterRegistry;
use crate::state::{AssetCatalog, ImageMetadata};

const GIF_CONTENT_TYPE: &str = "image/gif";
const OCTET_STREAM: &str = "application/octet-stream";

/// Response body for a random pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RandomImage {
    pub url: String,
}

/// Diagnostic view of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
    pub category: String,
    pub count: usize,
    pub files: Vec<String>,
}

/// Encoded image bytes ready to send, with their content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct ImageService {
    catalog: Arc<AssetCatalog>,
    processor: Arc<FrameSequenceProcessor>,
    base_url: String,
}

impl ImageService {
    pub fn new(catalog: Arc<AssetCatalog>, registry: FilterRegistry, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            catalog,
            processor: Arc::new(FrameSequenceProcessor::new(registry)),
            base_url,
        }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Names of every registered filter
    pub fn filters(&self) -> Vec<&'static str> {
        self.processor.registry().names()
    }

    /// Public URL of a random asset in the category
    pub fn random_image(&self, category: &str) -> Result<RandomImage, ServiceError> {
        let name = self.catalog.get_random(category)?;
        Ok(RandomImage {
            url: format!("{}/api/v4/images/{}/{}", self.base_url, category, name),
        })
    }

    /// Disk location of an asset currently listed in its category
    pub fn image_path(&self, category: &str, name: &str) -> Result<PathBuf, ServiceError> {
        Ok(self.catalog.get_image_path(category, name)?)
    }

    pub fn image_metadata(&self, category: &str, name: &str) -> Result<ImageMetadata, ServiceError> {
        Ok(self.catalog.image_metadata(category, name)?)
    }

    pub fn category_listing(&self, category: &str) -> Result<CategoryListing, ServiceError> {
        let files = self
            .catalog
            .get_files(category)
            .ok_or_else(|| CatalogError::UnknownCategory(category.to_string()))?;
        Ok(CategoryListing {
            category: category.to_string(),
            count: files.len(),
            files,
        })
    }

    /// Read a listed asset from disk
    ///
    /// The file may have vanished since the last reload; that surfaces as a
    /// not-found I/O error. Without cached metadata the content type is
    /// `application/octet-stream`.
    pub async fn read_image(&self, category: &str, name: &str) -> Result<ImagePayload, ServiceError> {
        let (path, entry) = self.catalog.lookup(category, name)?;
        let content_type = entry.map_or_else(|| OCTET_STREAM.to_string(), |e| e.mime_type);
        let bytes = tokio::fs::read(&path).await?;
        Ok(ImagePayload { bytes, content_type })
    }

    /// Apply a filter to raw image bytes
    ///
    /// GIF input keeps its animation and comes back as `image/gif`; anything
    /// else is re-encoded as JPEG, WebP or (by default) PNG.
    pub fn filter_bytes(&self, filter: &str, data: &[u8]) -> Result<ImagePayload, ServiceError> {
        Ok(apply_filter(&self.processor, filter, data)?)
    }

    /// [`filter_bytes`](Self::filter_bytes) on tokio's blocking pool
    pub async fn filter_bytes_async(&self, filter: String, data: Vec<u8>) -> Result<ImagePayload, ServiceError> {
        let processor = Arc::clone(&self.processor);
        let result = tokio::task::spawn_blocking(move || apply_filter(&processor, &filter, &data)).await?;
        Ok(result?)
    }
}

fn apply_filter(processor: &FrameSequenceProcessor, filter: &str, data: &[u8]) -> Result<ImagePayload, CodecError> {
    if codec::is_gif(data) {
        let sequence = decode_gif(data)?;
        let filtered = processor.process(filter, &sequence)?;
        return Ok(ImagePayload {
            bytes: encode_gif(&filtered)?,
            content_type: GIF_CONTENT_TYPE.to_string(),
        });
    }

    let (img, format) = codec::decode(data)?;
    let filtered = processor.registry().apply_dynamic(filter, &img);
    let output = OutputFormat::from_name(format);
    tracing::debug!(filter, format, width = filtered.width(), height = filtered.height(), "filtered image");

    Ok(ImagePayload {
        bytes: codec::encode(&filtered, output)?,
        content_type: output.content_type().to_string(),
    })
}
