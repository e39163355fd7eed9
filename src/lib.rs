pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod filters;
pub mod service;
pub mod state;

pub use config::Config;
pub use error::{CatalogError, CodecError, ServiceError, WatchError};
pub use filters::FilterRegistry;
pub use service::ImageService;
pub use state::{AssetCatalog, CatalogWatcher};
