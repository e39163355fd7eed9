/// Runtime configuration
///
/// Resolution order, lowest to highest: built-in defaults, environment
/// variables, command-line flags (applied by the binary).

use std::path::{Path, PathBuf};

pub const ASSETS_ROOT_ENV: &str = "NEKO_ASSETS_ROOT";
pub const BASE_URL_ENV: &str = "NEKO_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3030";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory whose immediate subdirectories are the categories
    pub assets_root: PathBuf,
    /// Prefix for public image URLs
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets_root: Self::default_assets_root(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup(ASSETS_ROOT_ENV).filter(|v| !v.is_empty()) {
            config.assets_root = PathBuf::from(root);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        config
    }

    /// `./assets` when present, else the per-user data directory
    fn default_assets_root() -> PathBuf {
        let local = Path::new("assets");
        if local.is_dir() {
            return local.to_path_buf();
        }

        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("neko-love");
        path.push("assets");
        path
    }
}
