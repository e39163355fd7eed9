/// Stateless image filters and the name -> filter registry
///
/// Filters are plain functions over `RgbaImage` and return an image with
/// the same bounds.

pub mod palette;
pub mod spatial;
pub mod tone;

use std::collections::HashMap;

use image::{DynamicImage, RgbaImage};

/// A pure raster transform
pub type FilterFn = fn(&RgbaImage) -> RgbaImage;

/// Every built-in filter, in listing order
const BUILTIN: [(&str, FilterFn); 15] = [
    ("negative", tone::negative),
    ("greyscale", tone::greyscale),
    ("posterize", tone::posterize),
    ("pixelate", spatial::pixelate),
    ("deepfry", tone::deepfry),
    ("vaporwave", tone::vaporwave),
    ("neon", tone::neon),
    ("glitch", spatial::glitch),
    ("blurple", palette::blurple),
    ("fuchsia", palette::fuchsia),
    ("crimson", palette::crimson),
    ("mint", palette::mint),
    ("sunset", palette::sunset),
    ("anime_outline", spatial::anime_outline),
    ("pop_pink", spatial::pop_pink),
];

/// Name -> filter lookup
///
/// Names are matched exactly. An unknown name is not an error: `apply`
/// hands the image back unchanged.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: HashMap<&'static str, FilterFn>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterRegistry {
    /// Registry with all built-in filters
    pub fn new() -> Self {
        Self {
            filters: BUILTIN.iter().copied().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<FilterFn> {
        self.filters.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Built-in filter names in listing order
    pub fn names(&self) -> Vec<&'static str> {
        BUILTIN
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| self.filters.contains_key(name))
            .collect()
    }

    /// Run the named filter over an RGBA raster
    pub fn apply(&self, name: &str, img: &RgbaImage) -> RgbaImage {
        match self.get(name) {
            Some(filter) => filter(img),
            None => {
                tracing::debug!(filter = name, "unknown filter, passing image through");
                img.clone()
            }
        }
    }

    /// Convert any decoded image to RGBA and run the named filter
    pub fn apply_dynamic(&self, name: &str, img: &DynamicImage) -> RgbaImage {
        self.apply(name, &img.to_rgba8())
    }
}
