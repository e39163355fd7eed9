/// Luminance-banded palette filters
///
/// Each pixel is bucketed by luminance into one of four bands and replaced
/// by that band's color. Alpha is kept.

use image::{Rgba, RgbaImage};

use crate::color::luminance;

const WHITE: [u8; 3] = [255, 255, 255];
const NEAR_BLACK: [u8; 3] = [35, 39, 42];

const WHITE_THRESHOLD: f64 = 0.92;
const BRIGHT_THRESHOLD: f64 = 0.70;
const MID_THRESHOLD: f64 = 0.45;

/// The two tinted bands of a palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandPalette {
    pub bright: [u8; 3],
    pub mid: [u8; 3],
}

pub const BLURPLE: BandPalette = BandPalette { bright: [88, 101, 242], mid: [69, 79, 191] };
pub const FUCHSIA: BandPalette = BandPalette { bright: [192, 88, 168], mid: [152, 40, 128] };
pub const CRIMSON: BandPalette = BandPalette { bright: [180, 50, 50], mid: [120, 20, 30] };
pub const MINT: BandPalette = BandPalette { bright: [100, 255, 200], mid: [30, 120, 100] };
pub const SUNSET: BandPalette = BandPalette { bright: [255, 140, 90], mid: [120, 60, 80] };

impl BandPalette {
    /// Band color for a normalized luminance
    pub fn color_for(&self, lum: f64) -> [u8; 3] {
        if lum >= WHITE_THRESHOLD {
            WHITE
        } else if lum >= BRIGHT_THRESHOLD {
            self.bright
        } else if lum >= MID_THRESHOLD {
            self.mid
        } else {
            NEAR_BLACK
        }
    }

    pub fn apply(&self, img: &RgbaImage) -> RgbaImage {
        let mut out = img.clone();
        for pixel in out.pixels_mut() {
            let [r, g, b] = self.color_for(luminance(pixel));
            *pixel = Rgba([r, g, b, pixel[3]]);
        }
        out
    }
}

pub fn blurple(img: &RgbaImage) -> RgbaImage {
    BLURPLE.apply(img)
}

pub fn fuchsia(img: &RgbaImage) -> RgbaImage {
    FUCHSIA.apply(img)
}

pub fn crimson(img: &RgbaImage) -> RgbaImage {
    CRIMSON.apply(img)
}

pub fn mint(img: &RgbaImage) -> RgbaImage {
    MINT.apply(img)
}

pub fn sunset(img: &RgbaImage) -> RgbaImage {
    SUNSET.apply(img)
}
