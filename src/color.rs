/// Color helpers shared by the filter family
///
/// All filters work on straight (non-premultiplied) 8-bit RGBA. Luminance
/// uses the Rec. 601 weights.

use image::Rgba;

/// Rec. 601 luma weights for R, G, B
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Weighted channel sum in the 0.0..=255.0 range
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    LUMA_WEIGHTS[0] * r as f64 + LUMA_WEIGHTS[1] * g as f64 + LUMA_WEIGHTS[2] * b as f64
}

/// Normalized luminance in the 0.0..=1.0 range
pub fn luminance(pixel: &Rgba<u8>) -> f64 {
    let [r, g, b, _] = pixel.0;
    luma(r, g, b) / 255.0
}

/// Truncate a float channel value into 0..=255
///
/// Truncation (not rounding) matches how the tone filters were tuned.
pub fn clamp_channel(value: f64) -> u8 {
    if value <= 0.0 {
        0
    } else if value >= 255.0 {
        255
    } else {
        value as u8
    }
}

/// Clamp an integer channel value into 0..=255
pub fn clamp8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}
