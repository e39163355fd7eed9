/// Per-pixel tone filters
///
/// Every filter here looks at one pixel at a time and keeps its alpha.

use image::{Rgba, RgbaImage};

use crate::color::{clamp_channel, luma};

/// Number of levels per channel kept by `posterize`
const POSTERIZE_LEVELS: u32 = 4;

/// Apply `f` to every pixel, keeping the source alpha
pub(crate) fn map_rgb<F>(img: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn(u8, u8, u8) -> [u8; 3],
{
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let [nr, ng, nb] = f(r, g, b);
        *pixel = Rgba([nr, ng, nb, a]);
    }
    out
}

/// Invert R, G and B
pub fn negative(img: &RgbaImage) -> RgbaImage {
    map_rgb(img, |r, g, b| [255 - r, 255 - g, 255 - b])
}

/// Rec. 601 weighted grey, rounded to nearest
pub fn greyscale(img: &RgbaImage) -> RgbaImage {
    map_rgb(img, |r, g, b| {
        let grey = clamp_channel(luma(r, g, b).round());
        [grey, grey, grey]
    })
}

/// Snap every channel down to a multiple of 256 / levels
pub fn posterize(img: &RgbaImage) -> RgbaImage {
    let step = 256 / POSTERIZE_LEVELS;
    let snap = |c: u8| ((c as u32 / step) * step) as u8;
    map_rgb(img, |r, g, b| [snap(r), snap(g), snap(b)])
}

/// Blown-out warm contrast
pub fn deepfry(img: &RgbaImage) -> RgbaImage {
    map_rgb(img, |r, g, b| {
        [
            clamp_channel(r as f64 * 1.8 + 50.0),
            clamp_channel(g as f64 * 1.4),
            clamp_channel(b as f64 * 0.8),
        ]
    })
}

/// Pink and cyan tint
pub fn vaporwave(img: &RgbaImage) -> RgbaImage {
    map_rgb(img, |r, g, b| {
        [
            clamp_channel(r as f64 * 1.2 + 30.0),
            clamp_channel(g as f64 * 0.9),
            clamp_channel(b as f64 * 1.2 + 20.0),
        ]
    })
}

/// Contrast boost whose strength depends on the pixel's average brightness
pub fn neon(img: &RgbaImage) -> RgbaImage {
    map_rgb(img, |r, g, b| {
        let (r, g, b) = (r as f64, g as f64, b as f64);
        let avg = (r + g + b) / 3.0;
        let factor = if avg > 180.0 {
            2.5
        } else if avg < 50.0 {
            0.5
        } else {
            2.0
        };
        [
            clamp_channel(r * factor),
            clamp_channel(g * factor * 0.8),
            clamp_channel(b * factor * 1.2),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> RgbaImage {
        RgbaImage::from_fn(16, 16, |x, y| {
            let v = (y * 16 + x) as u8;
            Rgba([v, v.wrapping_mul(3), 255 - v, v / 2])
        })
    }

    #[test]
    fn test_negative_twice_is_identity() {
        let img = gradient();
        assert_eq!(negative(&negative(&img)), img);
    }

    #[test]
    fn test_greyscale_equal_channels_and_alpha_kept() {
        let img = gradient();
        let grey = greyscale(&img);
        for (src, out) in img.pixels().zip(grey.pixels()) {
            assert_eq!(out[0], out[1]);
            assert_eq!(out[1], out[2]);
            assert_eq!(out[3], src[3]);
        }
    }

    #[test]
    fn test_greyscale_white_stays_white() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        assert_eq!(greyscale(&img).get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_posterize_every_channel_value() {
        // 256 pixels wide: one column per possible channel value
        let img = RgbaImage::from_fn(256, 1, |x, _| Rgba([x as u8, x as u8, x as u8, 255]));
        let out = posterize(&img);
        for (x, pixel) in out.pixels().enumerate() {
            for c in 0..3 {
                assert_eq!(pixel[c] % 64, 0, "value {} not a multiple of 64", pixel[c]);
                assert!(x as i32 - (pixel[c] as i32) < 64);
                assert!(pixel[c] as usize <= x);
            }
        }
    }

    #[test]
    fn test_deepfry_values() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 200]));
        // 100 * 1.8 + 50 = 230, 100 * 1.4 = 140, 100 * 0.8 = 80
        assert_eq!(deepfry(&img).get_pixel(0, 0).0, [230, 140, 80, 200]);

        let bright = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        assert_eq!(deepfry(&bright).get_pixel(0, 0).0, [255, 255, 204, 255]);
    }

    #[test]
    fn test_vaporwave_values() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        assert_eq!(vaporwave(&img).get_pixel(0, 0).0, [150, 90, 140, 255]);
    }

    #[test]
    fn test_neon_factor_bands() {
        let dark = RgbaImage::from_pixel(1, 1, Rgba([40, 40, 40, 255]));
        assert_eq!(neon(&dark).get_pixel(0, 0).0, [20, 16, 24, 255]);

        let mid = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        assert_eq!(neon(&mid).get_pixel(0, 0).0, [200, 160, 240, 255]);

        let light = RgbaImage::from_pixel(1, 1, Rgba([200, 200, 200, 255]));
        assert_eq!(neon(&light).get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}
