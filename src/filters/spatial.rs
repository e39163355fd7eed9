/// Neighborhood filters: pixelate, glitch, anime outline and pop pink

use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::color::{clamp_channel, clamp8};

const PIXELATE_BLOCK: u32 = 6;

const GLITCH_MAX_SHIFT: i32 = 3;
const GLITCH_BANDS: usize = 5;

const OUTLINE_THRESHOLD: u32 = 30;

const EDGE_THRESHOLD: f64 = 20.0;
const HALO: [u8; 3] = [255, 40, 60];
const HALO_ALPHA: u8 = 60;

/// Replace every 6x6 block with its per-channel average, alpha included
pub fn pixelate(img: &RgbaImage) -> RgbaImage {
    let (width, height) = img.dimensions();
    let mut out = RgbaImage::new(width, height);

    for by in (0..height).step_by(PIXELATE_BLOCK as usize) {
        for bx in (0..width).step_by(PIXELATE_BLOCK as usize) {
            let y_end = (by + PIXELATE_BLOCK).min(height);
            let x_end = (bx + PIXELATE_BLOCK).min(width);

            let mut totals = [0u32; 4];
            let mut count = 0u32;
            for y in by..y_end {
                for x in bx..x_end {
                    let pixel = img.get_pixel(x, y);
                    for (total, &c) in totals.iter_mut().zip(pixel.0.iter()) {
                        *total += c as u32;
                    }
                    count += 1;
                }
            }

            let avg = Rgba(totals.map(|t| (t / count) as u8));
            for y in by..y_end {
                for x in bx..x_end {
                    out.put_pixel(x, y, avg);
                }
            }
        }
    }

    out
}

/// Channel-shifted scanlines plus a few XOR-corrupted bands
pub fn glitch(img: &RgbaImage) -> RgbaImage {
    glitch_with_rng(img, &mut rand::thread_rng())
}

/// `glitch` with an explicit randomness source
pub fn glitch_with_rng<R: Rng + ?Sized>(img: &RgbaImage, rng: &mut R) -> RgbaImage {
    let (width, height) = img.dimensions();
    let mut out = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let max_x = width as i32 - 1;
    let sample_x = |x: u32, shift: i32| (x as i32 + shift).clamp(0, max_x) as u32;

    for y in 0..height {
        let shift_r = rng.gen_range(-GLITCH_MAX_SHIFT..=GLITCH_MAX_SHIFT);
        let shift_g = rng.gen_range(-GLITCH_MAX_SHIFT..=GLITCH_MAX_SHIFT);
        let shift_b = rng.gen_range(-GLITCH_MAX_SHIFT..=GLITCH_MAX_SHIFT);

        for x in 0..width {
            let r = img.get_pixel(sample_x(x, shift_r), y)[0];
            let g = img.get_pixel(sample_x(x, shift_g), y)[1];
            let blue_src = img.get_pixel(sample_x(x, shift_b), y);
            out.put_pixel(x, y, Rgba([r, g, blue_src[2], blue_src[3]]));
        }
    }

    for _ in 0..GLITCH_BANDS {
        let start = rng.gen_range(0..height);
        let band_height = rng.gen_range(5..15);
        let mask: u8 = rng.gen_range(0..100);

        for y in start..(start + band_height).min(height) {
            for x in 0..width {
                let pixel = out.get_pixel_mut(x, y);
                pixel[0] ^= mask;
                pixel[1] ^= mask;
                pixel[2] ^= mask;
            }
        }
    }

    out
}

/// Black outlines where a pixel differs strongly from its right and lower neighbors
///
/// Differences are summed on 16-bit scaled samples. Only interior pixels
/// are written: the 1-pixel border (or all of an image under 3x3) comes
/// out transparent black.
pub fn anime_outline(img: &RgbaImage) -> RgbaImage {
    let (width, height) = img.dimensions();
    let mut out = RgbaImage::new(width, height);
    if width < 3 || height < 3 {
        return out;
    }

    let limit = OUTLINE_THRESHOLD * 3 * 256;
    let wide = |c: u8| c as u32 * 257;
    let delta = |a: &Rgba<u8>, b: &Rgba<u8>| -> u32 {
        (0..3).map(|c| wide(a[c]).abs_diff(wide(b[c]))).sum()
    };

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let here = img.get_pixel(x, y);
            let total = delta(here, img.get_pixel(x + 1, y)) + delta(here, img.get_pixel(x, y + 1));
            let pixel = if total > limit { Rgba([0, 0, 0, 255]) } else { *here };
            out.put_pixel(x, y, pixel);
        }
    }

    out
}

/// Average absolute channel difference to the 4-connected neighbors
fn edge_strength(img: &RgbaImage, x: u32, y: u32) -> f64 {
    let (width, height) = img.dimensions();
    let here = img.get_pixel(x, y);

    let mut sum = 0.0;
    let mut count = 0;
    for (dx, dy) in [(1i64, 0i64), (-1, 0), (0, 1), (0, -1)] {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
            continue;
        }
        let there = img.get_pixel(nx as u32, ny as u32);
        let diff: f64 = (0..3)
            .map(|c| (here[c] as f64 - there[c] as f64).abs())
            .sum();
        sum += diff / 3.0;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Boosted base colors with a dilated red halo blended over detected edges
pub fn pop_pink(img: &RgbaImage) -> RgbaImage {
    let (width, height) = img.dimensions();

    let mut halo = RgbaImage::new(width, height);
    for (x, y, pixel) in halo.enumerate_pixels_mut() {
        if edge_strength(img, x, y) > EDGE_THRESHOLD {
            *pixel = Rgba([HALO[0], HALO[1], HALO[2], HALO_ALPHA]);
        }
    }

    // 3x3 dilation: keep the strongest halo pixel around each position
    let mut dilated = RgbaImage::new(width, height);
    for (x, y, pixel) in dilated.enumerate_pixels_mut() {
        let mut best = Rgba([0, 0, 0, 0]);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let candidate = halo.get_pixel(nx as u32, ny as u32);
                if candidate[3] > best[3] {
                    best = *candidate;
                }
            }
        }
        *pixel = best;
    }

    let mut out = RgbaImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let base = [
            clamp8((r as f64 * 1.5) as i32 + 40),
            clamp8((g as f64 * 1.2) as i32 + 90),
            clamp_channel(b as f64 * 1.8 + 127.5),
        ];

        let glow = dilated.get_pixel(x, y);
        let weight = glow[3] as f64 / 255.0;
        let blend = |base: u8, glow: u8| (base as f64 * (1.0 - weight) + glow as f64 * weight) as u8;

        *pixel = Rgba([
            blend(base[0], glow[0]),
            blend(base[1], glow[1]),
            blend(base[2], glow[2]),
            a,
        ]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_pixelate_block_average() {
        let img = RgbaImage::from_fn(6, 6, |x, _| {
            if x < 3 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([200, 100, 50, 255])
            }
        });
        let out = pixelate(&img);
        assert!(out.pixels().all(|p| p.0 == [100, 50, 25, 127]));
    }

    #[test]
    fn test_pixelate_partial_edge_blocks() {
        let img = RgbaImage::from_fn(8, 7, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 7, 255]));
        let out = pixelate(&img);
        assert_eq!(out.dimensions(), (8, 7));
        // The 2x1 corner block at x = 6..8, y = 6 averages to x = 65, y = 60
        assert_eq!(out.get_pixel(7, 6).0, [65, 60, 7, 255]);
    }

    #[test]
    fn test_glitch_keeps_bounds_and_alpha() {
        let img = RgbaImage::from_fn(20, 30, |x, y| Rgba([x as u8, y as u8, 9, 128 + (x as u8)]));
        let mut rng = StdRng::seed_from_u64(7);
        let out = glitch_with_rng(&img, &mut rng);
        assert_eq!(out.dimensions(), img.dimensions());
        // Alpha rides along with the blue sample, shifted at most 3 pixels
        for (x, y, pixel) in out.enumerate_pixels() {
            let shift = (pixel[3] as i32 - 128) - x as i32;
            assert!(shift.abs() <= GLITCH_MAX_SHIFT, "({x}, {y}) shifted by {shift}");
        }
    }

    #[test]
    fn test_glitch_empty_image() {
        let img = RgbaImage::new(0, 0);
        assert_eq!(glitch(&img).dimensions(), (0, 0));
    }

    #[test]
    fn test_anime_outline_flat_image_keeps_interior() {
        let img = RgbaImage::from_pixel(5, 5, Rgba([120, 60, 30, 255]));
        let out = anime_outline(&img);
        for (x, y, pixel) in out.enumerate_pixels() {
            let interior = x > 0 && y > 0 && x < 4 && y < 4;
            let expected = if interior { [120, 60, 30, 255] } else { [0, 0, 0, 0] };
            assert_eq!(pixel.0, expected, "pixel ({}, {})", x, y);
        }
    }

    #[test]
    fn test_anime_outline_tiny_image_is_blank() {
        let img = RgbaImage::from_pixel(2, 7, Rgba([9, 9, 9, 255]));
        let out = anime_outline(&img);
        assert_eq!(out.dimensions(), (2, 7));
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_anime_outline_marks_interior_edges() {
        let img = checker(5, 5);
        let out = anime_outline(&img);
        for (x, y, pixel) in out.enumerate_pixels() {
            let interior = x > 0 && y > 0 && x < 4 && y < 4;
            if interior {
                assert_eq!(pixel.0, [0, 0, 0, 255]);
            } else {
                assert_eq!(pixel.0, [0, 0, 0, 0]);
            }
        }
    }

    #[test]
    fn test_pop_pink_flat_image_has_no_halo() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 90]));
        let out = pop_pink(&img);
        // 150 + 40, 120 + 90, 180 + 127.5
        assert!(out.pixels().all(|p| p.0 == [190, 210, 255, 90]));
    }

    #[test]
    fn test_pop_pink_edges_get_halo() {
        let img = checker(4, 4);
        let out = pop_pink(&img);
        // Black pixel: base (40, 90, 127) blended 60/255 toward the halo color
        let w = 60.0 / 255.0;
        let expect = |base: f64, halo: f64| (base * (1.0 - w) + halo * w) as u8;
        assert_eq!(
            out.get_pixel(1, 0).0,
            [expect(40.0, 255.0), expect(90.0, 40.0), expect(127.0, 60.0), 255]
        );
    }
}
