/// Palette re-quantization for animated output
///
/// Filtered frames are mapped back onto a fixed 256-color reference palette
/// with Floyd-Steinberg error diffusion. Slot 0 of the palette is always
/// fully transparent, and any pixel that was not fully opaque is forced to
/// slot 0 after dithering.

use image::RgbaImage;

/// Palette index reserved for full transparency
pub const TRANSPARENT_INDEX: u8 = 0;

/// A 256-entry RGBA palette
pub type Palette = [[u8; 4]; 256];

/// The Plan 9 "rgbv" color map: a 4x4x4 cube with four intensity shades per cell
///
/// Entry 0 (black) is replaced with transparent in [`reference_palette`].
fn rgbv(index: u8) -> [u8; 4] {
    let c = index as i32;
    let r = c >> 6;
    let v = (c >> 4) & 3;
    let j = (c - v + r) & 15;
    let g = j >> 2;
    let b = j & 3;

    let den = r.max(g).max(b);
    if den == 0 {
        let grey = (v * 17) as u8;
        return [grey, grey, grey, 255];
    }
    let num = 17 * (4 * den + v);
    [(r * num / den) as u8, (g * num / den) as u8, (b * num / den) as u8, 255]
}

/// The reference palette with slot 0 overridden to transparent
pub fn reference_palette() -> Palette {
    let mut palette = [[0u8; 4]; 256];
    for (i, entry) in palette.iter_mut().enumerate() {
        *entry = rgbv(i as u8);
    }
    palette[TRANSPARENT_INDEX as usize] = [0, 0, 0, 0];
    palette
}

fn nearest(palette: &Palette, color: [i32; 4]) -> usize {
    let mut best = 0;
    let mut best_dist = i64::MAX;
    for (i, entry) in palette.iter().enumerate() {
        let dist: i64 = (0..4)
            .map(|c| {
                let d = (color[c] - entry[c] as i32) as i64;
                d * d
            })
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best = i;
            if dist == 0 {
                break;
            }
        }
    }
    best
}

/// Premultiplied color, so every fully transparent pixel matches slot 0 exactly
fn premultiply([r, g, b, a]: [u8; 4]) -> [i32; 4] {
    let a = a as i32;
    let scale = |c: u8| (c as i32 * a + 127) / 255;
    [scale(r), scale(g), scale(b), a]
}

/// Map an RGBA raster onto `palette`, returning one index per pixel
///
/// Colors are compared premultiplied. Quantization error on all four
/// channels is diffused 7/16 right, 3/16 down-left, 5/16 down, 1/16
/// down-right.
pub fn dither(img: &RgbaImage, palette: &Palette) -> Vec<u8> {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let mut indices = vec![TRANSPARENT_INDEX; w * h];

    // Carried error for the current and the next row; one slot of padding per side
    let mut current = vec![[0i32; 4]; w + 2];
    let mut next = vec![[0i32; 4]; w + 2];

    for y in 0..h {
        for x in 0..w {
            let src = premultiply(img.get_pixel(x as u32, y as u32).0);
            let mut color = [0i32; 4];
            for c in 0..4 {
                // Error is carried in 1/16 units
                color[c] = (src[c] + (current[x + 1][c] + 8).div_euclid(16)).clamp(0, 255);
            }

            let index = nearest(palette, color);
            indices[y * w + x] = index as u8;

            let chosen = palette[index];
            for c in 0..4 {
                let err = color[c] - chosen[c] as i32;
                current[x + 2][c] += err * 7;
                next[x][c] += err * 3;
                next[x + 1][c] += err * 5;
                next[x + 2][c] += err;
            }
        }
        std::mem::swap(&mut current, &mut next);
        next.iter_mut().for_each(|e| *e = [0; 4]);
    }

    indices
}

/// Dither onto `palette`, then force every pixel that is not fully opaque
/// to the transparent slot
pub fn quantize_with_transparency(img: &RgbaImage, palette: &Palette) -> Vec<u8> {
    let mut indices = dither(img, palette);
    for (index, pixel) in indices.iter_mut().zip(img.pixels()) {
        if pixel[3] < 255 {
            *index = TRANSPARENT_INDEX;
        }
    }
    indices
}
