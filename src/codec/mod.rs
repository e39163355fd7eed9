/// Image codec boundary
///
/// This module handles:
/// - Sniffing the format of incoming bytes
/// - Decoding static images and GIF frame sequences
/// - Picking the output encoder (and its content type) for a decoded format
/// - Re-quantizing filtered animation frames

pub mod animation;
pub mod quantize;
pub mod sequence;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};

use crate::error::CodecError;

pub use animation::{decode_gif, encode_gif};
pub use sequence::{Disposal, FrameSequence, FrameSequenceProcessor, LoopCount, PalettedFrame};

/// JPEG output quality
const JPEG_QUALITY: u8 = 90;

/// Encoders a filtered static image can be written back with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Pick the encoder for a decoded format name
    ///
    /// Anything other than "jpeg", "png" or "webp" falls back to PNG.
    pub fn from_name(name: &str) -> Self {
        match name {
            "jpeg" => OutputFormat::Jpeg,
            "png" => OutputFormat::Png,
            "webp" => OutputFormat::WebP,
            _ => OutputFormat::Png,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }
}

/// Short lowercase name of a decoded format
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        _ => "other",
    }
}

/// Sniff the container format from the leading bytes
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    image::guess_format(data).ok()
}

pub fn is_gif(data: &[u8]) -> bool {
    detect_format(data) == Some(ImageFormat::Gif)
}

/// Decode a static image, returning it with its format name
pub fn decode(data: &[u8]) -> Result<(DynamicImage, &'static str), CodecError> {
    let format = detect_format(data).ok_or(CodecError::UnsupportedFormat)?;
    let img = image::load_from_memory_with_format(data, format).map_err(CodecError::Decode)?;
    Ok((img, format_name(format)))
}

/// Encode an RGBA raster with the given encoder
pub fn encode(img: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, CodecError> {
    let (width, height) = img.dimensions();
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            // JPEG carries no alpha channel
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(CodecError::Encode)?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut buf)
                .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(CodecError::Encode)?;
        }
        OutputFormat::WebP => {
            WebPEncoder::new_lossless(&mut buf)
                .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(CodecError::Encode)?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(5, 4, |x, y| Rgba([(x * 50) as u8, (y * 60) as u8, 128, 255]))
    }

    #[test]
    fn test_output_format_selection() {
        assert_eq!(OutputFormat::from_name("jpeg"), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_name("png"), OutputFormat::Png);
        assert_eq!(OutputFormat::from_name("webp"), OutputFormat::WebP);
        assert_eq!(OutputFormat::from_name("bmp"), OutputFormat::Png);
        assert_eq!(OutputFormat::from_name("JPEG"), OutputFormat::Png);
        assert_eq!(OutputFormat::from_name("bmp").content_type(), "image/png");
    }

    #[test]
    fn test_png_encode_then_decode() {
        let bytes = encode(&sample(), OutputFormat::Png).unwrap();
        let (img, name) = decode(&bytes).unwrap();
        assert_eq!(name, "png");
        assert_eq!(img.to_rgba8(), sample());
    }

    #[test]
    fn test_jpeg_and_webp_detected_by_sniffing() {
        let jpeg = encode(&sample(), OutputFormat::Jpeg).unwrap();
        assert_eq!(detect_format(&jpeg), Some(ImageFormat::Jpeg));

        let webp = encode(&sample(), OutputFormat::WebP).unwrap();
        assert_eq!(detect_format(&webp), Some(ImageFormat::WebP));
        let (img, name) = decode(&webp).unwrap();
        assert_eq!(name, "webp");
        assert_eq!(img.to_rgba8(), sample());
    }

    #[test]
    fn test_unknown_bytes_rejected() {
        assert!(matches!(decode(b"hello world"), Err(CodecError::UnsupportedFormat)));
        assert!(!is_gif(b"hello world"));
        assert!(is_gif(b"GIF89a\x01\x00\x01\x00"));
    }
}
