/// Multi-frame animations and the per-frame filter pipeline
///
/// A [`FrameSequence`] keeps frames exactly as a GIF stores them: indexed
/// pixels over a palette, placed at an offset on the logical canvas.
/// Processing normalizes every frame to the full canvas, filters it, and
/// re-quantizes it onto the reference palette.

use image::{Rgba, RgbaImage};

use super::quantize::{quantize_with_transparency, reference_palette, Palette};
use crate::error::CodecError;
use crate::filters::FilterRegistry;

/// How a frame is treated before the next one is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposal {
    /// No disposal specified
    Unspecified,
    /// Leave the frame in place
    #[default]
    None,
    /// Restore the frame's area to the background
    Background,
    /// Restore the frame's area to what was there before
    Previous,
}

/// How many times the animation plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Finite(u16),
}

/// One indexed frame placed on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct PalettedFrame {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// RGBA entries; transparent entries carry alpha 0
    pub palette: Vec<[u8; 4]>,
    /// One palette index per pixel, row-major
    pub indices: Vec<u8>,
}

impl PalettedFrame {
    /// A full-canvas frame at the origin
    pub fn full(width: u32, height: u32, palette: Vec<[u8; 4]>, indices: Vec<u8>) -> Self {
        Self { left: 0, top: 0, width, height, palette, indices }
    }

    /// RGBA color of the pixel at frame-local coordinates
    ///
    /// Indices outside the palette read as transparent.
    pub fn color_at(&self, x: u32, y: u32) -> [u8; 4] {
        let index = self.indices[(y * self.width + x) as usize] as usize;
        self.palette.get(index).copied().unwrap_or([0, 0, 0, 0])
    }
}

/// An ordered animation: frames with per-frame timing and disposal
///
/// `delays` (in hundredths of a second) and `disposals` are positional and
/// may be shorter than `frames`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    /// Logical canvas size
    pub width: u32,
    pub height: u32,
    pub frames: Vec<PalettedFrame>,
    pub delays: Vec<u16>,
    pub disposals: Vec<Disposal>,
    pub loop_count: LoopCount,
}

impl FrameSequence {
    /// Canvas bounds covering the logical screen and every frame rectangle
    pub fn canvas_size(&self) -> (u32, u32) {
        self.frames.iter().fold((self.width, self.height), |(w, h), frame| {
            (w.max(frame.left + frame.width), h.max(frame.top + frame.height))
        })
    }
}

/// Draw a frame over a fresh transparent canvas
///
/// Transparent palette entries leave the canvas untouched.
pub fn compose_frame(frame: &PalettedFrame, canvas_width: u32, canvas_height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(canvas_width, canvas_height);
    for y in 0..frame.height {
        let cy = frame.top + y;
        if cy >= canvas_height {
            break;
        }
        for x in 0..frame.width {
            let cx = frame.left + x;
            if cx >= canvas_width {
                break;
            }
            let color = frame.color_at(x, y);
            if color[3] != 0 {
                canvas.put_pixel(cx, cy, Rgba(color));
            }
        }
    }
    canvas
}

/// Applies a registry filter to every frame of an animation
#[derive(Debug, Clone)]
pub struct FrameSequenceProcessor {
    registry: FilterRegistry,
    palette: Palette,
}

impl Default for FrameSequenceProcessor {
    fn default() -> Self {
        Self::new(FilterRegistry::new())
    }
}

impl FrameSequenceProcessor {
    pub fn new(registry: FilterRegistry) -> Self {
        Self {
            registry,
            palette: reference_palette(),
        }
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Filter every frame and re-quantize it onto the reference palette
    ///
    /// Output frames are full-canvas, in input order, one per input frame.
    /// Missing delays default to 0 and missing disposals to `Disposal::None`.
    pub fn process(&self, filter: &str, sequence: &FrameSequence) -> Result<FrameSequence, CodecError> {
        if sequence.frames.is_empty() {
            return Err(CodecError::EmptySequence);
        }

        let (width, height) = sequence.canvas_size();
        let palette: Vec<[u8; 4]> = self.palette.to_vec();

        let mut frames = Vec::with_capacity(sequence.frames.len());
        let mut delays = Vec::with_capacity(sequence.frames.len());
        let mut disposals = Vec::with_capacity(sequence.frames.len());

        for (i, frame) in sequence.frames.iter().enumerate() {
            let canvas = compose_frame(frame, width, height);
            let filtered = self.registry.apply(filter, &canvas);
            let indices = quantize_with_transparency(&filtered, &self.palette);

            frames.push(PalettedFrame::full(width, height, palette.clone(), indices));
            delays.push(sequence.delays.get(i).copied().unwrap_or(0));
            disposals.push(sequence.disposals.get(i).copied().unwrap_or_default());
        }

        tracing::debug!(filter, frames = frames.len(), width, height, "processed animation");

        Ok(FrameSequence {
            width,
            height,
            frames,
            delays,
            disposals,
            loop_count: sequence.loop_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::quantize::TRANSPARENT_INDEX;

    /// Two-color palette: 0 transparent, 1 opaque `color`
    fn frame(left: u32, top: u32, width: u32, height: u32, color: [u8; 4], pattern: impl Fn(u32, u32) -> bool) -> PalettedFrame {
        let mut indices = Vec::new();
        for y in 0..height {
            for x in 0..width {
                indices.push(if pattern(x, y) { 1 } else { 0 });
            }
        }
        PalettedFrame {
            left,
            top,
            width,
            height,
            palette: vec![[0, 0, 0, 0], color],
            indices,
        }
    }

    fn sequence(frames: Vec<PalettedFrame>, delays: Vec<u16>, disposals: Vec<Disposal>) -> FrameSequence {
        FrameSequence {
            width: 8,
            height: 8,
            frames,
            delays,
            disposals,
            loop_count: LoopCount::Finite(3),
        }
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let processor = FrameSequenceProcessor::default();
        let result = processor.process("negative", &sequence(vec![], vec![], vec![]));
        assert!(matches!(result, Err(CodecError::EmptySequence)));
    }

    #[test]
    fn test_metadata_copied_and_padded() {
        let processor = FrameSequenceProcessor::default();
        let input = sequence(
            vec![
                frame(0, 0, 8, 8, [255, 0, 0, 255], |_, _| true),
                frame(2, 2, 4, 4, [0, 255, 0, 255], |x, _| x % 2 == 0),
                frame(0, 0, 8, 8, [0, 0, 255, 255], |_, _| true),
            ],
            vec![10, 20],
            vec![Disposal::Background],
        );

        let output = processor.process("greyscale", &input).unwrap();
        assert_eq!(output.frames.len(), 3);
        assert_eq!(output.delays, vec![10, 20, 0]);
        assert_eq!(output.disposals, vec![Disposal::Background, Disposal::None, Disposal::None]);
        assert_eq!(output.loop_count, LoopCount::Finite(3));
        assert_eq!((output.width, output.height), (8, 8));
    }

    #[test]
    fn test_partial_frames_normalized_to_canvas() {
        let processor = FrameSequenceProcessor::default();
        let input = sequence(
            vec![frame(2, 3, 4, 2, [255, 255, 255, 255], |_, _| true)],
            vec![5],
            vec![Disposal::None],
        );

        let output = processor.process("nonexistent", &input).unwrap();
        let out = &output.frames[0];
        assert_eq!((out.left, out.top, out.width, out.height), (0, 0, 8, 8));
        assert_eq!(out.indices.len(), 64);

        for y in 0..8 {
            for x in 0..8 {
                let inside = (2..6).contains(&x) && (3..5).contains(&y);
                let index = out.indices[(y * 8 + x) as usize];
                if inside {
                    assert_eq!(out.palette[index as usize], [255, 255, 255, 255]);
                } else {
                    assert_eq!(index, TRANSPARENT_INDEX);
                }
            }
        }
    }

    #[test]
    fn test_transparency_survives_filtering() {
        let processor = FrameSequenceProcessor::default();
        let input = sequence(
            vec![frame(0, 0, 8, 8, [10, 200, 30, 255], |x, y| (x + y) % 2 == 0)],
            vec![],
            vec![],
        );

        // negative would turn transparent black into opaque-looking white if alpha were lost
        let output = processor.process("negative", &input).unwrap();
        let out = &output.frames[0];
        assert_eq!(out.palette[TRANSPARENT_INDEX as usize][3], 0);
        for y in 0..8u32 {
            for x in 0..8u32 {
                let index = out.indices[(y * 8 + x) as usize];
                if (x + y) % 2 == 1 {
                    assert_eq!(index, TRANSPARENT_INDEX);
                } else {
                    assert_eq!(out.palette[index as usize][3], 255);
                }
            }
        }
    }

    #[test]
    fn test_canvas_grows_to_cover_frames() {
        let mut input = sequence(vec![frame(6, 6, 4, 4, [1, 2, 3, 255], |_, _| true)], vec![], vec![]);
        input.width = 8;
        input.height = 8;
        assert_eq!(input.canvas_size(), (10, 10));
    }
}
