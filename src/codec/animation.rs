/// GIF decoding and encoding at the frame level
///
/// The `image` crate's GIF decoder composites frames and drops disposal and
/// loop metadata, so animations go through the `gif` crate directly.

use std::borrow::Cow;
use std::io::Cursor;

use super::quantize::TRANSPARENT_INDEX;
use super::sequence::{Disposal, FrameSequence, LoopCount, PalettedFrame};
use crate::error::CodecError;

impl From<gif::DisposalMethod> for Disposal {
    fn from(method: gif::DisposalMethod) -> Self {
        match method {
            gif::DisposalMethod::Any => Disposal::Unspecified,
            gif::DisposalMethod::Keep => Disposal::None,
            gif::DisposalMethod::Background => Disposal::Background,
            gif::DisposalMethod::Previous => Disposal::Previous,
        }
    }
}

impl From<Disposal> for gif::DisposalMethod {
    fn from(disposal: Disposal) -> Self {
        match disposal {
            Disposal::Unspecified => gif::DisposalMethod::Any,
            Disposal::None => gif::DisposalMethod::Keep,
            Disposal::Background => gif::DisposalMethod::Background,
            Disposal::Previous => gif::DisposalMethod::Previous,
        }
    }
}

impl From<gif::Repeat> for LoopCount {
    fn from(repeat: gif::Repeat) -> Self {
        match repeat {
            gif::Repeat::Infinite => LoopCount::Infinite,
            gif::Repeat::Finite(n) => LoopCount::Finite(n),
        }
    }
}

/// Expand a flat RGB color table into RGBA entries
fn rgba_palette(rgb: &[u8], transparent: Option<u8>) -> Vec<[u8; 4]> {
    let mut palette: Vec<[u8; 4]> = rgb
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2], 255])
        .collect();
    if let Some(entry) = transparent.and_then(|t| palette.get_mut(t as usize)) {
        entry[3] = 0;
    }
    palette
}

/// Decode every frame of a GIF without compositing
pub fn decode_gif(data: &[u8]) -> Result<FrameSequence, CodecError> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(Cursor::new(data))?;

    let width = decoder.width() as u32;
    let height = decoder.height() as u32;
    let global_palette = decoder.global_palette().map(|p| p.to_vec()).unwrap_or_default();

    let mut frames = Vec::new();
    let mut delays = Vec::new();
    let mut disposals = Vec::new();

    while let Some(frame) = decoder.read_next_frame()? {
        let table = frame.palette.as_deref().unwrap_or(&global_palette[..]);
        frames.push(PalettedFrame {
            left: frame.left as u32,
            top: frame.top as u32,
            width: frame.width as u32,
            height: frame.height as u32,
            palette: rgba_palette(table, frame.transparent),
            indices: frame.buffer.to_vec(),
        });
        delays.push(frame.delay);
        disposals.push(Disposal::from(frame.dispose));
    }

    Ok(FrameSequence {
        width,
        height,
        frames,
        delays,
        disposals,
        loop_count: LoopCount::from(decoder.repeat()),
    })
}

fn gif_dimension(value: u32) -> Result<u16, CodecError> {
    u16::try_from(value).map_err(|_| CodecError::DimensionOverflow(value))
}

/// Encode a sequence as GIF, each frame with its own color table
///
/// Palette slot 0 is written as the transparent index.
pub fn encode_gif(sequence: &FrameSequence) -> Result<Vec<u8>, CodecError> {
    let (width, height) = sequence.canvas_size();
    let mut buf = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut buf, gif_dimension(width)?, gif_dimension(height)?, &[])?;
        match sequence.loop_count {
            // No application extension at all means "play once"
            LoopCount::Finite(0) => {}
            LoopCount::Finite(n) => encoder.set_repeat(gif::Repeat::Finite(n))?,
            LoopCount::Infinite => encoder.set_repeat(gif::Repeat::Infinite)?,
        }

        for (i, frame) in sequence.frames.iter().enumerate() {
            let palette: Vec<u8> = frame.palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
            let has_transparency = frame.palette.get(TRANSPARENT_INDEX as usize).is_some_and(|c| c[3] == 0);

            let mut out = gif::Frame::default();
            out.left = gif_dimension(frame.left)?;
            out.top = gif_dimension(frame.top)?;
            out.width = gif_dimension(frame.width)?;
            out.height = gif_dimension(frame.height)?;
            out.palette = Some(palette);
            out.transparent = has_transparency.then_some(TRANSPARENT_INDEX);
            out.buffer = Cow::Borrowed(frame.indices.as_slice());
            out.delay = sequence.delays.get(i).copied().unwrap_or(0);
            out.dispose = sequence.disposals.get(i).copied().unwrap_or_default().into();
            encoder.write_frame(&out)?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::quantize::reference_palette;
    use crate::codec::sequence::FrameSequenceProcessor;

    fn two_frame_gif() -> Vec<u8> {
        let palette = vec![[0, 0, 0, 0], [255, 0, 0, 255], [0, 0, 255, 255]];
        let sequence = FrameSequence {
            width: 4,
            height: 4,
            frames: vec![
                PalettedFrame::full(4, 4, palette.clone(), vec![1; 16]),
                PalettedFrame {
                    left: 1,
                    top: 1,
                    width: 2,
                    height: 2,
                    palette,
                    indices: vec![2, 0, 0, 2],
                },
            ],
            delays: vec![7, 9],
            disposals: vec![Disposal::None, Disposal::Background],
            loop_count: LoopCount::Infinite,
        };
        encode_gif(&sequence).unwrap()
    }

    #[test]
    fn test_decode_keeps_frame_metadata() {
        let decoded = decode_gif(&two_frame_gif()).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 4));
        assert_eq!(decoded.frames.len(), 2);
        assert_eq!(decoded.delays, vec![7, 9]);
        assert_eq!(decoded.disposals, vec![Disposal::None, Disposal::Background]);
        assert_eq!(decoded.loop_count, LoopCount::Infinite);

        let second = &decoded.frames[1];
        assert_eq!((second.left, second.top, second.width, second.height), (1, 1, 2, 2));
        assert_eq!(second.color_at(0, 0), [0, 0, 255, 255]);
        assert_eq!(second.color_at(1, 0)[3], 0);
    }

    #[test]
    fn test_processed_gif_reencodes() {
        let decoded = decode_gif(&two_frame_gif()).unwrap();
        let processed = FrameSequenceProcessor::default().process("mint", &decoded).unwrap();
        let bytes = encode_gif(&processed).unwrap();

        let again = decode_gif(&bytes).unwrap();
        assert_eq!(again.frames.len(), 2);
        assert_eq!(again.delays, vec![7, 9]);
        assert_eq!(again.loop_count, LoopCount::Infinite);
        for frame in &again.frames {
            assert_eq!((frame.width, frame.height), (4, 4));
            assert_eq!(frame.palette.len(), reference_palette().len());
            assert_eq!(frame.palette[0][3], 0);
        }
        // Outside the second frame's rectangle nothing was drawn
        assert_eq!(again.frames[1].indices[0], TRANSPARENT_INDEX);
    }

    #[test]
    fn test_oversized_canvas_is_rejected() {
        // Offset pushes the canvas past what a GIF header can describe
        let sequence = FrameSequence {
            width: 4,
            height: 4,
            frames: vec![PalettedFrame {
                left: 65_530,
                top: 0,
                width: 10,
                height: 1,
                palette: vec![[0, 0, 0, 0], [255, 255, 255, 255]],
                indices: vec![1; 10],
            }],
            delays: vec![0],
            disposals: vec![Disposal::None],
            loop_count: LoopCount::Infinite,
        };
        assert!(matches!(encode_gif(&sequence), Err(CodecError::DimensionOverflow(65_540))));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(decode_gif(b"definitely not a gif"), Err(CodecError::GifDecode(_))));
    }
}
