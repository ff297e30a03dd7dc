use std::io::Cursor;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::assets::InputKind;
use crate::foundation::core::{DEFAULT_FRAME_MS, Frame, FrameSequence, RasterImage};
use crate::foundation::error::{ImgfitError, ImgfitResult};

/// Decode raster or animated input into an ordered frame sequence.
///
/// Vector input is not handled here; it has to go through a
/// [`VectorRasterizer`](crate::assets::svg_raster::VectorRasterizer) first.
pub fn decode_frames(bytes: &[u8], kind: InputKind) -> ImgfitResult<FrameSequence> {
    match kind {
        InputKind::Raster => decode_static(bytes),
        InputKind::Animated => decode_gif(bytes),
        InputKind::Vector => Err(ImgfitError::unsupported(
            "vector input must be rasterized before decoding",
        )),
    }
}

/// One frame, duration 0, loop count 0.
pub fn decode_static(bytes: &[u8]) -> ImgfitResult<FrameSequence> {
    if bytes.is_empty() {
        return Ok(FrameSequence::single(RasterImage::empty()));
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ImgfitError::unsupported(format!("decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    debug!(width = rgba.width(), height = rgba.height(), "decoded still image");
    Ok(FrameSequence::single(RasterImage::from(rgba)))
}

/// Every frame in file order, fully composited onto the logical screen.
pub fn decode_gif(bytes: &[u8]) -> ImgfitResult<FrameSequence> {
    if bytes.is_empty() {
        return Ok(FrameSequence::single(RasterImage::empty()));
    }

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options
        .read_info(Cursor::new(bytes))
        .map_err(|e| ImgfitError::unsupported(format!("read gif header: {e}")))?;

    let width = u32::from(decoder.width());
    let height = u32::from(decoder.height());

    let mut frames = Vec::new();
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let mut restore = canvas.clone();

    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| ImgfitError::unsupported(format!("decode gif frame {}: {e}", frames.len())))?
    {
        let left = u32::from(frame.left);
        let top = u32::from(frame.top);
        let frame_w = u32::from(frame.width);
        let frame_h = u32::from(frame.height);
        let dispose = frame.dispose;

        if dispose == gif::DisposalMethod::Previous {
            restore = canvas.clone();
        }

        for (i, px) in frame.buffer.chunks_exact(4).enumerate() {
            let i = i as u32;
            let (x, y) = (left + i % frame_w.max(1), top + i / frame_w.max(1));
            if px[3] > 0 && x < width && y < height {
                canvas.put_pixel(x, y, Rgba([px[0], px[1], px[2], px[3]]));
            }
        }

        let duration_ms = match u32::from(frame.delay) * 10 {
            0 => DEFAULT_FRAME_MS,
            ms => ms,
        };
        frames.push(Frame::new(RasterImage::from(canvas.clone()), duration_ms));

        match dispose {
            gif::DisposalMethod::Background => {
                for y in top..(top + frame_h).min(height) {
                    for x in left..(left + frame_w).min(width) {
                        canvas.put_pixel(x, y, Rgba([0, 0, 0, 0]));
                    }
                }
            }
            gif::DisposalMethod::Previous => canvas = restore.clone(),
            _ => {}
        }
    }

    // A missing NETSCAPE extension reads as Finite(0); an explicit 0 already maps to Infinite.
    let loop_count = match decoder.repeat() {
        gif::Repeat::Infinite => 0,
        gif::Repeat::Finite(n) => n,
    };

    debug!(
        width,
        height,
        frames = frames.len(),
        loop_count,
        "decoded gif"
    );
    FrameSequence::new(frames, loop_count)
}
