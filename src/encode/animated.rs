use std::borrow::Cow;

use tracing::debug;

use crate::foundation::core::{FrameSequence, PixelFormat, RasterImage};
use crate::foundation::error::{ImgfitError, ImgfitResult};

/// NeuQuant sampling factor: 1 is best quality, 30 fastest.
pub const QUANTIZE_SPEED: i32 = 10;

/// Reduce one RGBA frame to its own adaptive palette (at most 256 entries).
///
/// Fully transparent pixels map to a reserved transparent index.
pub fn quantize_frame(img: &RasterImage) -> ImgfitResult<RasterImage> {
    if let PixelFormat::Indexed { .. } = img.format() {
        return Ok(img.clone());
    }
    let (w, h) = gif_dims(img)?;
    let mut rgba = img.data().to_vec();
    // The quantizer keys transparency on a single RGB value, so every hidden pixel must share it.
    for px in rgba.chunks_exact_mut(4) {
        if px[3] == 0 {
            px.copy_from_slice(&[0, 0, 0, 0]);
        }
    }
    let frame = gif::Frame::from_rgba_speed(w, h, &mut rgba, QUANTIZE_SPEED);

    let palette = frame
        .palette
        .as_deref()
        .unwrap_or_default()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    RasterImage::from_parts(
        img.width(),
        img.height(),
        PixelFormat::Indexed {
            palette,
            transparent: frame.transparent,
        },
        frame.buffer.into_owned(),
    )
}

/// Milliseconds to GIF centiseconds, nearest, keeping non-zero delays non-zero.
pub fn ms_to_centis(ms: u32) -> u16 {
    if ms == 0 {
        return 0;
    }
    (ms.saturating_add(5) / 10).clamp(1, u32::from(u16::MAX)) as u16
}

/// Per-frame palettes, original per-frame delays, sequence loop count.
pub fn encode_gif(seq: &FrameSequence) -> ImgfitResult<Vec<u8>> {
    let (w, h) = gif_dims(&seq.first().image)?;

    let mut buf = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut buf, w, h, &[])
            .map_err(|e| ImgfitError::encode(format!("gif header: {e}")))?;

        let repeat = match seq.loop_count() {
            0 => gif::Repeat::Infinite,
            n => gif::Repeat::Finite(n),
        };
        encoder
            .set_repeat(repeat)
            .map_err(|e| ImgfitError::encode(format!("gif loop extension: {e}")))?;

        for (i, frame) in seq.frames().iter().enumerate() {
            let indexed = quantize_frame(&frame.image)?;
            let PixelFormat::Indexed {
                palette,
                transparent,
            } = indexed.format()
            else {
                return Err(ImgfitError::encode("quantizer returned a non-indexed frame"));
            };

            let out = gif::Frame {
                width: w,
                height: h,
                delay: ms_to_centis(frame.duration_ms),
                // Frames are full-canvas; clear before the next so transparency does not
                // show the previous frame through.
                dispose: gif::DisposalMethod::Background,
                transparent: *transparent,
                palette: Some(palette.iter().flatten().copied().collect()),
                buffer: Cow::Borrowed(indexed.data()),
                ..gif::Frame::default()
            };
            encoder
                .write_frame(&out)
                .map_err(|e| ImgfitError::encode(format!("gif frame {i}: {e}")))?;
        }
    }

    debug!(
        frames = seq.len(),
        loop_count = seq.loop_count(),
        bytes = buf.len(),
        "wrote gif"
    );
    Ok(buf)
}

fn gif_dims(img: &RasterImage) -> ImgfitResult<(u16, u16)> {
    let w = u16::try_from(img.width()).ok().filter(|&v| v > 0);
    let h = u16::try_from(img.height()).ok().filter(|&v| v > 0);
    match (w, h) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(ImgfitError::encode(format!(
            "gif frames must be 1..=65535 pixels per side, got {}x{}",
            img.width(),
            img.height()
        ))),
    }
}
