use image::RgbaImage;

use crate::foundation::core::{RasterImage, Rgba8};
use crate::foundation::error::{ImgfitError, ImgfitResult};

/// Straight-alpha source-over for a single pixel.
pub fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    // Scaled by 255*255 to keep the division exact until the end.
    let out_a = sa * 255 + da * inv;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * inv;
        out[i] = ((c + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = ((out_a + 127) / 255).min(255) as u8;
    out
}

/// Blank canvas of `color`.
pub fn canvas(width: u32, height: u32, color: Rgba8) -> RgbaImage {
    RgbaImage::from_pixel(width, height, image::Rgba(color.to_array()))
}

/// Composite `src` onto `dst` with its top-left corner at `(left, top)`.
///
/// Pixels of `src` falling outside `dst` are dropped; `dst` pixels not covered by `src` are left
/// untouched.
pub fn paste_over(dst: &mut RgbaImage, src: &RgbaImage, left: i64, top: i64) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    for (sx, sy, px) in src.enumerate_pixels() {
        let x = left + i64::from(sx);
        let y = top + i64::from(sy);
        if x < 0 || y < 0 || x >= dw || y >= dh {
            continue;
        }
        let d = dst.get_pixel_mut(x as u32, y as u32);
        d.0 = over(d.0, px.0);
    }
}

/// Copy the `width x height` window starting at `(left, top)`.
pub fn crop(
    src: &RgbaImage,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> ImgfitResult<RgbaImage> {
    if left.saturating_add(width) > src.width() || top.saturating_add(height) > src.height() {
        return Err(ImgfitError::Other(anyhow::anyhow!(
            "crop window {width}x{height}+{left}+{top} exceeds {}x{}",
            src.width(),
            src.height()
        )));
    }
    Ok(image::imageops::crop_imm(src, left, top, width, height).to_image())
}

/// Blend every pixel onto an opaque `bg`, weighting by alpha. Output is packed RGB8.
pub fn flatten_to_rgb8(src: &RasterImage, bg: Rgba8) -> ImgfitResult<image::RgbImage> {
    let rgba = src.to_rgba_image()?;
    let (width, height) = rgba.dimensions();
    let mut dst = Vec::with_capacity(width as usize * height as usize * 3);

    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    for s in rgba.as_raw().chunks_exact(4) {
        let a = u16::from(s[3]);
        if a == 255 {
            dst.extend_from_slice(&s[..3]);
            continue;
        }

        let inv = 255u16 - a;
        let r = mul_div255(u16::from(s[0]), a) + mul_div255(bg_r, inv);
        let g = mul_div255(u16::from(s[1]), a) + mul_div255(bg_g, inv);
        let b = mul_div255(u16::from(s[2]), a) + mul_div255(bg_b, inv);
        dst.extend_from_slice(&[r.min(255) as u8, g.min(255) as u8, b.min(255) as u8]);
    }

    image::RgbImage::from_raw(width, height, dst)
        .ok_or_else(|| ImgfitError::Other(anyhow::anyhow!("rgb buffer size mismatch")))
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
