use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::foundation::core::{RasterImage, Rgba8};
use crate::foundation::error::{ImgfitError, ImgfitResult};
use crate::render::composite;

/// RGBA PNG, alpha untouched.
pub fn encode_png(img: &RasterImage) -> ImgfitResult<Vec<u8>> {
    let rgba = img.to_rgba_image()?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ImgfitError::encode(format!("png: {e}")))?;
    Ok(buf)
}

/// RGB JPEG. Translucent pixels are blended onto `matte` first.
pub fn encode_jpeg(img: &RasterImage, quality: u8, matte: Rgba8) -> ImgfitResult<Vec<u8>> {
    if img.has_transparency() {
        debug!(?matte, "flattening alpha for jpeg");
    }
    let rgb = composite::flatten_to_rgb8(img, matte)?;
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| ImgfitError::encode(format!("jpeg: {e}")))?;
    Ok(buf)
}
