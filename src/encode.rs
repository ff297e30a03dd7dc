pub mod animated;
pub mod format;
pub mod still;

use tracing::debug;

use crate::foundation::core::FrameSequence;
use crate::foundation::error::{ImgfitError, ImgfitResult};

pub use format::{DEFAULT_JPEG_QUALITY, OutputFormat, OutputSpec};

/// Serialize a size-uniform frame sequence into `spec.format`.
///
/// PNG and JPEG keep only the first frame.
#[tracing::instrument(skip(seq), fields(frames = seq.len()))]
pub fn encode(seq: &FrameSequence, spec: &OutputSpec) -> ImgfitResult<Vec<u8>> {
    if !seq.is_uniform() {
        return Err(ImgfitError::encode(
            "frames must share one size before encoding",
        ));
    }

    let bytes = match spec.format {
        OutputFormat::Png => still::encode_png(&seq.first().image)?,
        OutputFormat::Jpeg => {
            still::encode_jpeg(&seq.first().image, spec.jpeg_quality, spec.matte)?
        }
        OutputFormat::Gif => animated::encode_gif(seq)?,
    };

    if seq.is_animated() && spec.format != OutputFormat::Gif {
        debug!(
            dropped = seq.len() - 1,
            format = %spec.format,
            "single-frame format, keeping first frame only"
        );
    }
    debug!(format = %spec.format, bytes = bytes.len(), "encoded");
    Ok(bytes)
}
