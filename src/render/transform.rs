use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use image::imageops::FilterType;
use tracing::debug;

use crate::foundation::core::{RasterImage, TargetBox};
use crate::foundation::error::{ImgfitError, ImgfitResult};
use crate::render::composite;

/// Resampling filter for every non-degenerate scale operation.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// How a source is placed into a [`TargetBox`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    /// Independent x/y scale to exactly the box.
    Stretch,
    /// Uniform scale to fit inside the box; output may be smaller than the box.
    Fit,
    /// Uniform fit, centered on a background canvas of exactly the box size.
    #[default]
    Pad,
    /// Uniform cover, center-cropped to exactly the box size.
    Fill,
}

impl PlacementMode {
    pub const ALL: [Self; 4] = [Self::Stretch, Self::Fit, Self::Pad, Self::Fill];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stretch => "stretch",
            Self::Fit => "fit",
            Self::Pad => "pad",
            Self::Fill => "fill",
        }
    }
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementMode {
    type Err = ImgfitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ImgfitError::Other(anyhow::anyhow!(
                    "unknown placement mode '{s}' (expected stretch, fit, pad or fill)"
                ))
            })
    }
}

/// Resolved geometry for one placement, computed before touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Degenerate source: emit a background canvas of the box size.
    Blank { width: u32, height: u32 },
    /// Resample straight to `width x height` (stretch and fit).
    Resample { width: u32, height: u32 },
    /// Resample to `scaled`, then center on a box-sized canvas at `(left, top)`.
    Letterbox {
        scaled: (u32, u32),
        left: u32,
        top: u32,
    },
    /// Resample to `scaled`, then cut the box-sized window at `(left, top)`.
    CoverCrop {
        scaled: (u32, u32),
        left: u32,
        top: u32,
    },
}

impl Placement {
    pub fn output_size(&self, target: &TargetBox) -> (u32, u32) {
        match *self {
            Self::Blank { width, height } | Self::Resample { width, height } => (width, height),
            Self::Letterbox { .. } | Self::CoverCrop { .. } => (target.width, target.height),
        }
    }
}

/// Round-half-away-from-zero, never below one pixel.
pub fn scale_dim(v: u32, s: f64) -> u32 {
    let scaled = (f64::from(v) * s).round();
    if scaled < 1.0 {
        1
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

pub fn plan(mode: PlacementMode, source: (u32, u32), target: &TargetBox) -> Placement {
    let (ow, oh) = source;
    let (tw, th) = (target.width, target.height);
    if ow == 0 || oh == 0 {
        return Placement::Blank {
            width: tw,
            height: th,
        };
    }

    let sx = f64::from(tw) / f64::from(ow);
    let sy = f64::from(th) / f64::from(oh);

    match mode {
        PlacementMode::Stretch => Placement::Resample {
            width: tw,
            height: th,
        },
        PlacementMode::Fit => {
            let s = sx.min(sy);
            Placement::Resample {
                width: scale_dim(ow, s).min(tw),
                height: scale_dim(oh, s).min(th),
            }
        }
        PlacementMode::Pad => {
            let s = sx.min(sy);
            let nw = scale_dim(ow, s).min(tw);
            let nh = scale_dim(oh, s).min(th);
            Placement::Letterbox {
                scaled: (nw, nh),
                left: (tw - nw) / 2,
                top: (th - nh) / 2,
            }
        }
        PlacementMode::Fill => {
            let s = sx.max(sy);
            let nw = scale_dim(ow, s).max(tw);
            let nh = scale_dim(oh, s).max(th);
            Placement::CoverCrop {
                scaled: (nw, nh),
                left: (nw - tw) / 2,
                top: (nh - th) / 2,
            }
        }
    }
}

/// Place `src` into `target` under `mode`. The result is always RGBA8.
pub fn apply(
    src: &RasterImage,
    mode: PlacementMode,
    target: &TargetBox,
) -> ImgfitResult<RasterImage> {
    let placement = plan(mode, src.dimensions(), target);
    debug!(
        %mode,
        src_w = src.width(),
        src_h = src.height(),
        ?placement,
        "placing frame"
    );

    let out = match placement {
        Placement::Blank { width, height } => composite::canvas(width, height, target.background),
        Placement::Resample { width, height } => resample(&src.to_rgba_image()?, width, height),
        Placement::Letterbox {
            scaled: (nw, nh),
            left,
            top,
        } => {
            let scaled = resample(&src.to_rgba_image()?, nw, nh);
            let mut canvas = composite::canvas(target.width, target.height, target.background);
            composite::paste_over(&mut canvas, &scaled, i64::from(left), i64::from(top));
            canvas
        }
        Placement::CoverCrop {
            scaled: (nw, nh),
            left,
            top,
        } => {
            let scaled = resample(&src.to_rgba_image()?, nw, nh);
            composite::crop(&scaled, left, top, target.width, target.height)?
        }
    };

    Ok(RasterImage::from(out))
}

fn resample(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if src.dimensions() == (width, height) {
        return src.clone();
    }
    image::imageops::resize(src, width, height, RESAMPLE_FILTER)
}
