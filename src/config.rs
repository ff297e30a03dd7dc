use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::warn;

use crate::encode::DEFAULT_JPEG_QUALITY;
use crate::foundation::core::{Rgba8, TargetBox};
use crate::foundation::error::{ImgfitError, ImgfitResult};
use crate::pipeline::Job;
use crate::render::transform::{PlacementMode, scale_dim};

/// Largest accepted target edge (the GIF container limit).
pub const MAX_TARGET_DIM: u32 = u16::MAX as u32;

pub const DEFAULT_OUT_DIR: &str = "output";

/// Unvalidated job settings, as read from a JSON job file or assembled from CLI flags.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub mode: PlacementMode,
    /// `[r, g, b]` or `[r, g, b, a]`, each 0..=255. White when absent.
    pub background: Option<Vec<i64>>,
    pub jpeg_quality: Option<i64>,
    pub out_dir: Option<PathBuf>,
    pub threads: Option<usize>,
}

impl ResizeConfig {
    pub fn from_json_file(path: &Path) -> ImgfitResult<Self> {
        let f = File::open(path).with_context(|| format!("open job file '{}'", path.display()))?;
        let cfg = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse job file '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Every global check, run once before any file is touched.
    pub fn validate(&self) -> ImgfitResult<Job> {
        let size = TargetSize {
            width: self.width.map(|v| check_dim("width", v)).transpose()?,
            height: self.height.map(|v| check_dim("height", v)).transpose()?,
        };
        if size.width.is_none() && size.height.is_none() {
            return Err(ImgfitError::dimension(
                "at least one of width or height is required",
            ));
        }

        let background = match &self.background {
            Some(components) => color_from_components(components)?,
            None => Rgba8::WHITE,
        };

        let jpeg_quality = match self.jpeg_quality {
            None => DEFAULT_JPEG_QUALITY,
            Some(q) if (1..=100).contains(&q) => q as u8,
            Some(q) => {
                let clamped = q.clamp(1, 100) as u8;
                warn!(requested = q, used = clamped, "jpeg quality out of range, clamping");
                clamped
            }
        };

        if self.threads == Some(0) {
            return Err(ImgfitError::dimension("threads must be >= 1 when set"));
        }

        Ok(Job {
            size,
            mode: self.mode,
            background,
            jpeg_quality,
            out_dir: self
                .out_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
            threads: self.threads,
        })
    }
}

fn check_dim(name: &str, v: i64) -> ImgfitResult<u32> {
    if v <= 0 || v > i64::from(MAX_TARGET_DIM) {
        return Err(ImgfitError::dimension(format!(
            "{name} must be in 1..={MAX_TARGET_DIM}, got {v}"
        )));
    }
    Ok(v as u32)
}

/// Requested output size. A missing side is derived from each source's aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetSize {
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    pub fn both(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    /// Box for a source of `(ow, oh)`. A degenerate source reuses the known side for both.
    pub fn resolve(&self, source: (u32, u32), background: Rgba8) -> ImgfitResult<TargetBox> {
        let (ow, oh) = source;
        let (w, h) = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, derive_side(w, oh, ow).unwrap_or(w)),
            (None, Some(h)) => (derive_side(h, ow, oh).unwrap_or(h), h),
            (None, None) => {
                return Err(ImgfitError::dimension(
                    "at least one of width or height is required",
                ));
            }
        };
        TargetBox::new(w.min(MAX_TARGET_DIM), h.min(MAX_TARGET_DIM), background)
    }
}

/// `round(known * other / same)`, at least 1.
fn derive_side(known: u32, other: u32, same: u32) -> Option<u32> {
    if other == 0 || same == 0 {
        return None;
    }
    Some(scale_dim(other, f64::from(known) / f64::from(same)))
}

/// Parse `"r,g,b"` or `"r,g,b,a"`.
pub fn parse_color(s: &str) -> ImgfitResult<Rgba8> {
    let components = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| ImgfitError::color(format!("'{s}' is not a list of integers")))
        })
        .collect::<ImgfitResult<Vec<_>>>()?;
    color_from_components(&components)
}

/// Three components imply full opacity.
pub fn color_from_components(components: &[i64]) -> ImgfitResult<Rgba8> {
    if let Some(bad) = components.iter().find(|c| !(0..=255).contains(*c)) {
        return Err(ImgfitError::color(format!(
            "component {bad} is outside 0..=255"
        )));
    }
    let c = |i: usize| components[i] as u8;
    match components.len() {
        3 => Ok(Rgba8::rgb(c(0), c(1), c(2))),
        4 => Ok(Rgba8::new(c(0), c(1), c(2), c(3))),
        n => Err(ImgfitError::color(format!(
            "expected 3 or 4 components, got {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ResizeConfig {
        ResizeConfig {
            width: Some(800),
            height: Some(600),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_fill_in() {
        let job = base().validate().unwrap();
        assert_eq!(job.size, TargetSize::exact(800, 600));
        assert_eq!(job.mode, PlacementMode::Pad);
        assert_eq!(job.background, Rgba8::WHITE);
        assert_eq!(job.jpeg_quality, 85);
        assert_eq!(job.out_dir, PathBuf::from("output"));
    }

    #[test]
    fn bad_dimensions_are_global_errors() {
        let cases = [
            (Some(0), Some(10)),
            (Some(10), Some(-3)),
            (None, None),
            (Some(70_000), None),
        ];
        for (w, h) in cases {
            let cfg = ResizeConfig {
                width: w,
                height: h,
                ..Default::default()
            };
            let err = cfg.validate().unwrap_err();
            assert!(matches!(err, ImgfitError::InvalidDimension(_)), "{w:?}x{h:?}");
            assert!(err.is_config_error());
        }
    }

    #[test]
    fn bad_colors_are_global_errors() {
        for bg in [vec![1, 2], vec![0, 0, 256], vec![-1, 0, 0], vec![1, 2, 3, 4, 5]] {
            let cfg = ResizeConfig {
                background: Some(bg),
                ..base()
            };
            assert!(matches!(cfg.validate().unwrap_err(), ImgfitError::InvalidColor(_)));
        }
    }

    #[test]
    fn quality_out_of_range_is_clamped() {
        let cfg = ResizeConfig {
            jpeg_quality: Some(150),
            ..base()
        };
        assert_eq!(cfg.validate().unwrap().jpeg_quality, 100);
    }

    #[test]
    fn zero_threads_rejected() {
        let cfg = ResizeConfig {
            threads: Some(0),
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parse_color_text_forms() {
        assert_eq!(parse_color("255, 128,0").unwrap(), Rgba8::rgb(255, 128, 0));
        assert_eq!(parse_color("1,2,3,4").unwrap(), Rgba8::new(1, 2, 3, 4));
        assert!(matches!(parse_color("red").unwrap_err(), ImgfitError::InvalidColor(_)));
        assert!(matches!(parse_color("1,2").unwrap_err(), ImgfitError::InvalidColor(_)));
    }

    #[test]
    fn json_job_round_trip() {
        let json = r#"{"width": 320, "mode": "fill", "background": [0, 0, 0], "jpeg_quality": 70}"#;
        let cfg: ResizeConfig = serde_json::from_str(json).unwrap();
        let job = cfg.validate().unwrap();
        assert_eq!(job.mode, PlacementMode::Fill);
        assert_eq!(job.size.width, Some(320));
        assert_eq!(job.size.height, None);
        assert_eq!(job.background, Rgba8::rgb(0, 0, 0));
        assert_eq!(job.jpeg_quality, 70);
        assert!(serde_json::from_str::<ResizeConfig>(r#"{"colour": [1,2,3]}"#).is_err());
    }

    #[test]
    fn missing_side_follows_source_aspect() {
        let bg = Rgba8::WHITE;
        let w_only = TargetSize {
            width: Some(200),
            height: None,
        };
        let t = w_only.resolve((100, 50), bg).unwrap();
        assert_eq!((t.width, t.height), (200, 100));

        let h_only = TargetSize {
            width: None,
            height: Some(30),
        };
        let t = h_only.resolve((100, 50), bg).unwrap();
        assert_eq!((t.width, t.height), (60, 30));

        let t = h_only.resolve((0, 0), bg).unwrap();
        assert_eq!((t.width, t.height), (30, 30));
    }
}
