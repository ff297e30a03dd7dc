use std::fmt;

use crate::foundation::core::Rgba8;

pub const DEFAULT_JPEG_QUALITY: u8 = 85;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Gif,
}

impl OutputFormat {
    /// Case-insensitive; anything unrecognized is PNG.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "gif" => Self::Gif,
            _ => Self::Png,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Gif => "GIF",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputSpec {
    pub format: OutputFormat,
    /// 1..=100
    pub jpeg_quality: u8,
    /// Opaque backdrop for formats without alpha.
    pub matte: Rgba8,
}

impl OutputSpec {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            matte: Rgba8::WHITE,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_matte(mut self, matte: Rgba8) -> Self {
        self.matte = matte;
        self
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self::new(OutputFormat::Png)
    }
}
