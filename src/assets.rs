pub mod decode;
pub mod svg_raster;

use std::path::Path;

/// Decode path chosen from the input file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// `.svg`
    Vector,
    /// `.gif`
    Animated,
    /// `.png`, `.jpg`, `.jpeg`, and anything unrecognized.
    Raster,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Self::Vector,
            Some("gif") => Self::Animated,
            _ => Self::Raster,
        }
    }
}
