use std::path::PathBuf;

pub type ImgfitResult<T> = Result<T, ImgfitError>;

#[derive(thiserror::Error, Debug)]
pub enum ImgfitError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("rasterization unavailable: {0}")]
    RasterizationUnavailable(String),

    #[error("rasterization error: {0}")]
    RasterizationError(String),

    /// A target side or the worker count is out of range.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("encode error: {0}")]
    EncodeError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImgfitError {
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound(path.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn rasterization_unavailable(msg: impl Into<String>) -> Self {
        Self::RasterizationUnavailable(msg.into())
    }

    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::RasterizationError(msg.into())
    }

    pub fn dimension(msg: impl Into<String>) -> Self {
        Self::InvalidDimension(msg.into())
    }

    pub fn color(msg: impl Into<String>) -> Self {
        Self::InvalidColor(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::EncodeError(msg.into())
    }

    /// Configuration errors invalidate a whole batch; everything else belongs to one file.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidDimension(_) | Self::InvalidColor(_))
    }
}
