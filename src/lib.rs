//! imgfit places images into a fixed target box and re-encodes them.
//!
//! A [`Pipeline`] handles one input at a time:
//!
//! - decode raster and animated (GIF) input into a [`FrameSequence`], or rasterize vector (SVG)
//!   input through a [`VectorRasterizer`]
//! - place every frame with one [`PlacementMode`] (stretch, fit, pad, fill)
//! - encode to PNG, JPEG or GIF, flattening alpha or quantizing per frame as the format needs
//!
//! [`run_batch`] fans a file list out over a bounded worker pool.
#![forbid(unsafe_code)]

pub mod assets;
pub mod batch;
pub mod config;
pub mod encode;
mod foundation;
pub mod pipeline;
pub mod render;

pub use crate::assets::InputKind;
pub use crate::assets::svg_raster::{
    RasterRequest, UnavailableRasterizer, VectorRasterizer, VectorSource, ViewportFit,
    default_rasterizer,
};
#[cfg(feature = "svg")]
pub use crate::assets::svg_raster::ResvgRasterizer;
pub use crate::batch::{BatchReport, FileReport, plan_outputs, run_batch, run_job};
pub use crate::config::{ResizeConfig, TargetSize, parse_color};
pub use crate::encode::{OutputFormat, OutputSpec, encode};
pub use crate::foundation::core::{
    DEFAULT_FRAME_MS, Frame, FrameSequence, PixelFormat, RasterImage, Rgba8, TargetBox,
};
pub use crate::foundation::error::{ImgfitError, ImgfitResult};
pub use crate::pipeline::{Job, Pipeline};
pub use crate::render::transform::PlacementMode;
