use std::path::Path;
use std::sync::Arc;

use crate::foundation::core::RasterImage;
use crate::foundation::error::{ImgfitError, ImgfitResult};

/// Largest raster edge we are willing to allocate for a vector source.
pub const MAX_RASTER_DIM: u32 = 16_384;

/// A vector document plus where its relative `href`s resolve from.
#[derive(Clone, Copy, Debug)]
pub struct VectorSource<'a> {
    pub bytes: &'a [u8],
    pub resources_dir: Option<&'a Path>,
}

impl<'a> VectorSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            resources_dir: None,
        }
    }

    pub fn with_resources_dir(mut self, dir: Option<&'a Path>) -> Self {
        self.resources_dir = dir;
        self
    }
}

/// How the document's own box is mapped onto a requested canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportFit {
    /// Independent x/y scale; the document covers the canvas exactly.
    Stretch,
    /// Uniform scale to fit, centered on a transparent canvas.
    Contain,
    /// Uniform scale to cover, centered and clipped to the canvas.
    Cover,
}

/// Canvas size plus the mapping of the document onto it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterRequest {
    pub width: u32,
    pub height: u32,
    pub fit: ViewportFit,
}

impl RasterRequest {
    pub fn new(width: u32, height: u32, fit: ViewportFit) -> Self {
        Self { width, height, fit }
    }

    /// Where a `doc_w x doc_h` document lands on the canvas, as `(left, top, width, height)`.
    ///
    /// Content edges sit on whole pixels, rounded the same way raster placement rounds.
    pub fn content_rect(&self, doc_w: f64, doc_h: f64) -> (f64, f64, f64, f64) {
        let (cw, ch) = (f64::from(self.width), f64::from(self.height));
        let uniform = |s: f64, clamp: fn(f64, f64) -> f64| {
            let w = clamp((doc_w * s).round().max(1.0), cw);
            let h = clamp((doc_h * s).round().max(1.0), ch);
            (((cw - w) / 2.0).trunc(), ((ch - h) / 2.0).trunc(), w, h)
        };
        match self.fit {
            ViewportFit::Stretch => (0.0, 0.0, cw, ch),
            ViewportFit::Contain => uniform((cw / doc_w).min(ch / doc_h), f64::min),
            ViewportFit::Cover => uniform((cw / doc_w).max(ch / doc_h), f64::max),
        }
    }
}

/// External rasterization engine.
///
/// Implementations report a missing engine as [`ImgfitError::RasterizationUnavailable`] at call
/// time, never at construction.
pub trait VectorRasterizer: Send + Sync {
    /// Intrinsic pixel size of the document (rounded up, at least 1x1).
    fn intrinsic_size(&self, source: &VectorSource<'_>) -> ImgfitResult<(u32, u32)>;

    /// Rasterize to straight RGBA8 onto the requested canvas, else at the intrinsic size.
    fn rasterize(
        &self,
        source: &VectorSource<'_>,
        request: Option<RasterRequest>,
    ) -> ImgfitResult<RasterImage>;
}

/// Stand-in used when no engine is compiled in.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableRasterizer;

impl UnavailableRasterizer {
    fn err() -> ImgfitError {
        ImgfitError::rasterization_unavailable(
            "imgfit was built without the `svg` feature; vector input cannot be rasterized",
        )
    }
}

impl VectorRasterizer for UnavailableRasterizer {
    fn intrinsic_size(&self, _source: &VectorSource<'_>) -> ImgfitResult<(u32, u32)> {
        Err(Self::err())
    }

    fn rasterize(
        &self,
        _source: &VectorSource<'_>,
        _request: Option<RasterRequest>,
    ) -> ImgfitResult<RasterImage> {
        Err(Self::err())
    }
}

/// The best engine this build has.
pub fn default_rasterizer() -> Arc<dyn VectorRasterizer> {
    #[cfg(feature = "svg")]
    {
        Arc::new(ResvgRasterizer::new())
    }
    #[cfg(not(feature = "svg"))]
    {
        Arc::new(UnavailableRasterizer)
    }
}

#[cfg_attr(not(feature = "svg"), allow(dead_code))]
fn to_px(v: f32) -> ImgfitResult<u32> {
    if !v.is_finite() || v <= 0.0 {
        return Err(ImgfitError::rasterization("svg has invalid width/height"));
    }
    let px = (v.ceil() as u32).max(1);
    if px > MAX_RASTER_DIM {
        return Err(ImgfitError::rasterization(format!(
            "svg size {px} exceeds {MAX_RASTER_DIM}"
        )));
    }
    Ok(px)
}

#[cfg(feature = "svg")]
pub use resvg_engine::ResvgRasterizer;

#[cfg(feature = "svg")]
mod resvg_engine {
    use super::*;

    /// `usvg` parsing plus `resvg` rendering, with the system font database loaded once.
    #[derive(Clone)]
    pub struct ResvgRasterizer {
        fontdb: Arc<usvg::fontdb::Database>,
    }

    impl std::fmt::Debug for ResvgRasterizer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ResvgRasterizer")
                .field("font_faces", &self.fontdb.len())
                .finish()
        }
    }

    impl Default for ResvgRasterizer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ResvgRasterizer {
        pub fn new() -> Self {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            Self::with_fontdb(Arc::new(db))
        }

        pub fn with_fontdb(fontdb: Arc<usvg::fontdb::Database>) -> Self {
            Self { fontdb }
        }

        fn parse(&self, source: &VectorSource<'_>) -> ImgfitResult<usvg::Tree> {
            let opts = usvg::Options {
                resources_dir: source.resources_dir.map(Path::to_path_buf),
                fontdb: Arc::clone(&self.fontdb),
                ..Default::default()
            };
            usvg::Tree::from_data(source.bytes, &opts)
                .map_err(|e| ImgfitError::rasterization(format!("parse svg tree: {e}")))
        }
    }

    impl VectorRasterizer for ResvgRasterizer {
        fn intrinsic_size(&self, source: &VectorSource<'_>) -> ImgfitResult<(u32, u32)> {
            let tree = self.parse(source)?;
            Ok((to_px(tree.size().width())?, to_px(tree.size().height())?))
        }

        #[tracing::instrument(skip(self, source), fields(bytes = source.bytes.len()))]
        fn rasterize(
            &self,
            source: &VectorSource<'_>,
            request: Option<RasterRequest>,
        ) -> ImgfitResult<RasterImage> {
            let tree = self.parse(source)?;
            let request = match request {
                Some(r) => {
                    if r.width == 0
                        || r.height == 0
                        || r.width > MAX_RASTER_DIM
                        || r.height > MAX_RASTER_DIM
                    {
                        return Err(ImgfitError::rasterization(format!(
                            "cannot rasterize at {}x{}",
                            r.width, r.height
                        )));
                    }
                    r
                }
                None => RasterRequest::new(
                    to_px(tree.size().width())?,
                    to_px(tree.size().height())?,
                    ViewportFit::Stretch,
                ),
            };
            let (width, height) = (request.width, request.height);

            let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
                .ok_or_else(|| ImgfitError::rasterization("failed to allocate svg pixmap"))?;

            let (doc_w, doc_h) = (
                f64::from(tree.size().width()),
                f64::from(tree.size().height()),
            );
            let (left, top, cw, ch) = request.content_rect(doc_w, doc_h);
            let xform = resvg::tiny_skia::Transform::from_row(
                (cw / doc_w) as f32,
                0.0,
                0.0,
                (ch / doc_h) as f32,
                left as f32,
                top as f32,
            );
            resvg::render(&tree, xform, &mut pixmap.as_mut());

            let mut data = Vec::with_capacity(width as usize * height as usize * 4);
            for px in pixmap.pixels() {
                let c = px.demultiply();
                data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
            }
            tracing::debug!(width, height, fit = ?request.fit, "rasterized svg");
            RasterImage::from_rgba8(width, height, data)
        }
    }
}
