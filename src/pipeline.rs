use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tracing::{debug, info};

use crate::assets::InputKind;
use crate::assets::decode::decode_frames;
use crate::assets::svg_raster::{
    RasterRequest, VectorRasterizer, VectorSource, ViewportFit, default_rasterizer,
};
use crate::config::TargetSize;
use crate::encode::{self, OutputFormat, OutputSpec};
use crate::foundation::core::{FrameSequence, RasterImage, Rgba8, TargetBox};
use crate::foundation::error::{ImgfitError, ImgfitResult};
use crate::render::transform::{self, PlacementMode};

/// Validated settings shared by every file of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub size: TargetSize,
    pub mode: PlacementMode,
    pub background: Rgba8,
    pub jpeg_quality: u8,
    pub out_dir: PathBuf,
    pub threads: Option<usize>,
}

/// Output format and file extension for an input.
///
/// Vector input always becomes PNG and animated input always GIF. Raster input keeps a
/// `png`/`jpg`/`jpeg` extension and falls back to PNG otherwise.
pub fn output_target(input: &Path, kind: InputKind) -> (OutputFormat, String) {
    match kind {
        InputKind::Vector => (OutputFormat::Png, OutputFormat::Png.extension().to_string()),
        InputKind::Animated => (OutputFormat::Gif, OutputFormat::Gif.extension().to_string()),
        InputKind::Raster => {
            let ext = input
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            match ext.as_deref() {
                Some(e @ ("png" | "jpg" | "jpeg")) => {
                    (OutputFormat::from_extension(e), e.to_string())
                }
                _ => (OutputFormat::Png, OutputFormat::Png.extension().to_string()),
            }
        }
    }
}

/// `<out_dir>/<stem>.<ext>`.
pub fn output_path(out_dir: &Path, input: &Path, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string());
    out_dir.join(format!("{stem}.{ext}"))
}

/// How a vector document is laid onto its canvas for `mode`; `None` means native size.
///
/// Pad and Fill keep the document's aspect ratio, Stretch does not.
pub fn viewport_fit(mode: PlacementMode) -> Option<ViewportFit> {
    match mode {
        PlacementMode::Stretch => Some(ViewportFit::Stretch),
        PlacementMode::Pad => Some(ViewportFit::Contain),
        PlacementMode::Fill => Some(ViewportFit::Cover),
        PlacementMode::Fit => None,
    }
}

/// Decode, place every frame, encode. Holds no state between files.
#[derive(Clone)]
pub struct Pipeline {
    job: Job,
    rasterizer: Arc<dyn VectorRasterizer>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("job", &self.job).finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(job: Job) -> Self {
        Self::with_rasterizer(job, default_rasterizer())
    }

    pub fn with_rasterizer(job: Job, rasterizer: Arc<dyn VectorRasterizer>) -> Self {
        Self { job, rasterizer }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// `<out_dir>/<stem>.<ext>` for `input` under this job.
    pub fn default_output(&self, input: &Path) -> PathBuf {
        let (_, ext) = output_target(input, InputKind::from_path(input));
        output_path(&self.job.out_dir, input, &ext)
    }

    /// Run one input file and write its output into the job's output directory.
    ///
    /// The output directory must already exist.
    pub fn process_file(&self, input: &Path) -> ImgfitResult<PathBuf> {
        self.process_file_to(input, &self.default_output(input))
    }

    /// Like [`process_file`](Self::process_file), writing to `out` instead of the default name.
    #[tracing::instrument(skip(self), fields(mode = %self.job.mode))]
    pub fn process_file_to(&self, input: &Path, out: &Path) -> ImgfitResult<PathBuf> {
        let bytes = std::fs::read(input).map_err(|e| {
            debug!(error = %e, "cannot read input");
            ImgfitError::input_not_found(input)
        })?;

        let kind = InputKind::from_path(input);
        let (format, _) = output_target(input, kind);
        let encoded = self.process_bytes(&bytes, kind, format, input.parent())?;

        std::fs::write(out, &encoded)
            .with_context(|| format!("write output '{}'", out.display()))?;
        info!(output = %out.display(), bytes = encoded.len(), "wrote");
        Ok(out.to_path_buf())
    }

    /// Pure form of [`process_file`](Self::process_file): input bytes in, encoded bytes out.
    ///
    /// `resources_dir` is where a vector document's relative references resolve from.
    pub fn process_bytes(
        &self,
        bytes: &[u8],
        kind: InputKind,
        format: OutputFormat,
        resources_dir: Option<&Path>,
    ) -> ImgfitResult<Vec<u8>> {
        let placed = self.render(bytes, kind, resources_dir)?;
        let spec = OutputSpec::new(format)
            .with_quality(self.job.jpeg_quality)
            .with_matte(self.job.background);
        encode::encode(&placed, &spec)
    }

    /// Decoded and placed frames, all sized to the same resolved target box.
    pub fn render(
        &self,
        bytes: &[u8],
        kind: InputKind,
        resources_dir: Option<&Path>,
    ) -> ImgfitResult<FrameSequence> {
        let (seq, target) = self.load(bytes, kind, resources_dir)?;
        debug!(
            frames = seq.len(),
            target_w = target.width,
            target_h = target.height,
            "placing"
        );
        // Frames stay strictly in source order; playback depends on it.
        seq.try_map_images(|img| transform::apply(img, self.job.mode, &target))
    }

    fn load(
        &self,
        bytes: &[u8],
        kind: InputKind,
        resources_dir: Option<&Path>,
    ) -> ImgfitResult<(FrameSequence, TargetBox)> {
        let bg = self.job.background;
        if bytes.is_empty() {
            let target = self.job.size.resolve((0, 0), bg)?;
            return Ok((FrameSequence::single(RasterImage::empty()), target));
        }

        match kind {
            InputKind::Vector => {
                let source = VectorSource::new(bytes).with_resources_dir(resources_dir);
                let target = match self.job.size.both() {
                    Some((w, h)) => TargetBox::new(w, h, bg)?,
                    None => self
                        .job
                        .size
                        .resolve(self.rasterizer.intrinsic_size(&source)?, bg)?,
                };
                // Fit only knows its output size after scaling, so it rasterizes at native size.
                let request = viewport_fit(self.job.mode)
                    .map(|fit| RasterRequest::new(target.width, target.height, fit));
                let img = self.rasterizer.rasterize(&source, request)?;
                Ok((FrameSequence::single(img), target))
            }
            InputKind::Animated | InputKind::Raster => {
                let seq = decode_frames(bytes, kind)?;
                let target = self
                    .job
                    .size
                    .resolve(seq.first().image.dimensions(), bg)?;
                Ok((seq, target))
            }
        }
    }
}
