use crate::foundation::error::{ImgfitError, ImgfitResult};

/// Display duration used when a container does not carry one.
pub const DEFAULT_FRAME_MS: u32 = 100;

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn from_array(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Four bytes per pixel, straight alpha.
    Rgba8,
    /// One palette index per pixel.
    Indexed {
        palette: Vec<[u8; 3]>,
        transparent: Option<u8>,
    },
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Indexed { .. } => 1,
        }
    }
}

/// Owned pixel grid. `data.len() == width * height * bytes_per_pixel` always holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl RasterImage {
    pub fn from_parts(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> ImgfitResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(format.bytes_per_pixel()))
            .ok_or_else(|| ImgfitError::dimension(format!("{width}x{height} overflows")))?;
        if data.len() != expected {
            return Err(ImgfitError::Other(anyhow::anyhow!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> ImgfitResult<Self> {
        Self::from_parts(width, height, PixelFormat::Rgba8, data)
    }

    pub fn filled(width: u32, height: u32, color: Rgba8) -> Self {
        let px = color.to_array();
        let data = px.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            data,
        }
    }

    /// Zero-sized image; what an empty input decodes to.
    pub fn empty() -> Self {
        Self::filled(0, 0, Rgba8::TRANSPARENT)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at `(x, y)` as straight RGBA, resolving the palette for indexed images.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.width as usize + x as usize;
        match &self.format {
            PixelFormat::Rgba8 => {
                let p = &self.data[i * 4..i * 4 + 4];
                Some(Rgba8::new(p[0], p[1], p[2], p[3]))
            }
            PixelFormat::Indexed {
                palette,
                transparent,
            } => {
                let idx = self.data[i];
                if *transparent == Some(idx) {
                    return Some(Rgba8::TRANSPARENT);
                }
                let [r, g, b] = palette.get(idx as usize).copied().unwrap_or([0, 0, 0]);
                Some(Rgba8::rgb(r, g, b))
            }
        }
    }

    pub fn has_transparency(&self) -> bool {
        match &self.format {
            PixelFormat::Rgba8 => self.data.chunks_exact(4).any(|px| px[3] < 255),
            PixelFormat::Indexed { transparent, .. } => {
                transparent.is_some_and(|t| self.data.contains(&t))
            }
        }
    }

    pub fn to_rgba_image(&self) -> ImgfitResult<image::RgbaImage> {
        let data = match &self.format {
            PixelFormat::Rgba8 => self.data.clone(),
            PixelFormat::Indexed { .. } => {
                let mut out = Vec::with_capacity(self.data.len() * 4);
                for y in 0..self.height {
                    for x in 0..self.width {
                        let px = self.pixel(x, y).unwrap_or(Rgba8::TRANSPARENT);
                        out.extend_from_slice(&px.to_array());
                    }
                }
                out
            }
        };
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| ImgfitError::Other(anyhow::anyhow!("rgba buffer size mismatch")))
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl From<image::RgbaImage> for RasterImage {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            data: img.into_raw(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub image: RasterImage,
    pub duration_ms: u32,
}

impl Frame {
    pub fn new(image: RasterImage, duration_ms: u32) -> Self {
        Self { image, duration_ms }
    }
}

/// Non-empty, ordered frames plus a loop count (0 = repeat forever).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    loop_count: u16,
}

impl FrameSequence {
    pub fn new(frames: Vec<Frame>, loop_count: u16) -> ImgfitResult<Self> {
        if frames.is_empty() {
            return Err(ImgfitError::unsupported("source contains no frames"));
        }
        Ok(Self { frames, loop_count })
    }

    pub fn single(image: RasterImage) -> Self {
        Self {
            frames: vec![Frame::new(image, 0)],
            loop_count: 0,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn first(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    pub fn is_uniform(&self) -> bool {
        let dims = self.first().image.dimensions();
        self.frames.iter().all(|f| f.image.dimensions() == dims)
    }

    /// Apply `f` to every frame image in index order, keeping durations and loop count.
    pub fn try_map_images<F>(self, mut f: F) -> ImgfitResult<Self>
    where
        F: FnMut(&RasterImage) -> ImgfitResult<RasterImage>,
    {
        let frames = self
            .frames
            .iter()
            .map(|frame| Ok(Frame::new(f(&frame.image)?, frame.duration_ms)))
            .collect::<ImgfitResult<Vec<_>>>()?;
        Ok(Self {
            frames,
            loop_count: self.loop_count,
        })
    }
}

/// Output box for one placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetBox {
    pub width: u32,
    pub height: u32,
    pub background: Rgba8,
}

impl TargetBox {
    pub fn new(width: u32, height: u32, background: Rgba8) -> ImgfitResult<Self> {
        if width == 0 || height == 0 {
            return Err(ImgfitError::dimension(format!(
                "target box must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            background,
        })
    }
}
