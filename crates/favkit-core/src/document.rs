//! In-memory raster documents owned by the [`Editor`](crate::editor::Editor).

use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::host::{CommandKind, DocumentId};

/// Largest edge length any document may have, created, opened or resized.
pub const MAX_DIMENSION: u32 = 30_000;

const METERS_PER_INCH: f64 = 0.0254;

/// Color mode a document is encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Rgb,
    Grayscale,
}

/// Initial contents of a newly created document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    #[default]
    White,
    Black,
    Transparent,
}

impl Fill {
    fn pixel(self) -> Rgba<u8> {
        match self {
            Fill::White => Rgba([u8::MAX, u8::MAX, u8::MAX, u8::MAX]),
            Fill::Black => Rgba([0, 0, 0, u8::MAX]),
            Fill::Transparent => Rgba([0, 0, 0, 0]),
        }
    }
}

/// Resampling used when resizing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
    Lanczos,
}

impl ResampleFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Bilinear => FilterType::Triangle,
            ResampleFilter::Bicubic => FilterType::CatmullRom,
            ResampleFilter::Lanczos => FilterType::Lanczos3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResampleFilter::Nearest => "nearest",
            ResampleFilter::Bilinear => "bilinear",
            ResampleFilter::Bicubic => "bicubic",
            ResampleFilter::Lanczos => "lanczos",
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResampleFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nearest" | "nn" => Ok(ResampleFilter::Nearest),
            "bilinear" | "triangle" => Ok(ResampleFilter::Bilinear),
            "bicubic" | "catmullrom" => Ok(ResampleFilter::Bicubic),
            "lanczos" | "lanczos3" => Ok(ResampleFilter::Lanczos),
            other => Err(format!("unknown resample filter '{other}'")),
        }
    }
}

/// Parameters for [`Host::create_document`](crate::host::Host::create_document).
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Pixels per inch.
    pub resolution: f64,
    pub mode: ColorMode,
    pub fill: Fill,
}

impl DocumentSpec {
    /// The 46×46, 72 DPI, white RGB canvas favicons are drawn on.
    pub fn favicon_canvas() -> Self {
        Self {
            name: "Favicon".to_string(),
            width: 46,
            height: 46,
            resolution: 72.0,
            mode: ColorMode::Rgb,
            fill: Fill::White,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        check_dimensions(self.width, self.height)?;
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(format!(
                "resolution must be a positive number (got {})",
                self.resolution
            ));
        }
        Ok(())
    }
}

/// Both edges must lie in `1..=MAX_DIMENSION`.
pub fn check_dimensions(width: u32, height: u32) -> Result<(), String> {
    if width == 0 || height == 0 {
        return Err(format!(
            "document dimensions must be non-zero (got {width}x{height})"
        ));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(format!(
            "document dimensions exceed {MAX_DIMENSION}px (got {width}x{height})"
        ));
    }
    Ok(())
}

impl Default for DocumentSpec {
    fn default() -> Self {
        Self::favicon_canvas()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Document {
    pub(crate) id: DocumentId,
    pub(crate) name: String,
    pub(crate) pixels: RgbaImage,
    pub(crate) resolution: f64,
    pub(crate) mode: ColorMode,
    /// Batch commands accepted without synchronous execution, applied in order
    /// before the document is next read or changed.
    pub(crate) pending: Vec<CommandKind>,
}

impl Document {
    pub(crate) fn blank(id: DocumentId, spec: &DocumentSpec) -> Self {
        let mut pixels = RgbaImage::from_pixel(spec.width, spec.height, spec.fill.pixel());
        if spec.mode == ColorMode::Grayscale {
            pixels = DynamicImage::ImageRgba8(pixels).grayscale().to_rgba8();
        }
        Self {
            id,
            name: spec.name.clone(),
            pixels,
            resolution: spec.resolution,
            mode: spec.mode,
            pending: Vec::new(),
        }
    }

    pub(crate) fn from_image(
        id: DocumentId,
        name: String,
        image: DynamicImage,
        resolution: f64,
    ) -> Self {
        let mode = if image.color().has_color() {
            ColorMode::Rgb
        } else {
            ColorMode::Grayscale
        };
        Self {
            id,
            name,
            pixels: image.to_rgba8(),
            resolution,
            mode,
            pending: Vec::new(),
        }
    }

    /// Deep copy under a new id.
    pub(crate) fn duplicate(&self, id: DocumentId) -> Self {
        Self {
            id,
            name: format!("{} copy", self.name),
            pixels: self.pixels.clone(),
            resolution: self.resolution,
            mode: self.mode,
            pending: Vec::new(),
        }
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub(crate) fn apply(&mut self, command: CommandKind) {
        match command {
            CommandKind::Invert => imageops::invert(&mut self.pixels),
        }
    }

    pub(crate) fn flush_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for command in pending {
            self.apply(command);
        }
        count
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32, filter: ResampleFilter) {
        if self.pixels.dimensions() == (width, height) {
            return;
        }
        self.pixels = imageops::resize(&self.pixels, width, height, filter.filter_type());
    }

    /// Encode as PNG. Output depends only on pixels, mode and resolution, so two
    /// encodes of the same document are byte-identical.
    pub(crate) fn encode_png(&self) -> Result<Vec<u8>, png::EncodingError> {
        let (width, height) = self.pixels.dimensions();
        let opaque = self.pixels.pixels().all(|pixel| pixel[3] == u8::MAX);
        let (color, data): (png::ColorType, Vec<u8>) = match (self.mode, opaque) {
            (ColorMode::Rgb, true) => (
                png::ColorType::Rgb,
                self.pixels
                    .pixels()
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            ),
            (ColorMode::Rgb, false) => (png::ColorType::Rgba, self.pixels.as_raw().clone()),
            (ColorMode::Grayscale, true) => (
                png::ColorType::Grayscale,
                self.pixels.pixels().map(|pixel| pixel[0]).collect(),
            ),
            (ColorMode::Grayscale, false) => (
                png::ColorType::GrayscaleAlpha,
                self.pixels
                    .pixels()
                    .flat_map(|pixel| [pixel[0], pixel[3]])
                    .collect(),
            ),
        };

        let pixels_per_meter = (self.resolution / METERS_PER_INCH).round() as u32;
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: pixels_per_meter,
                yppu: pixels_per_meter,
                unit: png::Unit::Meter,
            }));
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&data)?;
            writer.finish()?;
        }
        Ok(out)
    }
}

/// Read-only copy of a document's state, for previews and inspection.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    pub name: String,
    pub pixels: RgbaImage,
    pub resolution: f64,
    pub mode: ColorMode,
}

impl From<&Document> for DocumentSnapshot {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            name: document.name.clone(),
            pixels: document.pixels.clone(),
            resolution: document.resolution,
            mode: document.mode,
        }
    }
}
