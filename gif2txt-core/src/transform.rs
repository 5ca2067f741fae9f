//! Palette compositing and downsampling of decoded frames.

use image::imageops::{self, FilterType};
use image::{Rgb as Pixel, RgbImage};

use crate::{IndexedFrame, Rgb};

/// Output raster size derived from the source size and the longest side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDimensions {
    pub width: u32,
    pub height: u32,
}

impl TargetDimensions {
    /// Scale so the longer source side becomes `max_len` and the other side
    /// `floor(max_len * side / longest)`. A side that would round to zero is kept at one pixel.
    pub fn from_source(width: u32, height: u32, max_len: u32) -> Self {
        let longest = u64::from(width.max(height).max(1));
        let scale = |side: u32| {
            let scaled = u64::from(max_len) * u64::from(side) / longest;
            (scaled.min(u64::from(u32::MAX)) as u32).max(1)
        };
        Self { width: scale(width), height: scale(height) }
    }
}

/// Resampling filter used when shrinking frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResizeFilter {
    #[default]
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl std::str::FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" => Ok(Self::Triangle),
            "catmull-rom" | "catmullrom" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            _ => Err(format!(
                "unknown resize filter '{}' (expected nearest, triangle, catmull-rom, gaussian, or lanczos3)",
                s
            )),
        }
    }
}

/// Turns indexed frames into RGB rasters at the target size.
pub struct FrameTransformer {
    palette: Vec<Rgb>,
    target: TargetDimensions,
    filter: FilterType,
}

impl FrameTransformer {
    /// `palette` is flat RGB triples; a trailing partial triple is ignored.
    pub fn new(palette: &[u8], target: TargetDimensions, filter: ResizeFilter) -> Self {
        let palette = palette
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self { palette, target, filter: filter.into() }
    }

    /// Composite over a black canvas through the shared palette, then resize.
    pub fn transform(&self, frame: &IndexedFrame) -> RgbImage {
        let canvas = self.composite(frame);
        if (self.target.width, self.target.height) == canvas.dimensions() {
            return canvas;
        }
        imageops::resize(&canvas, self.target.width, self.target.height, self.filter)
    }

    /// Full-size RGB raster; unpainted pixels and indices past the end of
    /// the palette stay black.
    pub fn composite(&self, frame: &IndexedFrame) -> RgbImage {
        let mut canvas = RgbImage::new(frame.width, frame.height);
        for (pixel, index) in canvas.pixels_mut().zip(&frame.indices) {
            if let Some(rgb) = index.and_then(|i| self.palette.get(i as usize)) {
                *pixel = Pixel(*rgb);
            }
        }
        canvas
    }
}
