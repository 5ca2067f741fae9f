//! Core GIF to text-art conversion library.
//!
//! Decodes every frame of an animated GIF, downsamples it, maps each pixel to
//! an ASCII density glyph or a coloured block glyph, and renders the frame
//! texts into an HTML document through a template.

mod convert;
mod decode;
mod glyph;
mod template;
mod transform;

pub use convert::{
    convert, convert_to_string, render_frames, ConversionSummary, ConvertOptions, DefaultReason,
    MaxLen, DEFAULT_MAX_LEN, DEFAULT_OUTPUT,
};
pub use decode::{GifSource, IndexedFrame};
pub use glyph::{
    density_index, render_frame, ColorGlyph, GlyphMode, GlyphRenderer, GreenScreen, TextGlyph,
    DENSITY_RAMP, GREEN, DEFAULT_SENSIBILITY,
};
pub use template::{DocumentRenderer, JinjaTemplate, RenderedFrame, DEFAULT_TEMPLATE};
pub use transform::{FrameTransformer, ResizeFilter, TargetDimensions};

use std::path::PathBuf;

/// RGB color tuple
pub type Rgb = [u8; 3];

/// Error type for conversion operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("GIF decoding error")]
    Decode(#[from] gif::DecodingError),

    #[error("Template error")]
    Template(#[from] minijinja::Error),

    #[error("failed to read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source has zero width or height")]
    EmptySource,
}

pub type Result<T> = std::result::Result<T, Error>;
