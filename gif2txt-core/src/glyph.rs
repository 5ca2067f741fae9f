//! Pixel to glyph mapping.

use std::fmt::Write;

use image::RgbImage;

use crate::Rgb;

/// Sixteen density glyphs, densest first.
pub const DENSITY_RAMP: &str = "MNHQ$OC?7>!:-;. ";

/// Substitute color for green-screened pixels
pub const GREEN: Rgb = [0, 255, 0];

/// Threshold used when the reversed rule is requested without a value
pub const DEFAULT_SENSIBILITY: i32 = 128;

const RAMP: &[u8; 16] = b"MNHQ$OC?7>!:-;. ";

/// Ramp position for a pixel: `floor(mean(R, G, B) / 256 * 16)`.
#[inline]
pub fn density_index(rgb: Rgb) -> usize {
    let sum = rgb[0] as usize + rgb[1] as usize + rgb[2] as usize;
    sum / 48
}

/// Replaces dark (or, reversed, bright) pixels with pure green.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreenScreen {
    /// Channel threshold; values outside 1..=255 are used as given
    pub sensibility: i32,
    /// Match channels above the threshold instead of at or below it
    pub reverse: bool,
}

impl GreenScreen {
    pub fn new(sensibility: i32, reverse: bool) -> Self {
        Self { sensibility, reverse }
    }

    /// True when every channel passes the comparison
    pub fn matches(&self, rgb: Rgb) -> bool {
        rgb.iter().all(|&c| {
            let c = i32::from(c);
            if self.reverse {
                c > self.sensibility
            } else {
                c <= self.sensibility
            }
        })
    }

    pub fn apply(&self, rgb: Rgb) -> Rgb {
        if self.matches(rgb) {
            GREEN
        } else {
            rgb
        }
    }
}

/// Writes the glyph for one pixel.
pub trait GlyphRenderer {
    fn push_glyph(&self, out: &mut String, rgb: Rgb);

    /// Output bytes per glyph, used to presize frame buffers
    fn glyph_len_hint(&self) -> usize {
        1
    }
}

/// One density-ramp character per pixel
#[derive(Debug, Clone, Copy, Default)]
pub struct TextGlyph;

impl GlyphRenderer for TextGlyph {
    #[inline]
    fn push_glyph(&self, out: &mut String, rgb: Rgb) {
        out.push(RAMP[density_index(rgb)] as char);
    }
}

/// A block glyph wrapped in a span colored with the pixel's RGB value
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorGlyph;

impl GlyphRenderer for ColorGlyph {
    #[inline]
    fn push_glyph(&self, out: &mut String, rgb: Rgb) {
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "<span style=\"color:rgb({}, {}, {});\">\u{2587}</span>",
            rgb[0], rgb[1], rgb[2]
        );
    }

    fn glyph_len_hint(&self) -> usize {
        56
    }
}

/// Which renderer a run uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GlyphMode {
    #[default]
    Text,
    Color,
}

impl GlyphMode {
    pub fn renderer(self) -> &'static dyn GlyphRenderer {
        match self {
            GlyphMode::Text => &TextGlyph,
            GlyphMode::Color => &ColorGlyph,
        }
    }
}

/// Render a frame row by row, one glyph per pixel and a newline after each row.
pub fn render_frame(
    image: &RgbImage,
    renderer: &dyn GlyphRenderer,
    green_screen: Option<GreenScreen>,
) -> String {
    let (width, height) = image.dimensions();
    let mut out =
        String::with_capacity((width as usize * renderer.glyph_len_hint() + 1) * height as usize);
    for row in image.rows() {
        for pixel in row {
            let rgb = match green_screen {
                Some(gs) => gs.apply(pixel.0),
                None => pixel.0,
            };
            renderer.push_glyph(&mut out, rgb);
        }
        out.push('\n');
    }
    out
}
