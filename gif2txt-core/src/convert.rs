//! The conversion pipeline: decode, transform, map glyphs, render, write.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    render_frame, DocumentRenderer, Error, FrameTransformer, GifSource, GlyphMode, GreenScreen,
    RenderedFrame, ResizeFilter, Result, TargetDimensions,
};

/// Longest output side when none (or an unusable one) is given
pub const DEFAULT_MAX_LEN: u32 = 80;

/// Output path when none is given
pub const DEFAULT_OUTPUT: &str = "out.html";

/// Why the default longest side was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultReason {
    Missing,
    /// The raw value was not a positive integer
    Invalid(String),
}

/// Validated longest-side setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaxLen {
    Given(u32),
    Default(DefaultReason),
}

impl MaxLen {
    /// Accepts a positive integer; anything else falls back to
    /// [`DEFAULT_MAX_LEN`] with the reason recorded.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Default(DefaultReason::Missing);
        };
        match raw.trim().parse::<u32>() {
            Ok(n) if n > 0 => Self::Given(n),
            _ => Self::Default(DefaultReason::Invalid(raw.to_string())),
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            Self::Given(n) => *n,
            Self::Default(_) => DEFAULT_MAX_LEN,
        }
    }
}

impl Default for MaxLen {
    fn default() -> Self {
        Self::Default(DefaultReason::Missing)
    }
}

impl From<u32> for MaxLen {
    fn from(n: u32) -> Self {
        if n > 0 {
            Self::Given(n)
        } else {
            Self::Default(DefaultReason::Invalid(n.to_string()))
        }
    }
}

/// Parameters for one conversion
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub max_len: MaxLen,
    pub output: PathBuf,
    pub mode: GlyphMode,
    pub green_screen: Option<GreenScreen>,
    pub filter: ResizeFilter,
}

impl ConvertOptions {
    /// Defaults for everything except the input path
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            max_len: MaxLen::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            mode: GlyphMode::default(),
            green_screen: None,
            filter: ResizeFilter::default(),
        }
    }
}

/// What a finished conversion produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Decode and map every frame. `on_frame` is called with the number of
/// frames finished so far.
pub fn render_frames(
    opts: &ConvertOptions,
    on_frame: impl FnMut(usize),
) -> Result<Vec<RenderedFrame>> {
    render_frames_sized(opts, on_frame).map(|(frames, _)| frames)
}

fn render_frames_sized(
    opts: &ConvertOptions,
    mut on_frame: impl FnMut(usize),
) -> Result<(Vec<RenderedFrame>, TargetDimensions)> {
    let mut source = GifSource::open(&opts.input)?;

    if let MaxLen::Default(DefaultReason::Invalid(raw)) = &opts.max_len {
        warn!(value = %raw, default = DEFAULT_MAX_LEN, "invalid max length, using default");
    }
    let target = TargetDimensions::from_source(source.width(), source.height(), opts.max_len.value());
    info!(
        "Resizing {}x{} -> {}x{}",
        source.width(), source.height(), target.width, target.height
    );

    let renderer = opts.mode.renderer();
    let mut transformer: Option<FrameTransformer> = None;
    let mut frames = Vec::new();

    while let Some(frame) = source.next_frame()? {
        let transformer = transformer
            .get_or_insert_with(|| FrameTransformer::new(source.palette(), target, opts.filter));
        let image = transformer.transform(&frame);
        let text = render_frame(&image, renderer, opts.green_screen);
        debug!(index = frames.len(), bytes = text.len(), "rendered frame");
        frames.push(RenderedFrame { text, delay_ms: frame.delay_ms });
        on_frame(frames.len());
    }

    Ok((frames, target))
}

/// Run the pipeline up to the rendered document without writing anything
pub fn convert_to_string(
    opts: &ConvertOptions,
    renderer: &dyn DocumentRenderer,
    on_frame: impl FnMut(usize),
) -> Result<String> {
    let frames = render_frames(opts, on_frame)?;
    renderer.render(&frames)
}

/// Convert `opts.input` and write the document to `opts.output`,
/// replacing any existing file. Nothing is written unless every frame and
/// the template render succeed.
pub fn convert(
    opts: &ConvertOptions,
    renderer: &dyn DocumentRenderer,
    on_frame: impl FnMut(usize),
) -> Result<ConversionSummary> {
    let (frames, target) = render_frames_sized(opts, on_frame)?;
    let document = renderer.render(&frames)?;
    write_output(&opts.output, &document)?;

    info!(path = %opts.output.display(), frames = frames.len(), bytes = document.len(), "wrote document");
    Ok(ConversionSummary {
        frames: frames.len(),
        width: target.width,
        height: target.height,
        bytes: document.len(),
    })
}

fn write_output(path: &Path, document: &str) -> Result<()> {
    std::fs::write(path, document.as_bytes()).map_err(|source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}
