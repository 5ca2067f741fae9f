//! GIF decoding into full-screen indexed frames.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use gif::DisposalMethod;
use tracing::{debug, info};

use crate::{Error, Result};

/// One composited frame: palette indices for the whole logical screen.
///
/// `None` marks a pixel no frame has painted yet (or one cleared by
/// background disposal); it renders as the blank canvas colour.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major indices, length = width * height
    pub indices: Vec<Option<u8>>,
    /// Display time of this frame in milliseconds
    pub delay_ms: u32,
}

#[derive(Debug, Clone, Copy)]
struct FrameRect {
    left: usize,
    top: usize,
    width: usize,
    height: usize,
}

/// Disposal owed by the previously returned frame, applied before the next one is drawn
struct PendingDisposal {
    method: DisposalMethod,
    rect: FrameRect,
    saved: Option<Vec<Option<u8>>>,
}

/// Sequential frame reader over an animated GIF.
pub struct GifSource<R: Read = File> {
    decoder: gif::Decoder<R>,
    palette: Vec<u8>,
    canvas: Vec<Option<u8>>,
    width: usize,
    height: usize,
    pending: Option<PendingDisposal>,
    frames_read: usize,
}

impl GifSource<File> {
    /// Open a GIF file. A file that cannot be opened, or whose header
    /// cannot be read as a usable GIF, is reported as
    /// [`Error::FileNotFound`] naming the path.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "failed to open source");
            Error::FileNotFound(path.to_path_buf())
        })?;
        Self::from_reader(file).map_err(|e| match e {
            Error::Decode(_) | Error::EmptySource => {
                debug!(path = %path.display(), error = %e, "unreadable source");
                Error::FileNotFound(path.to_path_buf())
            }
            other => other,
        })
    }
}

impl<R: Read> GifSource<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let decoder = options.read_info(reader)?;

        let width = decoder.width() as usize;
        let height = decoder.height() as usize;
        if width == 0 || height == 0 {
            return Err(Error::EmptySource);
        }
        let palette = decoder.global_palette().map(<[u8]>::to_vec).unwrap_or_default();
        info!(width, height, global_palette = !palette.is_empty(), "opened GIF");

        Ok(Self {
            decoder,
            palette,
            canvas: vec![None; width * height],
            width,
            height,
            pending: None,
            frames_read: 0,
        })
    }

    /// Logical screen width
    pub fn width(&self) -> u32 {
        self.width as u32
    }

    /// Logical screen height
    pub fn height(&self) -> u32 {
        self.height as u32
    }

    /// The palette shared by every frame, as flat RGB triples.
    ///
    /// This is the global color table. Files without one adopt the first
    /// frame's local table, so the value may change after the first call to
    /// [`next_frame`](Self::next_frame).
    pub fn palette(&self) -> &[u8] {
        &self.palette
    }

    /// Number of frames returned so far
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// Decode and composite the next frame. Returns `Ok(None)` once the
    /// sequence is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<IndexedFrame>> {
        self.dispose_previous();

        let Some(frame) = self.decoder.read_next_frame()? else {
            debug!(frames = self.frames_read, "end of frame sequence");
            return Ok(None);
        };

        if self.palette.is_empty() {
            if let Some(local) = &frame.palette {
                debug!("no global palette, adopting first local palette");
                self.palette = local.clone();
            }
        }

        let rect = FrameRect {
            left: frame.left as usize,
            top: frame.top as usize,
            width: frame.width as usize,
            height: frame.height as usize,
        };
        let saved = matches!(frame.dispose, DisposalMethod::Previous).then(|| self.canvas.clone());
        blit(&mut self.canvas, self.width, self.height, rect, &frame.buffer, frame.transparent);
        self.pending = Some(PendingDisposal { method: frame.dispose, rect, saved });

        let delay_ms = u32::from(frame.delay) * 10;
        debug!(
            index = self.frames_read,
            left = rect.left, top = rect.top, width = rect.width, height = rect.height,
            delay_ms,
            "decoded frame"
        );
        self.frames_read += 1;

        Ok(Some(IndexedFrame {
            width: self.width as u32,
            height: self.height as u32,
            indices: self.canvas.clone(),
            delay_ms,
        }))
    }

    fn dispose_previous(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match pending.method {
            DisposalMethod::Any | DisposalMethod::Keep => {}
            DisposalMethod::Background => {
                let FrameRect { left, top, width, height } = pending.rect;
                for y in top..(top + height).min(self.height) {
                    let row = y * self.width;
                    for x in left..(left + width).min(self.width) {
                        self.canvas[row + x] = None;
                    }
                }
            }
            DisposalMethod::Previous => {
                if let Some(saved) = pending.saved {
                    self.canvas = saved;
                }
            }
        }
    }
}

/// Paint a frame's indices onto the canvas, clipped to the screen.
/// Pixels carrying the transparent index leave the canvas untouched.
fn blit(
    canvas: &mut [Option<u8>],
    screen_w: usize,
    screen_h: usize,
    rect: FrameRect,
    buffer: &[u8],
    transparent: Option<u8>,
) {
    if rect.width == 0 {
        return;
    }
    for (y, row) in buffer.chunks_exact(rect.width).take(rect.height).enumerate() {
        let sy = rect.top + y;
        if sy >= screen_h {
            break;
        }
        for (x, &index) in row.iter().enumerate() {
            let sx = rect.left + x;
            if sx >= screen_w {
                break;
            }
            if Some(index) == transparent {
                continue;
            }
            canvas[sy * screen_w + sx] = Some(index);
        }
    }
}
