//! Document rendering from the ordered frame texts.

use std::path::{Path, PathBuf};

use minijinja::{context, AutoEscape, Environment};
use tracing::debug;

use crate::{Error, Result};

/// Template path used when none is configured
pub const DEFAULT_TEMPLATE: &str = "template.jinja";

/// Text of one converted frame and how long it should be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub text: String,
    pub delay_ms: u32,
}

/// Trait for turning the ordered frame texts into a document
pub trait DocumentRenderer {
    fn render(&self, frames: &[RenderedFrame]) -> Result<String>;
}

enum TemplateSource {
    Path(PathBuf),
    Inline(String),
}

/// Jinja template renderer.
///
/// The template sees `strings` (frame texts in order) and `delays`
/// (per-frame delay in milliseconds). Output is not auto-escaped, so color
/// markup passes through verbatim.
pub struct JinjaTemplate {
    source: TemplateSource,
}

impl JinjaTemplate {
    /// Template read from `path` at render time
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { source: TemplateSource::Path(path.into()) }
    }

    pub fn from_source(source: impl Into<String>) -> Self {
        Self { source: TemplateSource::Inline(source.into()) }
    }

    fn load(&self) -> Result<String> {
        match &self.source {
            TemplateSource::Path(path) => read_template(path),
            TemplateSource::Inline(source) => Ok(source.clone()),
        }
    }
}

fn read_template(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "loading template");
    std::fs::read_to_string(path).map_err(|source| Error::TemplateRead {
        path: path.to_path_buf(),
        source,
    })
}

impl DocumentRenderer for JinjaTemplate {
    fn render(&self, frames: &[RenderedFrame]) -> Result<String> {
        let source = self.load()?;
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        let template = env.template_from_str(&source)?;

        let strings: Vec<&str> = frames.iter().map(|f| f.text.as_str()).collect();
        let delays: Vec<u32> = frames.iter().map(|f| f.delay_ms).collect();
        Ok(template.render(context! { strings => strings, delays => delays })?)
    }
}
