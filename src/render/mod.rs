//! Diagram rendering.
//!
//! The rest of the application only talks to [`RenderService`]; the concrete
//! backend ([`MermaidRenderer`]) can be swapped for any other implementation,
//! which is how the preview pipeline is tested.

mod mermaid;
pub mod raster;
pub mod syntax;

pub use mermaid::MermaidRenderer;

use thiserror::Error;

/// Message shown when a backend fails without saying why.
pub const FALLBACK_SYNTAX_MESSAGE: &str = "Invalid Mermaid syntax";

/// Theme-specific colors handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeVariables {
    pub dark_mode: bool,
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub line_color: String,
    pub secondary_color: String,
    pub tertiary_color: String,
    pub background: String,
    pub main_bkg: String,
    pub second_bkg: String,
    pub font_family: String,
}

/// Options for a single render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// `"dark"` or `"default"`.
    pub theme_name: String,
    pub style_variables: ThemeVariables,
}

/// A successfully rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Serialized SVG document.
    pub svg: String,
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
}

impl Artifact {
    /// Build an artifact from SVG text, reading its intrinsic size.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSvg`] if the SVG cannot be parsed.
    pub fn from_svg(svg: String) -> Result<Self, RenderError> {
        let (width, height) = raster::intrinsic_size(&svg)?;
        Ok(Self { svg, width, height })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The diagram source is malformed.
    #[error("{0}")]
    Syntax(String),
    /// The backend produced SVG that does not parse.
    #[error("invalid SVG output: {0}")]
    InvalidSvg(String),
    #[error("rasterization failed: {0}")]
    Raster(String),
    /// The backend panicked.
    #[error("renderer crashed: {0}")]
    Crashed(String),
}

impl RenderError {
    /// Syntax error with a guaranteed non-empty message.
    pub fn syntax(message: impl Into<String>) -> Self {
        let message = message.into();
        let trimmed = message.trim();
        if trimmed.is_empty() {
            Self::Syntax(FALLBACK_SYNTAX_MESSAGE.to_string())
        } else {
            Self::Syntax(trimmed.to_string())
        }
    }
}

/// Converts diagram source into a vector artifact.
///
/// Implementations must be idempotent and must not touch caller state; the
/// preview dispatcher calls them from a worker thread.
pub trait RenderService: Send + Sync {
    /// Render `source` with the given theme options.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] describing why the diagram could not be
    /// rendered.
    fn render(&self, source: &str, options: &RenderOptions) -> Result<Artifact, RenderError>;
}
