//! Writing the rendered diagram to SVG, PNG or PDF files.

pub mod pdf;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

use crate::render::{Artifact, RenderError, RenderService, raster};
use crate::theme::Theme;

/// File name used for every export, before the extension.
pub const DEFAULT_BASE_NAME: &str = "mermaid-diagram";
/// Upscale factor for raster exports.
pub const DEFAULT_SCALE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Svg,
    Png,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Svg, Self::Png, Self::Pdf];

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Writes artifacts to `<out_dir>/<base_name>.<ext>`.
#[derive(Debug, Clone)]
pub struct Exporter {
    pub out_dir: PathBuf,
    pub base_name: String,
    pub scale: f32,
}

impl Exporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            base_name: DEFAULT_BASE_NAME.to_string(),
            scale: DEFAULT_SCALE,
        }
    }

    pub fn path_for(&self, format: ExportFormat) -> PathBuf {
        self.out_dir
            .join(format!("{}.{}", self.base_name, format.extension()))
    }

    /// Render `source` with `service` and export the result.
    ///
    /// Blank source is never rendered, so nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or exporting fails.
    pub fn export_source(
        &self,
        service: &dyn RenderService,
        source: &str,
        format: ExportFormat,
        theme: Theme,
    ) -> Result<Option<PathBuf>, ExportError> {
        if source.trim().is_empty() {
            return self.export(None, format, theme);
        }
        let artifact = service.render(source, &theme.render_options())?;
        self.export(Some(&artifact), format, theme)
    }

    /// Export `artifact` in `format`.
    ///
    /// Returns `Ok(None)` without touching the file system when there is no
    /// artifact to export.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization, encoding, or writing fails.
    pub fn export(
        &self,
        artifact: Option<&Artifact>,
        format: ExportFormat,
        theme: Theme,
    ) -> Result<Option<PathBuf>, ExportError> {
        let Some(artifact) = artifact else {
            tracing::debug!(%format, "export skipped, nothing rendered");
            return Ok(None);
        };
        let path = self.path_for(format);
        std::fs::create_dir_all(&self.out_dir).map_err(|source| ExportError::Io {
            path: self.out_dir.clone(),
            source,
        })?;

        match format {
            ExportFormat::Svg => write_file(&path, artifact.svg.as_bytes())?,
            ExportFormat::Png => {
                let img =
                    raster::rasterize(&artifact.svg, self.scale, theme.export_background())?;
                img.save_with_format(&path, ImageFormat::Png)?;
            }
            ExportFormat::Pdf => {
                let img =
                    raster::rasterize(&artifact.svg, self.scale, theme.export_background())?;
                let rgb = DynamicImage::ImageRgba8(img).into_rgb8();
                let bytes = pdf::build_document(&rgb).map_err(|source| ExportError::Io {
                    path: path.clone(),
                    source,
                })?;
                write_file(&path, &bytes)?;
            }
        }
        tracing::info!(path = %path.display(), %format, %theme, "diagram exported");
        Ok(Some(path))
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ExportFormat>(), Ok(ExportFormat::Png));
        assert_eq!(" svg ".parse::<ExportFormat>(), Ok(ExportFormat::Svg));
        assert!("jpeg".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_paths_use_fixed_base_name() {
        let exporter = Exporter::new("/tmp/out");
        assert_eq!(
            exporter.path_for(ExportFormat::Pdf),
            PathBuf::from("/tmp/out/mermaid-diagram.pdf")
        );
        assert!((exporter.scale - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_artifact_is_silent_noop() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let exporter = Exporter::new(&out);
        for format in ExportFormat::ALL {
            assert!(exporter.export(None, format, Theme::Dark).unwrap().is_none());
        }
        assert!(!out.exists());
    }

    #[test]
    fn test_blank_source_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let exporter = Exporter::new(&out);
        let renderer = crate::render::MermaidRenderer::new();
        for source in ["", "   \n\t"] {
            let written = exporter
                .export_source(&renderer, source, ExportFormat::Svg, Theme::Light)
                .unwrap();
            assert!(written.is_none());
        }
        assert!(!out.exists());
    }

    #[test]
    fn test_export_source_renders_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());
        let renderer = crate::render::MermaidRenderer::new();
        let written = exporter
            .export_source(&renderer, "graph LR\n  A --> B", ExportFormat::Svg, Theme::Dark)
            .unwrap()
            .unwrap();
        assert!(std::fs::read_to_string(written).unwrap().contains("<svg"));
    }

    #[test]
    fn test_export_source_surfaces_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());
        let renderer = crate::render::MermaidRenderer::new();
        let err = exporter
            .export_source(&renderer, "graph TD\nA --> ", ExportFormat::Png, Theme::Light)
            .unwrap_err();
        assert!(matches!(err, ExportError::Render(RenderError::Syntax(_))));
        assert!(!exporter.path_for(ExportFormat::Png).exists());
    }
}
