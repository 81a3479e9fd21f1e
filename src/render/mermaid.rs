//! Mermaid backend built on `mermaid-rs-renderer`.

use super::{Artifact, RenderError, RenderOptions, RenderService, ThemeVariables, syntax};

/// Renders Mermaid source to SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidRenderer;

impl MermaidRenderer {
    pub const fn new() -> Self {
        Self
    }
}

impl RenderService for MermaidRenderer {
    fn render(&self, source: &str, options: &RenderOptions) -> Result<Artifact, RenderError> {
        syntax::check(source)?;
        let opts = mermaid_rs_renderer::RenderOptions {
            theme: backend_theme(&options.style_variables),
            layout: mermaid_rs_renderer::LayoutConfig::default(),
        };
        let svg = mermaid_rs_renderer::render_with_options(source, opts)
            .map_err(|e| RenderError::syntax(e.to_string()))?;
        let artifact = Artifact::from_svg(fix_svg_font_families(&svg))?;
        tracing::debug!(
            theme = %options.theme_name,
            width = artifact.width,
            height = artifact.height,
            bytes = artifact.svg.len(),
            "mermaid render complete"
        );
        Ok(artifact)
    }
}

/// Overlay our style variables on the backend's modern theme.
fn backend_theme(vars: &ThemeVariables) -> mermaid_rs_renderer::Theme {
    let mut theme = mermaid_rs_renderer::Theme::modern();
    theme.font_family.clone_from(&vars.font_family);
    theme.primary_color.clone_from(&vars.primary_color);
    theme.primary_text_color.clone_from(&vars.primary_text_color);
    theme.primary_border_color.clone_from(&vars.primary_border_color);
    theme.line_color.clone_from(&vars.line_color);
    theme.secondary_color.clone_from(&vars.secondary_color);
    theme.tertiary_color.clone_from(&vars.tertiary_color);
    theme.background.clone_from(&vars.background);
    theme.cluster_background.clone_from(&vars.main_bkg);
    theme.cluster_border.clone_from(&vars.primary_border_color);
    theme.edge_label_background.clone_from(&vars.second_bkg);
    theme.text_color.clone_from(&vars.primary_text_color);
    theme.sequence_actor_fill.clone_from(&vars.main_bkg);
    theme.sequence_actor_border.clone_from(&vars.primary_border_color);
    theme.sequence_actor_line.clone_from(&vars.line_color);
    theme.pie_title_text_color.clone_from(&vars.primary_text_color);
    theme.pie_section_text_color.clone_from(&vars.primary_text_color);
    theme.pie_legend_text_color.clone_from(&vars.primary_text_color);
    theme
}

/// Replace unescaped double quotes inside `font-family` attribute values.
///
/// The backend emits values such as `font-family="Inter, "Segoe UI", sans-serif"`,
/// which is not well-formed XML. A quote only closes the attribute when it is
/// followed by whitespace, `/`, `>` or the end of input.
fn fix_svg_font_families(svg: &str) -> String {
    const ATTR: &str = "font-family=\"";
    let mut out = String::with_capacity(svg.len());
    let mut rest = svg;

    while let Some(pos) = rest.find(ATTR) {
        let (head, tail) = rest.split_at(pos + ATTR.len());
        out.push_str(head);

        let bytes = tail.as_bytes();
        let close = bytes.iter().enumerate().position(|(i, &b)| {
            b == b'"'
                && bytes
                    .get(i + 1)
                    .is_none_or(|&next| next.is_ascii_whitespace() || next == b'/' || next == b'>')
        });
        let Some(close) = close else {
            out.push_str(tail);
            return out;
        };
        out.push_str(&tail[..close].replace('"', "'"));
        out.push('"');
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}
