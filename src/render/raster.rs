//! SVG rasterization with resvg.

use std::sync::{Arc, LazyLock};

use image::RgbaImage;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::{self, fontdb};

use super::RenderError;

/// Largest raster edge we are willing to allocate.
const MAX_EDGE_PX: f32 = 16_384.0;

// Loading system fonts is slow, so the database is shared by every call.
static FONTDB: LazyLock<Arc<fontdb::Database>> = LazyLock::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
});

fn parse_tree(svg: &str) -> Result<usvg::Tree, RenderError> {
    let opts = usvg::Options {
        fontdb: Arc::clone(&FONTDB),
        ..usvg::Options::default()
    };
    usvg::Tree::from_str(svg, &opts).map_err(|e| RenderError::InvalidSvg(e.to_string()))
}

/// Intrinsic `(width, height)` of an SVG document in whole pixels.
///
/// # Errors
///
/// Returns [`RenderError::InvalidSvg`] if the SVG cannot be parsed.
pub fn intrinsic_size(svg: &str) -> Result<(u32, u32), RenderError> {
    let tree = parse_tree(svg)?;
    let size = tree.size();
    Ok((ceil_px(size.width()), ceil_px(size.height())))
}

/// Rasterize `svg` at `scale` over an opaque `background`.
///
/// # Errors
///
/// Returns an error if the SVG cannot be parsed or the pixmap is too large.
pub fn rasterize(svg: &str, scale: f32, background: [u8; 3]) -> Result<RgbaImage, RenderError> {
    let tree = parse_tree(svg)?;
    render_tree(&tree, scale, background)
}

/// Rasterize `svg` scaled to fit inside `max_width` x `max_height` pixels,
/// preserving aspect ratio.
///
/// # Errors
///
/// Returns an error if the SVG cannot be parsed or has no area.
pub fn rasterize_to_fit(
    svg: &str,
    max_width: u32,
    max_height: u32,
    background: [u8; 3],
) -> Result<RgbaImage, RenderError> {
    let tree = parse_tree(svg)?;
    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(RenderError::Raster("diagram has no area".to_string()));
    }
    #[allow(clippy::cast_precision_loss)]
    let scale = (max_width.max(1) as f32 / size.width())
        .min(max_height.max(1) as f32 / size.height());
    render_tree(&tree, scale, background)
}

fn render_tree(
    tree: &usvg::Tree,
    scale: f32,
    background: [u8; 3],
) -> Result<RgbaImage, RenderError> {
    let size = tree.size();
    let (w, h) = (size.width() * scale, size.height() * scale);
    if !(w.is_finite() && h.is_finite()) || w > MAX_EDGE_PX || h > MAX_EDGE_PX {
        return Err(RenderError::Raster(format!(
            "raster size {w:.0}x{h:.0} exceeds {MAX_EDGE_PX:.0}px"
        )));
    }
    let (width, height) = (ceil_px(w).max(1), ceil_px(h).max(1));

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Raster(format!("failed to create pixmap {width}x{height}")))?;
    let [r, g, b] = background;
    pixmap.fill(Color::from_rgba8(r, g, b, 255));
    resvg::render(tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    // The background is opaque, so premultiplied and straight alpha agree.
    RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| RenderError::Raster("pixmap buffer size mismatch".to_string()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_px(v: f32) -> u32 {
    v.max(0.0).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><rect x="0" y="0" width="50" height="50" fill="#ff0000"/></svg>"##;

    #[test]
    fn test_rasterize_scales_dimensions() {
        let img = rasterize(BOX, 2.0, [255, 255, 255]).unwrap();
        assert_eq!(img.dimensions(), (200, 100));
    }

    #[test]
    fn test_rasterize_paints_background_and_content() {
        let img = rasterize(BOX, 1.0, [0x1f, 0x29, 0x37]).unwrap();
        assert_eq!(img.get_pixel(10, 10).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(90, 10).0, [0x1f, 0x29, 0x37, 255]);
    }

    #[test]
    fn test_rasterize_to_fit_preserves_aspect_ratio() {
        let img = rasterize_to_fit(BOX, 400, 400, [255, 255, 255]).unwrap();
        assert_eq!(img.dimensions(), (400, 200));

        let img = rasterize_to_fit(BOX, 400, 50, [255, 255, 255]).unwrap();
        assert_eq!(img.dimensions(), (100, 50));
    }

    #[test]
    fn test_rasterize_rejects_oversized_output() {
        let err = rasterize(BOX, 1_000.0, [0, 0, 0]).unwrap_err();
        assert!(matches!(err, RenderError::Raster(_)));
    }
}
