//! Terminal graphics for the preview pane.

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use ratatui::prelude::*;
use ratatui_image::picker::Picker;
#[cfg(unix)]
use ratatui_image::picker::cap_parser::QueryStdioOptions;
use ratatui_image::protocol::{StatefulProtocol, StatefulProtocolType};
use ratatui_image::{Resize, StatefulImage};

#[cfg(unix)]
const PICKER_QUERY_TIMEOUT_MS: u64 = 250;

/// Create a picker for terminal image rendering.
///
/// Must run before the terminal enters raw mode because it queries stdio.
pub fn create_picker(force_half_cell: bool) -> Option<Picker> {
    if force_half_cell {
        tracing::debug!("half-cell graphics forced");
        return Some(Picker::halfblocks());
    }

    // The stdio query can leave a reader thread on the Windows console input.
    #[cfg(not(unix))]
    {
        return Some(Picker::halfblocks());
    }

    #[cfg(unix)]
    {
        let picker = Picker::from_query_stdio_with_options(query_options())
            .inspect_err(|err| tracing::warn!(?err, "terminal graphics query failed"))
            .ok()?;
        tracing::debug!(
            term = %std::env::var("TERM").unwrap_or_default(),
            protocol = ?picker.protocol_type(),
            "graphics picker ready"
        );
        Some(picker)
    }
}

#[cfg(unix)]
fn query_options() -> QueryStdioOptions {
    let mut options = QueryStdioOptions::default();
    options.timeout = std::time::Duration::from_millis(PICKER_QUERY_TIMEOUT_MS);
    options
}

/// Whether terminal output should be treated as truecolor-capable.
pub fn supports_truecolor_terminal() -> bool {
    if std::env::var("TERM_PROGRAM")
        .ok()
        .as_deref()
        .is_some_and(|v| v == "Apple_Terminal")
    {
        return false;
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    fn has(value: Option<&str>, needles: &[&str]) -> bool {
        value.is_some_and(|v| {
            let lower = v.to_ascii_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
    }
    has(colorterm, &["truecolor", "24bit"]) || has(term, &["direct", "truecolor"])
}

/// Quantize RGB channels to the xterm 256-color cube, keeping alpha.
pub fn quantize_to_ansi256(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let mut out = RgbaImage::new(width, height);
    for (x, y, px) in image.to_rgba8().enumerate_pixels() {
        let (r, g, b) = cube_to_rgb(rgb_to_cube(px[0], px[1], px[2]));
        out.put_pixel(x, y, Rgba([r, g, b, px[3]]));
    }
    DynamicImage::ImageRgba8(out)
}

#[allow(clippy::cast_possible_truncation)]
fn rgb_to_cube(r: u8, g: u8, b: u8) -> u8 {
    let to_cube = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    16 + 36 * to_cube(r) + 6 * to_cube(g) + to_cube(b)
}

fn cube_to_rgb(idx: u8) -> (u8, u8, u8) {
    let i = idx.saturating_sub(16);
    let to_val = |c: u8| if c == 0 { 0 } else { 55 + c * 40 };
    (to_val((i / 36) % 6), to_val((i / 6) % 6), to_val(i % 6))
}

/// Scaling used for a protocol; half-cell output aliases badly with
/// nearest-neighbor sampling.
pub fn resize_for(protocol: &StatefulProtocol) -> Resize {
    if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_)) {
        Resize::Scale(Some(image::imageops::FilterType::CatmullRom))
    } else {
        Resize::Scale(None)
    }
}

/// Cells the protocol occupies when fitted into `area`.
pub fn protocol_render_size(protocol: &StatefulProtocol, area: Rect) -> Rect {
    protocol.size_for(resize_for(protocol), area)
}

/// Draw the preview image centered in `area`.
pub fn render_preview_image(protocol: &mut StatefulProtocol, frame: &mut Frame, area: Rect) {
    let size = protocol_render_size(protocol, area);
    let target = Rect {
        x: area.x + area.width.saturating_sub(size.width) / 2,
        y: area.y + area.height.saturating_sub(size.height) / 2,
        width: size.width.min(area.width),
        height: size.height.min(area.height),
    };
    let widget = StatefulImage::default().resize(resize_for(protocol));
    frame.render_stateful_widget(widget, target, protocol);
}
