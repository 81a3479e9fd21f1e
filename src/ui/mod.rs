//! Terminal UI components.
//!
//! - [`render`]: the split view (toolbar, editor pane, preview pane, status)
//! - [`style`]: per-theme colors
//! - overlays for the template picker and help

pub mod style;

mod images;
mod overlays;
mod render;
mod status;

pub use images::{create_picker, quantize_to_ansi256, supports_truecolor_terminal};
pub use overlays::template_picker_rect;
pub use render::{
    AppLayout, PLACEHOLDER_TEXT, char_at_display_col, display_col, editor_text_area,
    horizontal_offset, pane_inner, render, split_layout,
};

pub const EDITOR_WIDTH_PERCENT: u16 = 50;
pub const PREVIEW_WIDTH_PERCENT: u16 = 50;

#[cfg(test)]
mod tests;
