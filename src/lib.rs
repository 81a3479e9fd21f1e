// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. render::RenderError)
    clippy::module_name_repetitions
)]

//! # Mermaid Studio
//!
//! A terminal editor for Mermaid diagrams with a live preview.
//!
//! Mermaid Studio pairs a source editor with a rendered preview:
//! - Re-renders shortly after typing stops, off the UI thread
//! - Inline preview images (Kitty, Sixel, iTerm2, half-block fallback)
//! - Template picker with categorized starter diagrams
//! - Dark and light themes, remembered between runs
//! - SVG, PNG and PDF export
//!
//! ## Architecture
//!
//! Mermaid Studio uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`editor`]: Source text buffer
//! - [`highlight`]: Mermaid syntax highlighting for the editor
//! - [`preview`]: Debounced, generation-checked render pipeline
//! - [`render`]: Mermaid to SVG rendering and rasterization
//! - [`export`]: SVG, PNG and PDF output
//! - [`templates`]: Built-in example diagrams
//! - [`theme`]: Light/dark theme and startup detection
//! - [`config`]: rc-file flags and stored preferences
//! - [`ui`]: Terminal UI components
//! - [`watcher`]: File watching

pub mod app;
pub mod config;
pub mod editor;
pub mod export;
pub mod highlight;
pub mod preview;
pub mod render;
pub mod templates;
pub mod theme;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::editor::{EditorBuffer, TextSource};
    pub use crate::preview::PreviewController;
    pub use crate::theme::Theme;
}
