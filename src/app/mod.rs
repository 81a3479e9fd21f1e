//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, PreviewImage, TemplatePicker, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::config::PreferenceStore;
use crate::preview::RenderDebouncer;
use crate::theme::Theme;

/// Main application struct that owns the startup options and runs the
/// event loop.
pub struct App {
    source: String,
    file_path: Option<PathBuf>,
    theme: Theme,
    preferences: Option<PreferenceStore>,
    watch_enabled: bool,
    images_enabled: bool,
    force_half_cell: bool,
    out_dir: PathBuf,
    render_delay_ms: u64,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application editing `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            file_path: None,
            theme: Theme::default(),
            preferences: None,
            watch_enabled: false,
            images_enabled: true,
            force_half_cell: false,
            out_dir: PathBuf::from("."),
            render_delay_ms: RenderDebouncer::DEFAULT_DELAY_MS,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Back the document with a file for saving and watching.
    pub fn with_file(mut self, path: Option<PathBuf>) -> Self {
        self.file_path = path;
        self
    }

    pub const fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Persist theme toggles to this store.
    pub fn with_preferences(mut self, store: Option<PreferenceStore>) -> Self {
        self.preferences = store;
        self
    }

    /// Enable or disable file watching.
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Enable or disable inline image rendering.
    pub const fn with_images_enabled(mut self, enabled: bool) -> Self {
        self.images_enabled = enabled;
        self
    }

    /// Skip graphics protocol detection and draw with half blocks.
    pub const fn with_force_half_cell(mut self, enabled: bool) -> Self {
        self.force_half_cell = enabled;
        self
    }

    /// Directory exports are written to.
    pub fn with_out_dir(mut self, dir: PathBuf) -> Self {
        self.out_dir = dir;
        self
    }

    /// Quiet period after the last edit before the preview re-renders.
    pub const fn with_render_delay_ms(mut self, delay_ms: u64) -> Self {
        self.render_delay_ms = delay_ms;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
