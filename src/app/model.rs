use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use image::DynamicImage;
use ratatui::layout::Rect;
use ratatui_image::picker::{Picker, ProtocolType};
use ratatui_image::protocol::StatefulProtocol;

use crate::editor::{EditorBuffer, TextSource};
use crate::export::Exporter;
use crate::preview::PreviewController;
use crate::render::raster;
use crate::templates::{self, Category, Template};
use crate::theme::Theme;
use crate::ui::AppLayout;

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// State of the open template picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplatePicker {
    pub category: Category,
    /// Index into [`entries`](Self::entries).
    pub selected: usize,
}

impl TemplatePicker {
    pub fn entries(&self) -> Vec<&'static Template> {
        templates::templates_in(self.category)
    }

    pub fn current(&self) -> Option<&'static Template> {
        self.entries().get(self.selected).copied()
    }

    pub(super) fn select_category(&mut self, category: Category) {
        self.category = category;
        self.selected = 0;
    }

    pub(super) fn move_selection(&mut self, delta: isize) {
        let len = self.entries().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = self.selected.saturating_add_signed(delta).min(len - 1);
    }
}

/// The rasterized artifact as a terminal graphics protocol.
pub struct PreviewImage {
    pub protocol: StatefulProtocol,
    /// Identifies the artifact, theme and pane size it was built for.
    key: u64,
}

/// The complete application state.
///
/// All state lives here; the event loop only owns I/O handles.
pub struct Model {
    /// Diagram source being edited
    pub editor: EditorBuffer,
    /// First editor line shown in the pane
    pub editor_scroll_offset: usize,
    /// Backing file, if the document was opened from disk
    pub file_path: Option<PathBuf>,
    pub theme: Theme,
    pub preview: PreviewController,
    pub preview_image: Option<PreviewImage>,
    /// Preview key whose rasterization failed; not retried until it changes
    failed_preview_key: Option<u64>,
    /// Image picker for terminal rendering
    pub picker: Option<Picker>,
    /// Whether the preview is drawn as an inline image
    pub images_enabled: bool,
    /// Open template picker, if any
    pub template_picker: Option<TemplatePicker>,
    pub help_visible: bool,
    /// Whether external changes to the file are reloaded
    pub watch_enabled: bool,
    pub exporter: Exporter,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Preference file shown in help
    pub preferences_path: Option<PathBuf>,
    /// Full terminal area
    pub terminal_area: Rect,
    toast: Option<Toast>,
    /// True while a resize is settling; image work is deferred
    resize_pending: bool,
    /// Set after a first quit attempt with unsaved changes
    pub quit_confirmed: bool,
    pub should_quit: bool,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("file_path", &self.file_path)
            .field("theme", &self.theme)
            .field("preview", &self.preview.state())
            .field("template_picker", &self.template_picker)
            .field("watch_enabled", &self.watch_enabled)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model editing `source`.
    pub fn new(source: &str, file_path: Option<PathBuf>, terminal_size: (u16, u16)) -> Self {
        Self {
            editor: EditorBuffer::from_text(source),
            file_path,
            terminal_area: Rect::new(0, 0, terminal_size.0, terminal_size.1),
            ..Self::default()
        }
    }

    /// Set the image picker.
    #[must_use]
    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn layout(&self) -> AppLayout {
        crate::ui::split_layout(self.terminal_area, self.active_toast().is_some())
    }

    /// Rows of source visible in the editor pane.
    pub fn editor_rows(&self) -> usize {
        let text = crate::ui::editor_text_area(self.layout().editor, self.editor.line_count());
        usize::from(text.height)
    }

    pub const fn overlay_open(&self) -> bool {
        self.help_visible || self.template_picker.is_some()
    }

    /// Whether a file-backed document has unsaved changes.
    pub const fn editor_is_dirty(&self) -> bool {
        self.file_path.is_some() && self.editor.is_dirty()
    }

    /// Replace the whole document, e.g. with a template.
    ///
    /// Returns `false` when the text is unchanged.
    pub fn replace_source(&mut self, text: &str) -> bool {
        let changed = self.editor.replace_content(text);
        if changed {
            self.editor_scroll_offset = 0;
        }
        changed
    }

    /// Reload the backing file into the editor.
    pub(super) fn reload_from_disk(&mut self) -> Result<bool> {
        let Some(path) = self.file_path.clone() else {
            return Ok(false);
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let changed = self.replace_source(&text);
        self.editor.mark_clean();
        Ok(changed)
    }

    /// Write the editor contents to the backing file.
    pub(super) fn save_to_disk(&mut self) -> Result<Option<PathBuf>> {
        let Some(path) = self.file_path.clone() else {
            return Ok(None);
        };
        write_source(&path, &self.editor.text())?;
        self.editor.mark_clean();
        Ok(Some(path))
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    pub(super) const fn set_resize_pending(&mut self, pending: bool) {
        self.resize_pending = pending;
    }

    /// Build the preview image for the current artifact if it is missing or
    /// was built for a different artifact, theme or pane size.
    pub fn refresh_preview_image(&mut self) {
        if !self.images_enabled || self.resize_pending {
            return;
        }
        let Some(picker) = &self.picker else {
            return;
        };
        let Some(artifact) = self.preview.artifact() else {
            self.preview_image = None;
            return;
        };
        let area = crate::ui::pane_inner(self.layout().preview);
        if area.width == 0 || area.height == 0 {
            return;
        }
        let key = preview_key(&artifact.svg, self.theme, area);
        if self.failed_preview_key == Some(key)
            || self.preview_image.as_ref().is_some_and(|img| img.key == key)
        {
            return;
        }

        let (font_w, font_h) = picker.font_size();
        let max_w = u32::from(area.width) * u32::from(font_w);
        let max_h = u32::from(area.height) * u32::from(font_h);
        match raster::rasterize_to_fit(&artifact.svg, max_w, max_h, self.theme.export_background())
        {
            Ok(raster) => {
                let mut img = DynamicImage::ImageRgba8(raster);
                if matches!(picker.protocol_type(), ProtocolType::Halfblocks)
                    && !crate::ui::supports_truecolor_terminal()
                {
                    img = crate::ui::quantize_to_ansi256(&img);
                }
                tracing::debug!(
                    width = img.width(),
                    height = img.height(),
                    "preview image rebuilt"
                );
                let protocol = picker.new_resize_protocol(img);
                self.preview_image = Some(PreviewImage { protocol, key });
                self.failed_preview_key = None;
            }
            Err(err) => {
                tracing::warn!(%err, "preview rasterization failed");
                self.preview_image = None;
                self.failed_preview_key = Some(key);
            }
        }
    }
}

fn preview_key(svg: &str, theme: Theme, area: Rect) -> u64 {
    let mut hasher = DefaultHasher::new();
    svg.hash(&mut hasher);
    theme.hash(&mut hasher);
    (area.width, area.height).hash(&mut hasher);
    hasher.finish()
}

fn write_source(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self {
            editor: EditorBuffer::empty(),
            editor_scroll_offset: 0,
            file_path: None,
            theme: Theme::default(),
            preview: PreviewController::new(),
            preview_image: None,
            failed_preview_key: None,
            picker: None,
            images_enabled: true,
            template_picker: None,
            help_visible: false,
            watch_enabled: false,
            exporter: Exporter::new("."),
            config_global_path: None,
            config_local_path: None,
            preferences_path: None,
            terminal_area: Rect::new(0, 0, 80, 24),
            toast: None,
            resize_pending: false,
            quit_confirmed: false,
            should_quit: false,
        }
    }
}
