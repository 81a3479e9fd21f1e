use std::path::Path;
use std::time::Duration;

use crate::app::{App, Message, Model, ToastLevel};
use crate::export::ExportFormat;
use crate::watcher::FileWatcher;

impl App {
    pub(super) fn make_file_watcher(path: &Path) -> notify::Result<FileWatcher> {
        FileWatcher::new(path, Duration::from_millis(200))
    }

    pub(super) fn handle_message_side_effects(&self, model: &mut Model, msg: &Message) {
        match msg {
            Message::ToggleTheme => self.persist_theme(model),
            Message::Export(format) => export_current(model, *format),
            Message::Save => match model.save_to_disk() {
                Ok(Some(path)) => {
                    tracing::info!(path = %path.display(), "diagram saved");
                    model.show_toast(ToastLevel::Info, format!("Saved {}", path.display()));
                }
                Ok(None) => model.show_toast(
                    ToastLevel::Warning,
                    "No file to save to; start with `mermaid-studio FILE`",
                ),
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "save failed");
                    model.show_toast(ToastLevel::Error, format!("Save failed: {err:#}"));
                }
            },
            Message::FileChanged => {
                if model.editor_is_dirty() {
                    model.show_toast(
                        ToastLevel::Warning,
                        "File changed on disk; keeping your unsaved edits",
                    );
                    return;
                }
                match model.reload_from_disk() {
                    Ok(true) => model.show_toast(ToastLevel::Info, "Reloaded from disk"),
                    Ok(false) => {}
                    Err(err) => {
                        tracing::warn!(error = %format!("{err:#}"), "reload failed");
                        model.show_toast(ToastLevel::Error, format!("Reload failed: {err:#}"));
                    }
                }
            }
            _ => {}
        }
    }

    fn persist_theme(&self, model: &mut Model) {
        let Some(store) = &self.preferences else {
            return;
        };
        if let Err(err) = store.save_theme(model.theme) {
            tracing::warn!(error = %format!("{err:#}"), "failed to save theme preference");
            model.show_toast(
                ToastLevel::Warning,
                format!("Theme preference not saved: {err:#}"),
            );
        }
    }
}

fn export_current(model: &mut Model, format: ExportFormat) {
    let result = model
        .exporter
        .export(model.preview.artifact(), format, model.theme);
    match result {
        Ok(Some(path)) => {
            model.show_toast(
                ToastLevel::Info,
                format!("Exported {format} to {}", path.display()),
            );
        }
        // Nothing rendered yet.
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(%err, %format, "export failed");
            model.show_toast(ToastLevel::Error, format!("Export failed: {err}"));
        }
    }
}
