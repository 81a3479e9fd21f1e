use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};
use crate::preview::PreviewState;

use super::style::Palette;

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect, colors: &Palette) {
    let filename = model
        .file_path
        .as_ref()
        .and_then(|p| p.file_name())
        .map_or_else(|| "untitled".to_string(), |s| s.to_string_lossy().to_string());
    let dirty = if model.editor_is_dirty() {
        " [modified]"
    } else {
        ""
    };
    let cursor = model.editor.cursor();
    let preview = match model.preview.state() {
        PreviewState::Idle | PreviewState::Placeholder => "empty".to_string(),
        PreviewState::Loading { .. } => "rendering".to_string(),
        PreviewState::Rendered(artifact) => format!("{}×{}", artifact.width, artifact.height),
        PreviewState::Errored { .. } => "error".to_string(),
    };
    let watch = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };

    let status = format!(
        " {filename}{dirty}  Ln {}, Col {}  │ preview: {preview} │ theme: {}{watch}  F1:help",
        cursor.line + 1,
        cursor.col + 1,
        model.theme,
    );
    frame.render_widget(Paragraph::new(status).style(colors.bar()), area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
