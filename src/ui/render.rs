use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthChar;

use crate::app::Model;
use crate::highlight::{TokenKind, highlight_line};
use crate::preview::PreviewState;

use super::style::{Palette, palette};
use super::{EDITOR_WIDTH_PERCENT, PREVIEW_WIDTH_PERCENT, images, overlays, status};

/// Text shown in the preview pane when the source is blank.
pub const PLACEHOLDER_TEXT: &str = "Enter Mermaid code to see preview";

/// Screen regions of the main view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub toolbar: Rect,
    pub editor: Rect,
    pub preview: Rect,
    pub toast: Option<Rect>,
    pub status: Rect,
}

pub fn split_layout(area: Rect, toast_active: bool) -> AppLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(u16::from(toast_active)),
            Constraint::Length(1),
        ])
        .split(area);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(EDITOR_WIDTH_PERCENT),
            Constraint::Percentage(PREVIEW_WIDTH_PERCENT),
        ])
        .split(rows[1]);
    AppLayout {
        toolbar: rows[0],
        editor: panes[0],
        preview: panes[1],
        toast: toast_active.then_some(rows[2]),
        status: rows[3],
    }
}

/// Area inside a bordered pane.
pub fn pane_inner(pane: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(pane)
}

/// Text area of the editor pane, right of the line number gutter.
pub fn editor_text_area(editor_pane: Rect, line_count: usize) -> Rect {
    let inner = pane_inner(editor_pane);
    let gutter = line_number_width(line_count) + 1;
    Rect {
        x: inner.x + gutter.min(inner.width),
        width: inner.width.saturating_sub(gutter),
        ..inner
    }
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}

/// Display columns occupied by the first `chars` chars of `line`.
pub fn display_col(line: &str, chars: usize) -> usize {
    line.chars().take(chars).map(|c| c.width().unwrap_or(0)).sum()
}

/// Char index under display column `col`, clamped to the line end.
pub fn char_at_display_col(line: &str, col: usize) -> usize {
    let mut used = 0;
    for (idx, ch) in line.chars().enumerate() {
        let w = ch.width().unwrap_or(0);
        if used + w > col {
            return idx;
        }
        used += w;
    }
    line.chars().count()
}

/// First visible display column, chosen so the cursor stays on screen.
pub const fn horizontal_offset(cursor_display_col: usize, width: usize) -> usize {
    if width == 0 || cursor_display_col < width {
        0
    } else {
        cursor_display_col + 1 - width
    }
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let colors = palette(model.theme);
    let layout = split_layout(area, model.active_toast().is_some());

    frame.render_widget(Block::default().style(colors.base()), area);
    render_toolbar(model, frame, layout.toolbar, &colors);
    render_editor(model, frame, layout.editor, &colors);
    render_preview(model, frame, layout.preview, &colors);
    if let Some(toast_area) = layout.toast {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, layout.status, &colors);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area, &colors);
    } else if model.template_picker.is_some() {
        overlays::render_template_picker(model, frame, area, &colors);
    }
}

fn render_toolbar(model: &Model, frame: &mut Frame, area: Rect, colors: &Palette) {
    let key = Style::default()
        .fg(colors.accent)
        .add_modifier(Modifier::BOLD);
    let theme_label = if model.theme.is_dark() {
        "Dark"
    } else {
        "Light"
    };
    let mut spans = vec![Span::styled(" Mermaid Studio ", colors.title()), Span::raw("│")];
    for (shortcut, label) in [
        ("^O", "Templates"),
        ("^T", theme_label),
        ("F5", "SVG"),
        ("F6", "PNG"),
        ("F7", "PDF"),
        ("^R", "Render"),
        ("F1", "Help"),
    ] {
        spans.push(Span::styled(format!(" {shortcut}"), key));
        spans.push(Span::raw(format!(" {label} ")));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).style(colors.bar()), area);
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect, colors: &Palette) {
    let buf = &model.editor;
    let title = model.file_path.as_ref().and_then(|p| p.file_name()).map_or_else(
        || " Editor ".to_string(),
        |name| format!(" {} ", name.to_string_lossy()),
    );
    let dirty = if model.editor_is_dirty() { "● " } else { "" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::styled(format!("{title}{dirty}"), colors.title()))
        .border_style(colors.border_style(!model.overlay_open()))
        .style(colors.base());
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let total_lines = buf.line_count();
    let text_area = editor_text_area(area, total_lines);
    let inner = pane_inner(area);
    let gutter = Rect {
        width: text_area.x.saturating_sub(inner.x),
        ..inner
    };
    if text_area.width == 0 || text_area.height == 0 {
        return;
    }

    let cursor = buf.cursor();
    let cursor_line = buf.line_at(cursor.line).unwrap_or_default();
    let hoff = horizontal_offset(
        display_col(&cursor_line, cursor.col),
        usize::from(text_area.width),
    );

    let start = model.editor_scroll_offset;
    let end = (start + usize::from(text_area.height)).min(total_lines);
    let number_width = usize::from(gutter.width.saturating_sub(1));
    let mut numbers: Vec<Line> = Vec::new();
    let mut content: Vec<Line> = Vec::new();
    for line_idx in start..end {
        let text = buf.line_at(line_idx).unwrap_or_default();
        let number_style = if line_idx == cursor.line {
            Style::default().fg(colors.text)
        } else {
            Style::default().fg(colors.gutter)
        };
        numbers.push(Line::styled(
            format!("{:>number_width$} ", line_idx + 1),
            number_style,
        ));
        let cursor_col = (line_idx == cursor.line).then_some(cursor.col);
        content.push(Line::from(editor_line_spans(&text, cursor_col, hoff, colors)));
    }
    frame.render_widget(Paragraph::new(numbers), gutter);
    frame.render_widget(Paragraph::new(content), text_area);
}

/// Highlighted spans for one editor line, starting at display column `hoff`.
pub fn editor_line_spans(
    text: &str,
    cursor_col: Option<usize>,
    hoff: usize,
    colors: &Palette,
) -> Vec<Span<'static>> {
    let tokens = highlight_line(text);
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut token_idx = 0;
    let mut col = 0;
    let mut char_count = 0;
    for (char_idx, (byte, ch)) in text.char_indices().enumerate() {
        char_count = char_idx + 1;
        while token_idx + 1 < tokens.len() && tokens[token_idx].range.end <= byte {
            token_idx += 1;
        }
        let start = col;
        col += ch.width().unwrap_or(0);
        if start < hoff {
            continue;
        }
        let style = if cursor_col == Some(char_idx) {
            colors.cursor()
        } else {
            colors.token(tokens.get(token_idx).map_or(TokenKind::Text, |t| t.kind))
        };
        push_char(&mut spans, ch, style);
    }
    if cursor_col.is_some_and(|c| c >= char_count) {
        spans.push(Span::styled(" ", colors.cursor()));
    }
    spans
}

fn push_char(spans: &mut Vec<Span<'static>>, ch: char, style: Style) {
    match spans.last_mut() {
        Some(last) if last.style == style => last.content.to_mut().push(ch),
        _ => spans.push(Span::styled(ch.to_string(), style)),
    }
}

fn render_preview(model: &mut Model, frame: &mut Frame, area: Rect, colors: &Palette) {
    let loading = model.preview.is_loading();
    let title = if loading {
        " Preview · Rendering... "
    } else {
        " Preview "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::styled(title, colors.title()))
        .border_style(colors.border_style(false))
        .style(colors.base());
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let summary = match model.preview.state() {
        PreviewState::Idle | PreviewState::Placeholder => {
            render_centered(frame, inner, PLACEHOLDER_TEXT, Style::default().fg(colors.muted));
            return;
        }
        PreviewState::Errored { message } => {
            render_error_panel(frame, inner, message, colors);
            return;
        }
        PreviewState::Loading { previous: None, .. } => {
            render_centered(frame, inner, "Rendering...", Style::default().fg(colors.muted));
            return;
        }
        PreviewState::Rendered(artifact)
        | PreviewState::Loading {
            previous: Some(artifact),
            ..
        } => format!("Diagram rendered ({}×{} px)", artifact.width, artifact.height),
    };

    if let Some(image) = model.preview_image.as_mut() {
        images::render_preview_image(&mut image.protocol, frame, inner);
        return;
    }
    let hint = if model.images_enabled && model.picker.is_some() {
        "Preparing image..."
    } else {
        "Inline images are off. Export with F5, F6 or F7."
    };
    let lines = vec![
        Line::styled(summary, Style::default().fg(colors.text)),
        Line::raw(""),
        Line::styled(hint, Style::default().fg(colors.muted)),
    ];
    let top = inner.y + inner.height.saturating_sub(3) / 2;
    let text_area = Rect {
        y: top,
        height: inner.height.saturating_sub(top - inner.y),
        ..inner
    };
    frame.render_widget(Paragraph::new(lines).centered(), text_area);
}

fn render_centered(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    if area.height == 0 {
        return;
    }
    let row = Rect {
        y: area.y + area.height / 2,
        height: 1,
        ..area
    };
    frame.render_widget(Paragraph::new(Line::styled(text.to_string(), style)).centered(), row);
}

fn render_error_panel(frame: &mut Frame, area: Rect, message: &str, colors: &Palette) {
    let error = Style::default().fg(colors.error);
    let panel = Block::default()
        .borders(Borders::ALL)
        .border_style(error)
        .title(Line::styled(
            " ⚠ Render Error ",
            error.add_modifier(Modifier::BOLD),
        ));
    let height = area.height.min(12).max(3.min(area.height));
    let panel_area = Rect {
        x: area.x + 1.min(area.width),
        y: area.y + area.height.saturating_sub(height) / 2,
        width: area.width.saturating_sub(2),
        height,
    };
    let body = Paragraph::new(message.to_string())
        .style(Style::default().fg(colors.text))
        .wrap(Wrap { trim: false })
        .block(panel);
    frame.render_widget(body, panel_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_splits_panes_evenly() {
        let layout = split_layout(Rect::new(0, 0, 100, 30), false);
        assert_eq!(layout.toolbar, Rect::new(0, 0, 100, 1));
        assert_eq!(layout.editor, Rect::new(0, 1, 50, 28));
        assert_eq!(layout.preview, Rect::new(50, 1, 50, 28));
        assert_eq!(layout.status, Rect::new(0, 29, 100, 1));
        assert!(layout.toast.is_none());
    }

    #[test]
    fn test_toast_row_sits_above_status() {
        let layout = split_layout(Rect::new(0, 0, 100, 30), true);
        assert_eq!(layout.toast, Some(Rect::new(0, 28, 100, 1)));
        assert_eq!(layout.editor.height, 27);
    }

    #[test]
    fn test_editor_text_area_leaves_room_for_gutter() {
        let text = editor_text_area(Rect::new(0, 1, 40, 20), 120);
        // border + 3 digits + space
        assert_eq!(text.x, 5);
        assert_eq!(text.width, 34);
        assert_eq!(text.height, 18);
    }

    #[test]
    fn test_display_columns_count_wide_chars() {
        assert_eq!(display_col("ab", 2), 2);
        assert_eq!(display_col("日本", 1), 2);
        assert_eq!(char_at_display_col("日本x", 3), 1);
        assert_eq!(char_at_display_col("abc", 10), 3);
    }

    #[test]
    fn test_horizontal_offset_keeps_cursor_visible() {
        assert_eq!(horizontal_offset(5, 10), 0);
        assert_eq!(horizontal_offset(10, 10), 1);
        assert_eq!(horizontal_offset(25, 10), 16);
    }

    #[test]
    fn test_cursor_past_end_gets_block() {
        let colors = palette(crate::theme::Theme::Light);
        let spans = editor_line_spans("ab", Some(2), 0, &colors);
        let last = spans.last().unwrap();
        assert_eq!(last.content, " ");
        assert_eq!(last.style, colors.cursor());
    }

    #[test]
    fn test_spans_merge_runs_of_same_style() {
        let colors = palette(crate::theme::Theme::Dark);
        let spans = editor_line_spans("graph TD", None, 0, &colors);
        let texts: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["graph", " ", "TD"]);
        assert_eq!(spans[0].style, colors.token(TokenKind::Keyword));
    }
}
