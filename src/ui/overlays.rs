use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;
use crate::templates::Category;

use super::render::editor_line_spans;
use super::style::Palette;

const PICKER_WIDTH: u16 = 84;
const PICKER_HEIGHT: u16 = 20;

pub fn template_picker_rect(area: Rect) -> Rect {
    let width = area.width.saturating_sub(8).clamp(40, PICKER_WIDTH);
    let height = area.height.saturating_sub(4).clamp(10, PICKER_HEIGHT);
    centered_popup_rect(width, height, area)
}

pub fn render_template_picker(model: &Model, frame: &mut Frame, area: Rect, colors: &Palette) {
    let Some(picker) = model.template_picker else {
        return;
    };
    let popup = template_picker_rect(area);
    let block = Block::default()
        .title(Line::styled(" Templates ", colors.title()))
        .borders(Borders::ALL)
        .border_style(colors.border_style(true))
        .padding(Padding::horizontal(1))
        .style(colors.base());
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let mut tabs: Vec<Span> = Vec::new();
    for (idx, category) in Category::ALL.iter().enumerate() {
        let label = format!(" {} {} ", idx + 1, category.label());
        let style = if *category == picker.category {
            Style::default()
                .bg(colors.accent)
                .fg(colors.background)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.muted)
        };
        tabs.push(Span::styled(label, style));
        tabs.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(tabs)), rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(rows[2]);

    let entries = picker.entries();
    let visible = usize::from(body[0].height);
    let first = picker.selected.saturating_sub(visible.saturating_sub(1));
    let items: Vec<Line> = entries
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(idx, template)| {
            if idx == picker.selected {
                Line::styled(
                    format!("▸ {} {}", template.icon, template.name),
                    Style::default()
                        .bg(colors.selection_bg)
                        .fg(colors.text)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Line::styled(
                    format!("  {} {}", template.icon, template.name),
                    Style::default().fg(colors.text),
                )
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(items), body[0]);

    if let Some(template) = picker.current() {
        let preview: Vec<Line> = template
            .preview_lines()
            .into_iter()
            .map(|line| Line::from(editor_line_spans(line, None, 0, colors)))
            .collect();
        let preview_block = Block::default()
            .borders(Borders::LEFT)
            .border_style(colors.border_style(false))
            .padding(Padding::left(1));
        frame.render_widget(Paragraph::new(preview).block(preview_block), body[1]);
    }

    let footer = Line::styled(
        "↑/↓ select · ←/→ or Tab category · 1-5 jump · Enter insert · Esc close",
        Style::default().fg(colors.muted),
    );
    frame.render_widget(Paragraph::new(footer), rows[3]);
}

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect, colors: &Palette) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(4).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let show = |path: Option<&std::path::PathBuf>, missing: &str| {
        path.map_or_else(|| missing.to_string(), |p| p.display().to_string())
    };
    let section = colors.title();

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::styled("Editing", section));
    lines.push(Line::raw("  Type                Edit the diagram source"));
    lines.push(Line::raw("  Tab / Enter         Indent / new line (keeps indent)"));
    lines.push(Line::raw("  Arrows, Home/End    Move the cursor"));
    lines.push(Line::raw("  Ctrl+Left/Right     Word movement"));
    lines.push(Line::raw("  Ctrl+Home/End       Document start / end"));
    lines.push(Line::raw("  PageUp/PageDown     Page through the source"));
    lines.push(Line::raw("  Ctrl-s              Save file"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Preview & export", section));
    lines.push(Line::raw("  Ctrl-t              Toggle dark / light theme"));
    lines.push(Line::raw("  Ctrl-r              Re-render now"));
    lines.push(Line::raw("  F5 / F6 / F7        Export SVG / PNG / PDF"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Templates", section));
    lines.push(Line::raw("  Ctrl-o              Open the template picker"));
    lines.push(Line::raw("  Up/Down, Enter      Choose and insert"));
    lines.push(Line::raw("  Left/Right, Tab, 1-5  Switch category"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Other", section));
    lines.push(Line::raw("  F1                  Toggle help"));
    lines.push(Line::raw("  Ctrl-q / Ctrl-c     Quit (twice with unsaved changes)"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Files", section));
    lines.push(Line::raw(format!(
        "  Exports: {}",
        model.exporter.out_dir.display()
    )));
    lines.push(Line::raw(format!(
        "  Preferences: {}",
        show(model.preferences_path.as_ref(), "<not saved>")
    )));
    lines.push(Line::raw(format!(
        "  Global config: {}",
        show(model.config_global_path.as_ref(), "<unknown>")
    )));
    lines.push(Line::raw(format!(
        "  Local override: {}",
        show(model.config_local_path.as_ref(), "<none>")
    )));

    let block = Block::default()
        .title(Line::styled(" Help ", colors.title()))
        .borders(Borders::ALL)
        .border_style(colors.border_style(true))
        .padding(Padding::uniform(1))
        .style(colors.base());
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let content_height = inner.height.saturating_sub(1);
    let content = Rect {
        height: content_height,
        ..inner
    };
    frame.render_widget(Paragraph::new(lines), content);

    let footer = Rect {
        y: inner.y + content_height,
        height: 1,
        ..inner
    };
    frame.render_widget(
        Paragraph::new(Line::styled(
            "Any key closes",
            Style::default().fg(colors.muted),
        )),
        footer,
    );
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
