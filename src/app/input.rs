use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::app::{App, Message, Model};
use crate::editor::Direction;
use crate::export::ExportFormat;

use super::event_loop::ResizeDebouncer;

/// Lines scrolled per mouse wheel step.
const WHEEL_LINES: usize = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Paste(text) if !model.overlay_open() => Some(Message::InsertText(text.clone())),
            Event::Resize(w, h) => {
                tracing::trace!(width = w, height = h, "resize queued");
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            Event::FocusGained => Some(Message::Redraw),
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if ctrl && matches!(key.code, KeyCode::Char('q' | 'c')) {
            return Some(Message::Quit);
        }

        if model.help_visible {
            return Some(Message::HideHelp);
        }

        if model.template_picker.is_some() {
            return match key.code {
                KeyCode::Up => Some(Message::TemplateUp),
                KeyCode::Down => Some(Message::TemplateDown),
                KeyCode::Right | KeyCode::Tab => Some(Message::TemplateNextCategory),
                KeyCode::Left | KeyCode::BackTab => Some(Message::TemplatePrevCategory),
                KeyCode::Char(c @ '1'..='5') => {
                    Some(Message::TemplateCategory(usize::from(c as u8 - b'1')))
                }
                KeyCode::Enter => Some(Message::TemplateSelect),
                KeyCode::Esc => Some(Message::CloseTemplates),
                KeyCode::Char('o') if ctrl => Some(Message::CloseTemplates),
                _ => None,
            };
        }

        match key.code {
            // Commands
            KeyCode::Char('o') if ctrl => Some(Message::OpenTemplates),
            KeyCode::Char('t') if ctrl => Some(Message::ToggleTheme),
            KeyCode::Char('r') if ctrl => Some(Message::Rerender),
            KeyCode::Char('s') if ctrl => Some(Message::Save),
            KeyCode::F(1) => Some(Message::ToggleHelp),
            KeyCode::F(5) => Some(Message::Export(ExportFormat::Svg)),
            KeyCode::F(6) => Some(Message::Export(ExportFormat::Png)),
            KeyCode::F(7) => Some(Message::Export(ExportFormat::Pdf)),

            // Navigation
            KeyCode::Left if ctrl => Some(Message::MoveWordLeft),
            KeyCode::Right if ctrl => Some(Message::MoveWordRight),
            KeyCode::Home if ctrl => Some(Message::MoveToStart),
            KeyCode::End if ctrl => Some(Message::MoveToEnd),
            KeyCode::Up => Some(Message::MoveCursor(Direction::Up)),
            KeyCode::Down => Some(Message::MoveCursor(Direction::Down)),
            KeyCode::Left => Some(Message::MoveCursor(Direction::Left)),
            KeyCode::Right => Some(Message::MoveCursor(Direction::Right)),
            KeyCode::Home => Some(Message::MoveHome),
            KeyCode::End => Some(Message::MoveEnd),
            KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::PageDown => Some(Message::PageDown),

            // Editing
            KeyCode::Enter => Some(Message::NewLine),
            KeyCode::Tab => Some(Message::InsertIndent),
            KeyCode::Backspace => Some(Message::DeleteBack),
            KeyCode::Delete => Some(Message::DeleteForward),
            KeyCode::Char(c) if !ctrl && !alt => Some(Message::InsertChar(c)),

            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return matches!(mouse.kind, MouseEventKind::Up(MouseButton::Left))
                .then_some(Message::HideHelp);
        }

        if model.template_picker.is_some() {
            let popup = crate::ui::template_picker_rect(model.terminal_area);
            return match mouse.kind {
                MouseEventKind::Up(MouseButton::Left)
                    if !point_in_rect(mouse.column, mouse.row, popup) =>
                {
                    Some(Message::CloseTemplates)
                }
                MouseEventKind::ScrollDown => Some(Message::TemplateDown),
                MouseEventKind::ScrollUp => Some(Message::TemplateUp),
                _ => None,
            };
        }

        let editor_pane = model.layout().editor;
        if !point_in_rect(mouse.column, mouse.row, editor_pane) {
            return None;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                editor_position_at(model, mouse.column, mouse.row)
                    .map(|(line, col)| Message::MoveTo(line, col))
            }
            MouseEventKind::ScrollDown => Some(Message::ScrollDown(WHEEL_LINES)),
            MouseEventKind::ScrollUp => Some(Message::ScrollUp(WHEEL_LINES)),
            _ => None,
        }
    }

    pub(super) fn view(model: &mut Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}

/// Buffer position under a click in the editor text area.
fn editor_position_at(model: &Model, column: u16, row: u16) -> Option<(usize, usize)> {
    let buf = &model.editor;
    let text_area = crate::ui::editor_text_area(model.layout().editor, buf.line_count());
    if row < text_area.y || row >= text_area.y + text_area.height || column < text_area.x {
        return None;
    }
    let line = (model.editor_scroll_offset + usize::from(row - text_area.y))
        .min(buf.line_count().saturating_sub(1));

    // Match the horizontal scroll the renderer applies for the cursor line.
    let cursor = buf.cursor();
    let cursor_text = buf.line_at(cursor.line).unwrap_or_default();
    let hoff = crate::ui::horizontal_offset(
        crate::ui::display_col(&cursor_text, cursor.col),
        usize::from(text_area.width),
    );
    let text = buf.line_at(line).unwrap_or_default();
    let col = crate::ui::char_at_display_col(&text, hoff + usize::from(column - text_area.x));
    Some((line, col))
}

fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}
