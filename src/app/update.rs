use crate::app::{Model, ToastLevel};
use crate::app::TemplatePicker;
use crate::editor::Direction;
use crate::export::ExportFormat;
use crate::preview::{Completion, RenderCompletion};
use crate::templates::Category;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing
    /// Insert a character at the cursor
    InsertChar(char),
    /// Insert pasted text at the cursor
    InsertText(String),
    /// Insert one level of indentation
    InsertIndent,
    /// Split the line at the cursor, keeping its indentation
    NewLine,
    /// Delete the character before the cursor
    DeleteBack,
    /// Delete the character at the cursor
    DeleteForward,
    MoveCursor(Direction),
    MoveHome,
    MoveEnd,
    MoveWordLeft,
    MoveWordRight,
    /// Move the cursor to the start of the document
    MoveToStart,
    /// Move the cursor to the end of the document
    MoveToEnd,
    /// Move the cursor to (line, col), e.g. on click
    MoveTo(usize, usize),
    PageUp,
    PageDown,
    /// Scroll the editor up by n lines without moving the cursor
    ScrollUp(usize),
    /// Scroll the editor down by n lines without moving the cursor
    ScrollDown(usize),

    // Theme and preview
    /// Switch between dark and light mode
    ToggleTheme,
    /// Render again even if nothing changed
    Rerender,
    /// A background render finished
    RenderFinished(RenderCompletion),

    // Templates
    OpenTemplates,
    CloseTemplates,
    TemplateUp,
    TemplateDown,
    TemplateNextCategory,
    TemplatePrevCategory,
    /// Jump to the category at this tab index
    TemplateCategory(usize),
    /// Replace the document with the selected template
    TemplateSelect,

    // Files
    /// Export the current rendering
    Export(ExportFormat),
    /// Save the editor contents to the backing file
    Save,
    /// The backing file changed on disk
    FileChanged,

    // Application
    ToggleHelp,
    HideHelp,
    /// Terminal resized
    Resize(u16, u16),
    /// Force redraw
    Redraw,
    /// Quit application
    Quit,
}

impl Message {
    /// Whether the preview should be refreshed right away instead of after
    /// the typing debounce.
    pub const fn renders_immediately(&self) -> bool {
        matches!(
            self,
            Self::ToggleTheme | Self::Rerender | Self::TemplateSelect | Self::FileChanged
        )
    }
}

/// Pure state transition.
pub fn update(mut model: Model, msg: Message) -> Model {
    // Save preserves the flag so Ctrl+S can be followed by the second Ctrl+Q.
    if !matches!(msg, Message::Quit | Message::Save) {
        model.quit_confirmed = false;
    }

    match msg {
        // Editing
        Message::InsertChar(ch) => {
            model.editor.insert_char(ch);
            ensure_cursor_visible(&mut model);
        }
        Message::InsertText(text) => {
            model.editor.insert_str(&text);
            ensure_cursor_visible(&mut model);
        }
        Message::InsertIndent => {
            model.editor.insert_indent();
            ensure_cursor_visible(&mut model);
        }
        Message::NewLine => {
            model.editor.split_line();
            ensure_cursor_visible(&mut model);
        }
        Message::DeleteBack => {
            model.editor.delete_back();
            ensure_cursor_visible(&mut model);
        }
        Message::DeleteForward => {
            model.editor.delete_forward();
        }
        Message::MoveCursor(dir) => {
            model.editor.move_cursor(dir);
            ensure_cursor_visible(&mut model);
        }
        Message::MoveHome => model.editor.move_home(),
        Message::MoveEnd => model.editor.move_end(),
        Message::MoveWordLeft => {
            model.editor.move_word_left();
            ensure_cursor_visible(&mut model);
        }
        Message::MoveWordRight => {
            model.editor.move_word_right();
            ensure_cursor_visible(&mut model);
        }
        Message::MoveToStart => {
            model.editor.move_to_start();
            ensure_cursor_visible(&mut model);
        }
        Message::MoveToEnd => {
            model.editor.move_to_end();
            ensure_cursor_visible(&mut model);
        }
        Message::MoveTo(line, col) => {
            model.editor.move_to(line, col);
            ensure_cursor_visible(&mut model);
        }
        Message::PageUp => {
            let rows = model.editor_rows().max(1);
            model.editor.move_lines(-isize::try_from(rows).unwrap_or(isize::MAX));
            model.editor_scroll_offset = model.editor_scroll_offset.saturating_sub(rows);
            ensure_cursor_visible(&mut model);
        }
        Message::PageDown => {
            let rows = model.editor_rows().max(1);
            model.editor.move_lines(isize::try_from(rows).unwrap_or(isize::MAX));
            let max = model.editor.line_count().saturating_sub(1);
            model.editor_scroll_offset = (model.editor_scroll_offset + rows).min(max);
            ensure_cursor_visible(&mut model);
        }
        Message::ScrollUp(n) => {
            model.editor_scroll_offset = model.editor_scroll_offset.saturating_sub(n);
        }
        Message::ScrollDown(n) => {
            let max = model.editor.line_count().saturating_sub(1);
            model.editor_scroll_offset = (model.editor_scroll_offset + n).min(max);
        }

        // Theme and preview
        Message::ToggleTheme => {
            model.theme = model.theme.toggle();
            tracing::info!(theme = %model.theme, "theme changed");
        }
        Message::Rerender => model.preview.invalidate(),
        Message::RenderFinished(completion) => {
            if model.preview.complete(completion) == Completion::Applied
                && model.preview.artifact().is_none()
            {
                model.preview_image = None;
            }
        }

        // Templates
        Message::OpenTemplates => {
            model.help_visible = false;
            model.template_picker = Some(TemplatePicker::default());
        }
        Message::CloseTemplates => model.template_picker = None,
        Message::TemplateUp => {
            if let Some(picker) = model.template_picker.as_mut() {
                picker.move_selection(-1);
            }
        }
        Message::TemplateDown => {
            if let Some(picker) = model.template_picker.as_mut() {
                picker.move_selection(1);
            }
        }
        Message::TemplateNextCategory => {
            if let Some(picker) = model.template_picker.as_mut() {
                picker.select_category(picker.category.next());
            }
        }
        Message::TemplatePrevCategory => {
            if let Some(picker) = model.template_picker.as_mut() {
                picker.select_category(picker.category.prev());
            }
        }
        Message::TemplateCategory(idx) => {
            if let Some(picker) = model.template_picker.as_mut()
                && let Some(category) = Category::from_index(idx)
            {
                picker.select_category(category);
            }
        }
        Message::TemplateSelect => {
            if let Some(template) = model.template_picker.and_then(|p| p.current()) {
                model.replace_source(template.source);
                tracing::info!(template = template.name, "template inserted");
            }
            model.template_picker = None;
        }

        // Handled as side effects
        Message::Export(_) | Message::Save | Message::FileChanged | Message::Redraw => {}

        // Application
        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,
        Message::Resize(width, height) => {
            model.terminal_area = ratatui::layout::Rect::new(0, 0, width, height);
            ensure_cursor_visible(&mut model);
        }
        Message::Quit => {
            if model.editor_is_dirty() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press Ctrl+Q again to quit, or Ctrl+S to save",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
    }
    model
}

/// Ensure the editor cursor line is visible in the pane.
fn ensure_cursor_visible(model: &mut Model) {
    let cursor_line = model.editor.cursor().line;
    let visible_height = model.editor_rows();
    if visible_height == 0 {
        model.editor_scroll_offset = cursor_line;
        return;
    }

    if cursor_line < model.editor_scroll_offset {
        model.editor_scroll_offset = cursor_line;
    } else if cursor_line >= model.editor_scroll_offset + visible_height {
        model.editor_scroll_offset = cursor_line + 1 - visible_height;
    }
}
