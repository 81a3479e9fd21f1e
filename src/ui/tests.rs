use super::*;
use crate::app::{Message, Model, update};
use crate::editor::TextSource;
use crate::preview::RenderCompletion;
use crate::render::{Artifact, RenderError};
use crate::theme::Theme;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui_image::picker::Picker;
use std::path::PathBuf;

const SOURCE: &str = "graph TD\n    A[Start] --> B{Is it?}\n";
const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="60"><rect width="120" height="60" fill="#4477aa"/></svg>"##;

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(100, 30);
    Terminal::new(backend).unwrap()
}

fn draw(model: &mut Model) -> String {
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

fn artifact() -> Artifact {
    Artifact {
        svg: SVG.to_string(),
        width: 120,
        height: 60,
    }
}

fn finish(mut model: Model, result: Result<Artifact, RenderError>) -> Model {
    let request = model
        .preview
        .submit(&model.editor.text(), model.theme)
        .unwrap();
    update(
        model,
        Message::RenderFinished(RenderCompletion {
            generation: request.generation,
            result,
        }),
    )
}

#[test]
fn test_blank_source_shows_placeholder() {
    let mut model = Model::new("", None, (100, 30));
    assert!(model.preview.submit("", model.theme).is_none());
    let screen = draw(&mut model);
    assert!(screen.contains(PLACEHOLDER_TEXT));
}

#[test]
fn test_toolbar_lists_shortcuts() {
    let mut model = Model::new(SOURCE, None, (100, 30));
    let screen = draw(&mut model);
    let toolbar = screen.lines().next().unwrap();
    assert!(toolbar.contains("Mermaid Studio"));
    assert!(toolbar.contains("^O Templates"));
    assert!(toolbar.contains("F7 PDF"));
}

#[test]
fn test_editor_shows_numbered_source() {
    let mut model = Model::new(SOURCE, None, (100, 30));
    let screen = draw(&mut model);
    assert!(screen.contains(" Editor "));
    assert!(screen.contains("1 graph TD"));
    assert!(screen.contains("2     A[Start] --> B{Is it?}"));
}

#[test]
fn test_dirty_file_is_marked_in_title_and_status() {
    let model = Model::new(SOURCE, Some(PathBuf::from("flow.mmd")), (100, 30));
    let mut model = update(model, Message::InsertChar('%'));
    let screen = draw(&mut model);
    assert!(screen.contains(" flow.mmd ● "));
    assert!(screen.contains("flow.mmd [modified]"));
}

#[test]
fn test_loading_title_while_first_render_runs() {
    let mut model = Model::new(SOURCE, None, (100, 30));
    model.preview.submit(&model.editor.text(), model.theme).unwrap();
    let screen = draw(&mut model);
    assert!(screen.contains("Preview · Rendering..."));
    assert!(screen.contains("preview: rendering"));
}

#[test]
fn test_render_error_panel_shows_message() {
    let model = Model::new(SOURCE, None, (100, 30));
    let mut model = finish(model, Err(RenderError::syntax("Parse error on line 2")));
    let screen = draw(&mut model);
    assert!(screen.contains("Render Error"));
    assert!(screen.contains("Parse error on line 2"));
    assert!(screen.contains("preview: error"));
}

#[test]
fn test_rendered_without_images_shows_summary() {
    let mut model = Model::new(SOURCE, None, (100, 30));
    model.images_enabled = false;
    let mut model = finish(model, Ok(artifact()));
    let screen = draw(&mut model);
    assert!(screen.contains("Diagram rendered (120×60 px)"));
    assert!(screen.contains("Inline images are off"));
    assert!(screen.contains("preview: 120×60"));
}

#[test]
fn test_previous_diagram_stays_while_rerendering() {
    let mut model = Model::new(SOURCE, None, (100, 30));
    model.images_enabled = false;
    let mut model = finish(model, Ok(artifact()));
    model.preview.submit("pie\n    \"A\" : 1", model.theme).unwrap();
    let screen = draw(&mut model);
    assert!(screen.contains("Preview · Rendering..."));
    assert!(screen.contains("Diagram rendered (120×60 px)"));
}

#[test]
fn test_halfblock_preview_image_is_built_and_drawn() {
    let model = Model::new(SOURCE, None, (100, 30)).with_picker(Some(Picker::halfblocks()));
    let mut model = finish(model, Ok(artifact()));
    model.refresh_preview_image();
    assert!(model.preview_image.is_some());

    let screen = draw(&mut model);
    assert!(!screen.contains("Diagram rendered"));
    assert!(!screen.contains(PLACEHOLDER_TEXT));
}

#[test]
fn test_preview_image_is_dropped_after_error() {
    let model = Model::new(SOURCE, None, (100, 30)).with_picker(Some(Picker::halfblocks()));
    let mut model = finish(model, Ok(artifact()));
    model.refresh_preview_image();
    assert!(model.preview_image.is_some());

    let model = update(model, Message::InsertChar('%'));
    let model = finish(model, Err(RenderError::syntax("bad")));
    assert!(model.preview_image.is_none());
}

#[test]
fn test_template_picker_overlay() {
    let model = Model::new(SOURCE, None, (100, 30));
    let model = update(model, Message::OpenTemplates);
    let mut model = update(model, Message::TemplateDown);
    let screen = draw(&mut model);
    assert!(screen.contains(" Templates "));
    assert!(screen.contains("1 All"));
    assert!(screen.contains("5 Advanced"));
    assert!(screen.contains("▸ "));
    assert!(screen.contains("Sequence Diagram"));
    assert!(screen.contains("Esc close"));
}

#[test]
fn test_template_picker_preview_follows_selection() {
    let model = Model::new(SOURCE, None, (100, 30));
    let model = update(model, Message::OpenTemplates);
    let model = update(model, Message::TemplateCategory(1));
    let mut model = update(model, Message::TemplateDown);
    let screen = draw(&mut model);
    assert!(screen.contains("Pie Chart"));
    assert!(screen.contains("pie title"));
}

#[test]
fn test_help_overlay_lists_sections_and_paths() {
    let mut model = Model::new(SOURCE, None, (100, 40));
    model.config_global_path = Some(PathBuf::from("/cfg/mermaid-studio/config"));
    let mut model = update(model, Message::ToggleHelp);
    let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
    assert!(screen.contains(" Help "));
    assert!(screen.contains("Editing"));
    assert!(screen.contains("Preview & export"));
    assert!(screen.contains("/cfg/mermaid-studio/config"));
}

#[test]
fn test_status_bar_shows_position_and_theme() {
    let model = Model::new(SOURCE, None, (100, 30));
    let model = update(model, Message::MoveTo(1, 4));
    let mut model = update(model, Message::ToggleTheme);
    let screen = draw(&mut model);
    let status = screen.lines().last().unwrap();
    assert!(status.contains("untitled"));
    assert!(status.contains("Ln 2, Col 5"));
    assert!(status.contains(&format!("theme: {}", Theme::Dark)));
}

#[test]
fn test_dark_and_light_frames_differ() {
    let mut light = Model::new(SOURCE, None, (100, 30));
    let mut dark = update(Model::new(SOURCE, None, (100, 30)), Message::ToggleTheme);

    let mut t1 = create_test_terminal();
    t1.draw(|frame| render(&mut light, frame)).unwrap();
    let mut t2 = create_test_terminal();
    t2.draw(|frame| render(&mut dark, frame)).unwrap();

    let bg1 = t1.backend().buffer()[(50, 10)].bg;
    let bg2 = t2.backend().buffer()[(50, 10)].bg;
    assert_ne!(bg1, bg2);
}
