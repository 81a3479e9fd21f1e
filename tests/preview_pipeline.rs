//! The preview pipeline driven the way the event loop drives it: a
//! controller deciding what to render and a dispatcher rendering it on a
//! worker thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mermaid_studio::preview::{
    Completion, PreviewController, PreviewState, RenderDebouncer, RenderDispatcher,
};
use mermaid_studio::render::{
    Artifact, MermaidRenderer, RenderError, RenderOptions, RenderService,
};
use mermaid_studio::templates;
use mermaid_studio::theme::Theme;

/// Fails on a dangling arrow, panics on `crash`, otherwise echoes the
/// source and theme.
#[derive(Default)]
struct FakeRenderer {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl RenderService for FakeRenderer {
    fn render(&self, source: &str, options: &RenderOptions) -> Result<Artifact, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(source.to_string());
        if source.trim_end().ends_with("-->") {
            return Err(RenderError::syntax("Parse error: expected a node after -->"));
        }
        if source.contains("crash") {
            panic!("backend fell over");
        }
        Ok(Artifact {
            svg: format!("<svg data-theme=\"{}\">{source}</svg>", options.theme_name),
            width: 10,
            height: 10,
        })
    }
}

struct Pipeline {
    controller: PreviewController,
    dispatcher: RenderDispatcher,
    renderer: Arc<FakeRenderer>,
}

impl Pipeline {
    fn new() -> Self {
        let renderer = Arc::new(FakeRenderer::default());
        let dispatcher = RenderDispatcher::new(renderer.clone()).unwrap();
        Self {
            controller: PreviewController::new(),
            dispatcher,
            renderer,
        }
    }

    fn submit(&mut self, source: &str, theme: Theme) -> Option<u64> {
        let request = self.controller.submit(source, theme)?;
        let generation = request.generation;
        self.dispatcher.dispatch(request);
        Some(generation)
    }

    /// Apply completions until the current generation lands.
    fn settle(&mut self) {
        while self.controller.is_loading() {
            let completion = self
                .dispatcher
                .recv_timeout(Duration::from_secs(5))
                .expect("render completes");
            self.controller.complete(completion);
        }
    }
}

#[test]
fn test_edit_renders_and_shows_artifact() {
    let mut pipeline = Pipeline::new();
    pipeline.submit("graph TD\n    A --> B", Theme::Light).unwrap();
    assert!(pipeline.controller.is_loading());

    pipeline.settle();
    let artifact = pipeline.controller.artifact().unwrap();
    assert!(artifact.svg.contains("A --> B"));
    assert!(artifact.svg.contains("data-theme=\"default\""));
}

#[test]
fn test_rapid_edits_end_on_latest_source() {
    let mut pipeline = Pipeline::new();
    let mut source = String::from("graph TD\n");
    for node in ["A", "B", "C", "D", "E"] {
        source.push_str(&format!("    {node} --> Z\n"));
        pipeline.submit(&source, Theme::Light);
    }
    pipeline.settle();

    let artifact = pipeline.controller.artifact().unwrap();
    assert!(artifact.svg.contains("E --> Z"));
    assert!(pipeline.renderer.calls.load(Ordering::SeqCst) <= 5);
}

#[test]
fn test_stale_completion_is_discarded() {
    let mut pipeline = Pipeline::new();
    let first = pipeline.submit("graph TD\n    A --> B", Theme::Light).unwrap();
    let completion = pipeline
        .dispatcher
        .recv_timeout(Duration::from_secs(5))
        .unwrap();
    assert_eq!(completion.generation, first);

    pipeline.submit("graph TD\n    A --> C", Theme::Light).unwrap();
    assert_eq!(pipeline.controller.complete(completion), Completion::Discarded);

    pipeline.settle();
    assert!(pipeline.controller.artifact().unwrap().svg.contains("A --> C"));
}

#[test]
fn test_syntax_error_clears_previous_artifact() {
    let mut pipeline = Pipeline::new();
    pipeline.submit("graph TD\n    A --> B", Theme::Light);
    pipeline.settle();
    assert!(pipeline.controller.artifact().is_some());

    pipeline.submit("graph TD\nA --> ", Theme::Light);
    pipeline.settle();
    let message = pipeline.controller.error_message().unwrap();
    assert!(!message.is_empty());
    assert!(pipeline.controller.artifact().is_none());

    // Fixing the source recovers.
    pipeline.submit("graph TD\nA --> B", Theme::Light);
    pipeline.settle();
    assert!(pipeline.controller.error_message().is_none());
    assert!(pipeline.controller.artifact().is_some());
}

#[test]
fn test_theme_toggle_renders_exactly_once() {
    let mut pipeline = Pipeline::new();
    let source = "graph TD\n    A --> B";
    pipeline.submit(source, Theme::Light);
    pipeline.settle();

    assert!(pipeline.submit(source, Theme::Dark).is_some());
    assert!(pipeline.submit(source, Theme::Dark).is_none());
    pipeline.settle();

    assert_eq!(pipeline.renderer.calls.load(Ordering::SeqCst), 2);
    assert!(
        pipeline
            .controller
            .artifact()
            .unwrap()
            .svg
            .contains("data-theme=\"dark\"")
    );
}

#[test]
fn test_blank_source_shows_placeholder_without_rendering() {
    let mut pipeline = Pipeline::new();
    assert!(pipeline.submit("  \n\t\n", Theme::Light).is_none());
    assert_eq!(pipeline.controller.state(), &PreviewState::Placeholder);
    assert_eq!(pipeline.renderer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_template_source_is_rendered_verbatim() {
    let mut pipeline = Pipeline::new();
    let pie = templates::find("Pie Chart").unwrap();
    assert_eq!(
        pie.source,
        "pie title Pets adopted by volunteers\n\"Dogs\" : 386\n\"Cats\" : 85\n\"Rats\" : 15"
    );
    pipeline.submit(pie.source, Theme::Light);
    pipeline.settle();
    assert_eq!(
        pipeline.renderer.seen.lock().unwrap().last().map(String::as_str),
        Some(pie.source)
    );
}

#[test]
fn test_typing_burst_is_debounced_to_one_submission() {
    let mut debouncer = RenderDebouncer::new(RenderDebouncer::DEFAULT_DELAY_MS);
    let mut submissions = 0;
    for now_ms in (0..500).step_by(40) {
        debouncer.queue(now_ms);
        if debouncer.take_ready(now_ms) {
            submissions += 1;
        }
    }
    assert_eq!(submissions, 0);
    assert!(debouncer.take_ready(480 + RenderDebouncer::DEFAULT_DELAY_MS));
    submissions += 1;
    assert_eq!(submissions, 1);
    assert!(!debouncer.is_pending());
}

#[test]
fn test_backend_panic_shows_error_instead_of_spinning() {
    let mut pipeline = Pipeline::new();
    pipeline.submit("graph TD\n    crash --> B", Theme::Light);
    pipeline.settle();
    assert!(!pipeline.controller.is_loading());
    let message = pipeline.controller.error_message().unwrap();
    assert!(message.contains("backend fell over"));

    pipeline.submit("graph TD\n    A --> B", Theme::Light);
    pipeline.settle();
    assert!(pipeline.controller.artifact().is_some());
}

#[test]
fn test_real_renderer_reports_syntax_errors() {
    let mut controller = PreviewController::new();
    let dispatcher = RenderDispatcher::new(Arc::new(MermaidRenderer::new())).unwrap();
    let mut render = |source: &str| {
        let request = controller.submit(source, Theme::Light).unwrap();
        dispatcher.dispatch(request);
        let done = dispatcher.recv_timeout(Duration::from_secs(30)).unwrap();
        controller.complete(done);
        controller.state().clone()
    };

    match render("graph TD\nA --> ") {
        PreviewState::Errored { message } => assert!(message.contains("line 2")),
        other => panic!("dangling edge rendered: {other:?}"),
    }
    assert!(matches!(render("hello world"), PreviewState::Errored { .. }));
    assert!(matches!(
        render(templates::DEFAULT_SOURCE),
        PreviewState::Rendered(_)
    ));
}
