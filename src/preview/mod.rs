//! Live preview pipeline.
//!
//! [`PreviewController`] decides *when* to render and which results to keep;
//! [`RenderDispatcher`] runs the actual rendering on a worker thread. The
//! controller is a plain state machine so the event loop (and tests) can drive
//! it synchronously.
//!
//! Every submitted snapshot bumps a generation counter. A completion is only
//! applied when its generation matches the current one, so a slow render that
//! finishes after a newer one was requested is dropped on the floor.

mod debounce;
mod dispatcher;

pub use debounce::RenderDebouncer;
pub use dispatcher::RenderDispatcher;

use crate::render::{Artifact, RenderError, RenderOptions};
use crate::theme::Theme;

/// The inputs a rendering is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub source: String,
    pub theme: Theme,
}

/// Work handed to the render dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub generation: u64,
    pub source: String,
    pub options: RenderOptions,
}

/// Result of a render, tagged with the generation that requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCompletion {
    pub generation: u64,
    pub result: Result<Artifact, RenderError>,
}

/// What the preview pane is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PreviewState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Source is blank.
    Placeholder,
    /// A render is in flight; `previous` stays on screen until it lands.
    Loading {
        generation: u64,
        previous: Option<Artifact>,
    },
    Rendered(Artifact),
    Errored {
        message: String,
    },
}

/// Whether [`PreviewController::complete`] used a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Discarded,
}

#[derive(Debug, Default)]
pub struct PreviewController {
    generation: u64,
    last: Option<Snapshot>,
    state: PreviewState,
}

impl PreviewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> &PreviewState {
        &self.state
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self.state, PreviewState::Loading { .. })
    }

    /// Feed the current source and theme.
    ///
    /// Returns a request to dispatch when a new render is needed, or `None`
    /// when the snapshot is unchanged or the source is blank.
    pub fn submit(&mut self, source: &str, theme: Theme) -> Option<RenderRequest> {
        if self
            .last
            .as_ref()
            .is_some_and(|s| s.theme == theme && s.source == source)
        {
            return None;
        }
        self.last = Some(Snapshot {
            source: source.to_string(),
            theme,
        });
        self.generation += 1;

        if source.trim().is_empty() {
            tracing::debug!(generation = self.generation, "blank source, showing placeholder");
            self.state = PreviewState::Placeholder;
            return None;
        }

        let previous = match std::mem::take(&mut self.state) {
            PreviewState::Rendered(artifact) => Some(artifact),
            PreviewState::Loading { previous, .. } => previous,
            _ => None,
        };
        self.state = PreviewState::Loading {
            generation: self.generation,
            previous,
        };
        tracing::debug!(generation = self.generation, theme = %theme, "render requested");
        Some(RenderRequest {
            generation: self.generation,
            source: source.to_string(),
            options: theme.render_options(),
        })
    }

    /// Apply a finished render if it belongs to the current generation.
    pub fn complete(&mut self, completion: RenderCompletion) -> Completion {
        if completion.generation != self.generation || !self.is_loading() {
            tracing::debug!(
                stale = completion.generation,
                current = self.generation,
                "discarding superseded render"
            );
            return Completion::Discarded;
        }
        self.state = match completion.result {
            Ok(artifact) => PreviewState::Rendered(artifact),
            Err(err) => {
                let message = match err {
                    RenderError::Syntax(message) => message,
                    other => other.to_string(),
                };
                PreviewState::Errored { message }
            }
        };
        Completion::Applied
    }

    /// The artifact currently displayed, if any.
    pub const fn artifact(&self) -> Option<&Artifact> {
        match &self.state {
            PreviewState::Rendered(artifact) => Some(artifact),
            PreviewState::Loading { previous, .. } => previous.as_ref(),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            PreviewState::Errored { message } => Some(message),
            _ => None,
        }
    }

    /// Forget the last snapshot so the next submit renders unconditionally.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(tag: &str) -> Artifact {
        Artifact {
            svg: format!("<svg>{tag}</svg>"),
            width: 10,
            height: 10,
        }
    }

    fn ok(generation: u64, tag: &str) -> RenderCompletion {
        RenderCompletion {
            generation,
            result: Ok(artifact(tag)),
        }
    }

    #[test]
    fn test_submit_issues_request_and_enters_loading() {
        let mut pc = PreviewController::new();
        let req = pc.submit("graph TD\nA-->B", Theme::Light).unwrap();
        assert_eq!(req.generation, 1);
        assert_eq!(req.source, "graph TD\nA-->B");
        assert_eq!(req.options.theme_name, "default");
        assert!(pc.is_loading());
        assert!(pc.artifact().is_none());
    }

    #[test]
    fn test_identical_snapshot_is_not_resubmitted() {
        let mut pc = PreviewController::new();
        assert!(pc.submit("graph TD", Theme::Light).is_some());
        assert!(pc.submit("graph TD", Theme::Light).is_none());
        assert_eq!(pc.generation(), 1);
    }

    #[test]
    fn test_blank_source_shows_placeholder_without_request() {
        let mut pc = PreviewController::new();
        assert!(pc.submit("  \n\t ", Theme::Dark).is_none());
        assert_eq!(pc.state(), &PreviewState::Placeholder);
    }

    #[test]
    fn test_blank_source_voids_in_flight_render() {
        let mut pc = PreviewController::new();
        let req = pc.submit("graph TD", Theme::Light).unwrap();
        pc.submit("", Theme::Light);
        assert_eq!(pc.complete(ok(req.generation, "a")), Completion::Discarded);
        assert_eq!(pc.state(), &PreviewState::Placeholder);
    }

    #[test]
    fn test_success_replaces_error() {
        let mut pc = PreviewController::new();
        let r1 = pc.submit("bad", Theme::Light).unwrap();
        pc.complete(RenderCompletion {
            generation: r1.generation,
            result: Err(RenderError::syntax("Parse error")),
        });
        assert_eq!(pc.error_message(), Some("Parse error"));

        let r2 = pc.submit("graph TD", Theme::Light).unwrap();
        assert_eq!(pc.complete(ok(r2.generation, "good")), Completion::Applied);
        assert_eq!(pc.error_message(), None);
        assert_eq!(pc.artifact(), Some(&artifact("good")));
    }

    #[test]
    fn test_error_releases_previous_artifact() {
        let mut pc = PreviewController::new();
        let r1 = pc.submit("graph TD", Theme::Light).unwrap();
        pc.complete(ok(r1.generation, "first"));
        let r2 = pc.submit("graph TD\nA --> ", Theme::Light).unwrap();
        pc.complete(RenderCompletion {
            generation: r2.generation,
            result: Err(RenderError::syntax("")),
        });
        assert!(pc.artifact().is_none());
        assert_eq!(pc.error_message(), Some("Invalid Mermaid syntax"));
    }

    #[test]
    fn test_loading_keeps_previous_artifact_visible() {
        let mut pc = PreviewController::new();
        let r1 = pc.submit("graph TD", Theme::Light).unwrap();
        pc.complete(ok(r1.generation, "first"));
        pc.submit("graph LR", Theme::Light);
        pc.submit("graph RL", Theme::Light);
        assert!(pc.is_loading());
        assert_eq!(pc.artifact(), Some(&artifact("first")));
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut pc = PreviewController::new();
        let slow = pc.submit("graph TD", Theme::Light).unwrap();
        let fast = pc.submit("graph LR", Theme::Light).unwrap();

        assert_eq!(pc.complete(ok(fast.generation, "new")), Completion::Applied);
        assert_eq!(pc.complete(ok(slow.generation, "old")), Completion::Discarded);
        assert_eq!(pc.artifact(), Some(&artifact("new")));
    }

    #[test]
    fn test_theme_change_triggers_one_request() {
        let mut pc = PreviewController::new();
        let r1 = pc.submit("graph TD", Theme::Light).unwrap();
        pc.complete(ok(r1.generation, "light"));

        let r2 = pc.submit("graph TD", Theme::Dark).unwrap();
        assert_eq!(r2.options.theme_name, "dark");
        assert!(r2.options.style_variables.dark_mode);
        assert!(pc.submit("graph TD", Theme::Dark).is_none());
    }

    #[test]
    fn test_invalidate_forces_resubmit() {
        let mut pc = PreviewController::new();
        pc.submit("graph TD", Theme::Light);
        pc.invalidate();
        let req = pc.submit("graph TD", Theme::Light).unwrap();
        assert_eq!(req.generation, 2);
    }

    #[test]
    fn test_duplicate_completion_is_discarded() {
        let mut pc = PreviewController::new();
        let req = pc.submit("graph TD", Theme::Light).unwrap();
        assert_eq!(pc.complete(ok(req.generation, "a")), Completion::Applied);
        assert_eq!(pc.complete(ok(req.generation, "b")), Completion::Discarded);
        assert_eq!(pc.artifact(), Some(&artifact("a")));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Whatever order completions land in, only the newest one shows.
            #[test]
            fn last_submission_wins(order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()) {
                let mut pc = PreviewController::new();
                let requests: Vec<_> = (0..6)
                    .map(|i| pc.submit(&format!("graph TD\nA{i}"), Theme::Light).unwrap())
                    .collect();
                for idx in order {
                    let req = &requests[idx];
                    pc.complete(ok(req.generation, &req.source));
                }
                prop_assert_eq!(pc.artifact(), Some(&artifact(&requests[5].source)));
            }
        }
    }
}
