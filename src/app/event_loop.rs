use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::editor::TextSource;
use crate::export::Exporter;
use crate::preview::{RenderDebouncer, RenderDispatcher};
use crate::render::MermaidRenderer;
use crate::watcher::FileWatcher;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Timers and handles owned by the running loop.
struct LoopState {
    start: Instant,
    resize: ResizeDebouncer,
    render: RenderDebouncer,
    watcher: Option<FileWatcher>,
}

impl LoopState {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl App {
    /// Run the editor until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized, the render
    /// worker cannot be started, or terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        // Create image picker BEFORE initializing terminal (queries stdio)
        let picker = if self.images_enabled {
            crate::ui::create_picker(self.force_half_cell)
        } else {
            None
        };

        let dispatcher = RenderDispatcher::new(Arc::new(MermaidRenderer::new()))
            .context("Failed to start the render worker")?;

        let mut terminal = ratatui::try_init().context(
            "Failed to initialize terminal; mermaid-studio requires an interactive terminal",
        )?;
        let size = terminal.size()?;
        let mut model = self
            .initial_model((size.width, size.height))
            .with_picker(picker);

        let result = self.event_loop(&mut terminal, &mut model, &dispatcher);

        // Restore terminal
        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        result
    }

    /// Build the starting model from the configured options.
    pub(super) fn initial_model(&self, terminal_size: (u16, u16)) -> Model {
        let mut model = Model::new(&self.source, self.file_path.clone(), terminal_size);
        model.theme = self.theme;
        model.watch_enabled = self.watch_enabled && self.file_path.is_some();
        model.images_enabled = self.images_enabled;
        model.exporter = Exporter::new(self.out_dir.clone());
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        model.preferences_path = self
            .preferences
            .as_ref()
            .map(|store| store.path().to_path_buf());
        model
    }

    fn event_loop(
        &self,
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        dispatcher: &RenderDispatcher,
    ) -> Result<()> {
        execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)?;

        let watcher = match (&model.file_path, model.watch_enabled) {
            (Some(path), true) => match Self::make_file_watcher(path) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "file watcher unavailable");
                    model.watch_enabled = false;
                    model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                    None
                }
            },
            _ => None,
        };
        let mut state = LoopState {
            start: Instant::now(),
            resize: ResizeDebouncer::new(100),
            render: RenderDebouncer::new(self.render_delay_ms),
            watcher,
        };

        Self::submit_render(model, dispatcher);
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = state.now_ms();

            if let Some((width, height)) = state.resize.take_ready(now_ms) {
                tracing::debug!(width, height, "resize applied");
                *model = update(std::mem::take(model), Message::Resize(width, height));
                needs_render = true;
            }

            if model.watch_enabled
                && state
                    .watcher
                    .as_mut()
                    .is_some_and(FileWatcher::take_change_ready)
            {
                self.process(model, Message::FileChanged, &mut state, dispatcher);
                needs_render = true;
            }

            for completion in dispatcher.try_completions() {
                *model = update(std::mem::take(model), Message::RenderFinished(completion));
                needs_render = true;
            }

            if state.render.take_ready(now_ms) {
                Self::submit_render(model, dispatcher);
                needs_render = true;
            }

            model.set_resize_pending(state.resize.is_pending());

            // Handle events
            let poll_ms = if needs_render {
                0
            } else if state.resize.is_pending() || model.preview.is_loading() {
                10
            } else if let Some(wait) = state.render.remaining_ms(now_ms) {
                wait.clamp(1, 50)
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Refresh timestamp after poll wait so debouncers use accurate times.
                let event_ms = state.now_ms();
                let msg = Self::handle_event(&event::read()?, model, event_ms, &mut state.resize);
                if let Some(msg) = msg {
                    tracing::trace!(?msg, "message");
                    self.process(model, msg, &mut state, dispatcher);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                let mut drained = 0_u32;
                while event::poll(Duration::from_millis(0))? {
                    let drain_ms = state.now_ms();
                    let msg =
                        Self::handle_event(&event::read()?, model, drain_ms, &mut state.resize);
                    if let Some(msg) = msg {
                        drained += 1;
                        self.process(model, msg, &mut state, dispatcher);
                        needs_render = true;
                    }
                }
                if drained > 0 {
                    tracing::trace!(drained, "event burst coalesced");
                }
            }

            if needs_render {
                model.refresh_preview_image();
                terminal.draw(|frame| Self::view(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Apply a message and schedule the preview work it implies.
    fn process(
        &self,
        model: &mut Model,
        msg: Message,
        state: &mut LoopState,
        dispatcher: &RenderDispatcher,
    ) {
        let revision = model.editor.revision();
        let immediate = msg.renders_immediately();
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, &side_msg);

        if immediate {
            state.render.cancel();
            Self::submit_render(model, dispatcher);
        } else if model.editor.revision() != revision {
            let now_ms = state.now_ms();
            state.render.queue(now_ms);
        }
    }

    fn submit_render(model: &mut Model, dispatcher: &RenderDispatcher) {
        let source = model.editor.text();
        if let Some(request) = model.preview.submit(&source, model.theme) {
            tracing::debug!(generation = request.generation, "render submitted");
            dispatcher.dispatch(request);
        }
    }
}
