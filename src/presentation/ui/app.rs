//! Main application orchestrator.

use crossterm::event::{Event, EventStream, KeyEvent};
use futures_util::StreamExt;
use ratatui::{DefaultTerminal, Frame};
use ratatui_image::picker::Picker;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::entities::AvatarStatus;
use crate::domain::errors::AvatarResult;
use crate::infrastructure::avatar::{AvatarLoader, LoaderEvent};
use crate::presentation::events::{EventResult, KeyAction, key_action};
use crate::presentation::ui::{AvatarScreen, AvatarScreenState};
use crate::presentation::widgets::AvatarView;

#[derive(Debug)]
struct LoadOutcome {
    url: String,
    result: AvatarResult,
}

/// Avatar screen application: cycles through URLs and shows each avatar.
pub struct App {
    loader: AvatarLoader<AvatarView>,
    picker: Picker,
    urls: Vec<String>,
    cursor: Option<usize>,
    screen: AvatarScreenState,
    outcome_tx: mpsc::UnboundedSender<LoadOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    exiting: bool,
}

impl App {
    /// Creates the application around a ready loader.
    #[must_use]
    pub fn new(loader: AvatarLoader<AvatarView>, urls: Vec<String>, picker: Picker) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let mut screen = AvatarScreenState::new();
        screen.cache_summary = loader.cache_stats().to_string();

        Self {
            loader,
            picker,
            urls,
            cursor: None,
            screen,
            outcome_tx,
            outcome_rx,
            exiting: false,
        }
    }

    /// # Errors
    /// Returns error if drawing to the terminal fails.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        let mut terminal_events = EventStream::new();

        terminal.draw(|frame| self.render(frame))?;

        while !self.exiting {
            tokio::select! {
                biased;

                Some(event) = self.loader.recv_event() => {
                    self.handle_loader_event(event);
                }

                Some(outcome) = self.outcome_rx.recv() => {
                    self.handle_outcome(outcome);
                }

                Some(Ok(event)) = terminal_events.next() => {
                    if self.handle_terminal_event(&event) == EventResult::Exit {
                        self.exiting = true;
                    }
                }
            }

            terminal.draw(|frame| self.render(frame))?;
        }

        info!("Application exiting normally");
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        self.screen.sync_view(self.loader.view(), &self.picker);
        frame.render_stateful_widget(AvatarScreen::new(), frame.area(), &mut self.screen);
    }

    fn handle_terminal_event(&mut self, event: &Event) -> EventResult {
        match event {
            Event::Key(key) => self.handle_key(key),
            _ => EventResult::Continue,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> EventResult {
        match key_action(key) {
            Some(KeyAction::Quit) => EventResult::Exit,
            Some(KeyAction::Next) => {
                if let Some(index) = self.step(1) {
                    self.load(index);
                }
                EventResult::Consumed
            }
            Some(KeyAction::Previous) => {
                if let Some(index) = self.step(-1) {
                    self.load(index);
                }
                EventResult::Consumed
            }
            Some(KeyAction::ClearCache) => {
                self.loader.clear_cache();
                self.screen.cache_summary = self.loader.cache_stats().to_string();
                EventResult::Consumed
            }
            None => EventResult::Continue,
        }
    }

    /// Index `delta` steps away from the cursor, wrapping around.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn step(&self, delta: isize) -> Option<usize> {
        let len = self.urls.len();
        if len == 0 {
            return None;
        }
        let next = match self.cursor {
            Some(cursor) => (cursor as isize + delta).rem_euclid(len as isize) as usize,
            None if delta < 0 => len - 1,
            None => 0,
        };
        Some(next)
    }

    fn load(&mut self, index: usize) {
        if self.loader.is_downloading() {
            debug!("Avatar still downloading, ignoring navigation");
            return;
        }

        let url = self.urls[index].clone();
        info!(url = %url, index, "Loading avatar");

        self.cursor = Some(index);
        self.screen.position = Some((index + 1, self.urls.len()));
        self.screen.current_url = Some(url.clone());
        self.screen.status = AvatarStatus::Downloading { progress: 0.0 };

        let outcome_tx = self.outcome_tx.clone();
        let reported_url = url.clone();
        self.loader.download(&url, move |result| {
            let _ = outcome_tx.send(LoadOutcome {
                url: reported_url,
                result,
            });
        });
    }

    fn handle_loader_event(&mut self, event: LoaderEvent) {
        if let LoaderEvent::Progress(progress) = &event {
            if self.loader.is_downloading() {
                self.screen.status = AvatarStatus::Downloading {
                    progress: *progress,
                };
            }
        }
        self.loader.handle_event(event);
    }

    fn handle_outcome(&mut self, outcome: LoadOutcome) {
        debug!(url = %outcome.url, ok = outcome.result.is_ok(), "Avatar request finished");
        if self.screen.current_url.as_deref() == Some(outcome.url.as_str()) {
            self.screen.status = match outcome.result {
                Ok(_) => AvatarStatus::Ready,
                Err(e) => AvatarStatus::Failed(e.to_string()),
            };
        }
        self.screen.cache_summary = self.loader.cache_stats().to_string();
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("loader", &self.loader)
            .field("urls", &self.urls.len())
            .field("cursor", &self.cursor)
            .field("screen", &self.screen)
            .finish_non_exhaustive()
    }
}
