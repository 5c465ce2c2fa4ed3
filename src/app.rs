use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::engine::{EngineConfig, InputOutcome, TypingEngine};
use crate::error::EngineError;
use crate::runtime::AppEvent;
use crate::store::SessionStore;
use crate::texts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

/// Where the next passage comes from when the user asks for a new one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    Fixed(String),
    Random,
}

impl TextSource {
    pub fn next_text(&self) -> String {
        match self {
            TextSource::Fixed(text) => text.clone(),
            TextSource::Random => texts::random_passage().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Disabled,
    Pending,
    Saved(i64),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// The input box plus the engine behind it.
///
/// All timestamps come from the caller so the flow can be driven headless.
pub struct App {
    pub engine: TypingEngine,
    pub input: String,
    pub state: AppState,
    pub save_status: SaveStatus,
    source: TextSource,
    store: Option<Box<dyn SessionStore>>,
}

impl App {
    pub fn new(
        source: TextSource,
        config: EngineConfig,
        store: Option<Box<dyn SessionStore>>,
    ) -> Result<Self, EngineError> {
        let engine = TypingEngine::new(&source.next_text(), config)?;
        let save_status = if store.is_some() {
            SaveStatus::Pending
        } else {
            SaveStatus::Disabled
        };

        Ok(Self {
            engine,
            input: String::new(),
            state: AppState::Typing,
            save_status,
            source,
            store,
        })
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Action {
        match event {
            AppEvent::Key { key, at_ms } => self.handle_key(key, at_ms),
            AppEvent::Tick { at_ms } => {
                self.on_tick(at_ms);
                Action::Continue
            }
            AppEvent::Resize => Action::Continue,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now_ms: f64) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match (key.code, self.state) {
            (KeyCode::Esc, _) => return Action::Quit,
            (KeyCode::Char('c'), _) if ctrl => return Action::Quit,
            (KeyCode::Left, _) => self.restart(),
            (KeyCode::Right, _) => self.next_text(),
            (KeyCode::Tab, AppState::Typing) => self.toggle_pause(now_ms),
            (KeyCode::Backspace, AppState::Typing) => self.backspace(now_ms),
            (KeyCode::Char('w'), AppState::Typing) if ctrl => self.delete_word(now_ms),
            (KeyCode::Char(c), AppState::Typing) if !ctrl => self.type_char(c, now_ms),
            (KeyCode::Char('q'), AppState::Results) => return Action::Quit,
            (KeyCode::Char('r'), AppState::Results) => self.restart(),
            (KeyCode::Char('n'), AppState::Results) => self.next_text(),
            _ => {}
        }
        Action::Continue
    }

    pub fn on_tick(&mut self, now_ms: f64) {
        if self.state == AppState::Typing && !self.engine.is_paused() {
            self.engine.sample(now_ms);
        }
    }

    pub fn type_char(&mut self, c: char, now_ms: f64) {
        // paused sessions ignore typing until resumed
        if self.engine.is_paused() {
            return;
        }
        let mut candidate = self.input.clone();
        candidate.push(c);
        self.submit(candidate, now_ms);
    }

    pub fn backspace(&mut self, now_ms: f64) {
        if self.engine.is_paused() || self.input.is_empty() {
            return;
        }
        let mut candidate = self.input.clone();
        candidate.pop();
        self.submit(candidate, now_ms);
    }

    /// Drop the trailing word and any whitespace after it
    pub fn delete_word(&mut self, now_ms: f64) {
        if self.engine.is_paused() || self.input.is_empty() {
            return;
        }
        let trimmed = self.input.trim_end();
        let keep = trimmed
            .rfind(char::is_whitespace)
            .map(|i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        let candidate = self.input[..keep].to_string();
        self.submit(candidate, now_ms);
    }

    pub fn toggle_pause(&mut self, now_ms: f64) {
        if let Err(e) = self.engine.toggle_pause(now_ms) {
            warn!(error = %e, "pause toggle ignored");
        }
    }

    fn submit(&mut self, candidate: String, now_ms: f64) {
        match self.engine.process_input(&candidate, now_ms) {
            Ok(result) => {
                if result.outcome == InputOutcome::Accepted {
                    self.input = candidate;
                }
                if result.is_complete && self.state == AppState::Typing {
                    self.state = AppState::Results;
                    self.persist();
                }
            }
            Err(e) => warn!(error = %e, "input ignored"),
        }
    }

    /// Hand the finished session to the store; failures only change the status line
    fn persist(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        let Some(summary) = self.engine.finalize() else {
            return;
        };

        self.save_status = match store.save(summary, self.engine.char_stats()) {
            Ok(id) => SaveStatus::Saved(id),
            Err(e) => {
                warn!(error = %e, "failed to store session");
                SaveStatus::Failed(e.to_string())
            }
        };
    }

    pub fn restart(&mut self) {
        if let Err(e) = self.engine.reset(None) {
            warn!(error = %e, "restart failed");
            return;
        }
        self.clear_input();
    }

    pub fn next_text(&mut self) {
        let text = self.source.next_text();
        if let Err(e) = self.engine.reset(Some(&text)) {
            warn!(error = %e, "new text rejected");
            return;
        }
        self.clear_input();
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.state = AppState::Typing;
        if self.save_status != SaveStatus::Disabled {
            self.save_status = SaveStatus::Pending;
        }
    }
}
