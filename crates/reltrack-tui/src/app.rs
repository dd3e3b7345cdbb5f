// TUI application state and key handling
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use reltrack_core::{Effect, Message, Repository, ToastQueue, TrackerState};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,  // Navigating the repository list
    Editing, // Typing in the add box
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Dispatch(Message),
    OpenInBrowser(String),
    Quit,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub tracker: TrackerState,
    /// Index into the newest-first list
    pub cursor: usize,
    pub list_state: ListState,
    pub toasts: ToastQueue,
    // Local problems (browser failed to open, etc.) shown in the status bar
    pub error_message: Option<String>,
}

impl App {
    pub fn new(toasts: ToastQueue) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            tracker: TrackerState::default(),
            cursor: 0,
            list_state,
            toasts,
            error_message: None,
        }
    }

    /// Feed a message through the reducer. Notices become toasts right
    /// away; every other effect is handed back for the caller to run.
    pub fn apply(&mut self, message: Message, now: Instant) -> Vec<Effect> {
        let (next, effects) = std::mem::take(&mut self.tracker).update(message);
        self.tracker = next;
        self.clamp_cursor();

        effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Notify(notice) => {
                    self.toasts.push(notice, now);
                    None
                }
                other => Some(other),
            })
            .collect()
    }

    pub fn repository_count(&self) -> usize {
        self.tracker.repositories.data.len()
    }

    pub fn repository_under_cursor(&self) -> Option<&Repository> {
        self.tracker.repositories_newest_first().nth(self.cursor)
    }

    pub fn next_repository(&mut self) {
        if self.repository_count() > 0 {
            self.cursor = (self.cursor + 1).min(self.repository_count() - 1);
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn previous_repository(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    fn clamp_cursor(&mut self) {
        let count = self.repository_count();
        if count == 0 {
            self.cursor = 0;
        } else if self.cursor >= count {
            self.cursor = count - 1;
        }
        self.list_state.select(Some(self.cursor));
    }

    pub fn enter_editing_mode(&mut self) {
        self.input_mode = InputMode::Editing;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        match self.input_mode {
            InputMode::Editing => match key.code {
                KeyCode::Enter => Some(Action::Dispatch(Message::AddRequested)),
                KeyCode::Esc => {
                    self.enter_normal_mode();
                    None
                }
                KeyCode::Char(c) => {
                    let mut term = self.tracker.search_term.clone();
                    term.push(c);
                    Some(Action::Dispatch(Message::SearchChanged(term)))
                }
                KeyCode::Backspace => {
                    let mut term = self.tracker.search_term.clone();
                    term.pop()?;
                    Some(Action::Dispatch(Message::SearchChanged(term)))
                }
                _ => None,
            },
            InputMode::Normal => {
                self.clear_error();
                match key.code {
                    KeyCode::Char('q') => Some(Action::Quit),
                    KeyCode::Char('/') | KeyCode::Char('a') => {
                        self.enter_editing_mode();
                        None
                    }
                    KeyCode::Char('j') | KeyCode::Down => {
                        self.next_repository();
                        None
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.previous_repository();
                        None
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        Some(Action::Dispatch(Message::RefreshRequested))
                    }
                    KeyCode::Enter => self
                        .repository_under_cursor()
                        .map(|repo| Action::Dispatch(Message::SelectRequested(repo.name.clone()))),
                    KeyCode::Char('s') => {
                        // Disabled control: nothing to do for an already-seen release
                        let repo = self.repository_under_cursor()?;
                        if repo.mark_seen_disabled() {
                            return None;
                        }
                        Some(Action::Dispatch(Message::MarkSeenRequested(repo.id.clone())))
                    }
                    KeyCode::Char('o') => self
                        .repository_under_cursor()
                        .map(|repo| Action::OpenInBrowser(repo.html_url())),
                    _ => None,
                }
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(ToastQueue::default())
    }
}
