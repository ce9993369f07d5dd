//! Per-user sessions and the two-state dialog.

use std::{collections::HashMap, sync::Arc};

use meteo_core::DayWindow;
use tokio::sync::RwLock;

/// Whether we are collecting a city name from the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingCity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Info,
    Forecast,
    Chart(DayWindow),
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Chart(DayWindow),
    SetCity,
    Info,
    Forecast,
    Close,
}

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command { command: Command, arg: Option<String> },
    UnknownCommand(String),
    Button(Button),
    Text(String),
}

/// What the controller must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Greet,
    Help,
    Info(Option<String>),
    Forecast(Option<String>),
    Chart(DayWindow, Option<String>),
    CloseKeyboard,
    PromptCity,
    RepromptCity,
    SaveCity(String),
    Cancelled,
    NothingToCancel,
    UnknownCommand,
    Ignore,
}

impl DialogState {
    /// The transition table: next state and the action to run.
    pub fn transition(self, input: Input) -> (DialogState, Action) {
        use DialogState::{AwaitingCity, Idle};

        match (self, input) {
            (_, Input::Button(Button::SetCity)) => (AwaitingCity, Action::PromptCity),

            (AwaitingCity, Input::Text(text)) => {
                let city = text.trim();
                if city.is_empty() {
                    (AwaitingCity, Action::RepromptCity)
                } else {
                    (Idle, Action::SaveCity(city.to_string()))
                }
            }
            (AwaitingCity, Input::Command { command: Command::Cancel, .. }) => {
                (Idle, Action::Cancelled)
            }

            (Idle, Input::Command { command: Command::Cancel, .. }) => {
                (Idle, Action::NothingToCancel)
            }
            (Idle, Input::Text(_)) => (Idle, Action::Ignore),

            (state, Input::UnknownCommand(_)) => (state, Action::UnknownCommand),
            (state, Input::Command { command, arg }) => (state, command_action(command, arg)),
            (state, Input::Button(button)) => (state, button_action(button)),
        }
    }
}

fn command_action(command: Command, arg: Option<String>) -> Action {
    match command {
        Command::Start => Action::Greet,
        Command::Help => Action::Help,
        Command::Info => Action::Info(arg),
        Command::Forecast => Action::Forecast(arg),
        Command::Chart(window) => Action::Chart(window, arg),
        // handled by the table above
        Command::Cancel => Action::NothingToCancel,
    }
}

fn button_action(button: Button) -> Action {
    match button {
        Button::Chart(window) => Action::Chart(window, None),
        Button::Info => Action::Info(None),
        Button::Forecast => Action::Forecast(None),
        Button::Close => Action::CloseKeyboard,
        Button::SetCity => Action::PromptCity,
    }
}

/// Per-user state. `city` is never blank once set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub city: Option<String>,
    pub state: DialogState,
}

/// In-memory sessions keyed by user id. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<u64, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the user's session; a fresh one if the user is new.
    pub async fn get(&self, user_id: u64) -> Session {
        self.inner.read().await.get(&user_id).cloned().unwrap_or_default()
    }

    pub async fn city(&self, user_id: u64) -> Option<String> {
        self.inner.read().await.get(&user_id).and_then(|s| s.city.clone())
    }

    pub async fn set_state(&self, user_id: u64, state: DialogState) {
        self.inner.write().await.entry(user_id).or_default().state = state;
    }

    /// Stores a trimmed city; blank input is ignored.
    pub async fn set_city(&self, user_id: u64, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            return;
        }
        self.inner.write().await.entry(user_id).or_default().city = Some(city.to_string());
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    fn cancel() -> Input {
        Input::Command { command: Command::Cancel, arg: None }
    }

    #[test]
    fn set_city_button_starts_awaiting_from_any_state() {
        for state in [DialogState::Idle, DialogState::AwaitingCity] {
            let (next, action) = state.transition(Input::Button(Button::SetCity));
            assert_eq!(next, DialogState::AwaitingCity);
            assert_eq!(action, Action::PromptCity);
        }
    }

    #[test]
    fn text_while_awaiting_saves_trimmed_city() {
        let (next, action) = DialogState::AwaitingCity.transition(text("  Milano "));
        assert_eq!(next, DialogState::Idle);
        assert_eq!(action, Action::SaveCity("Milano".into()));
    }

    #[test]
    fn blank_text_while_awaiting_reprompts() {
        let (next, action) = DialogState::AwaitingCity.transition(text("   "));
        assert_eq!(next, DialogState::AwaitingCity);
        assert_eq!(action, Action::RepromptCity);
    }

    #[test]
    fn cancel_depends_on_state() {
        assert_eq!(
            DialogState::AwaitingCity.transition(cancel()),
            (DialogState::Idle, Action::Cancelled)
        );
        assert_eq!(
            DialogState::Idle.transition(cancel()),
            (DialogState::Idle, Action::NothingToCancel)
        );
    }

    #[test]
    fn free_text_when_idle_is_ignored() {
        let (next, action) = DialogState::Idle.transition(text("ciao"));
        assert_eq!((next, action), (DialogState::Idle, Action::Ignore));
    }

    #[test]
    fn handlers_keep_the_current_state() {
        let info = Input::Command { command: Command::Info, arg: Some("Roma".into()) };
        assert_eq!(
            DialogState::AwaitingCity.transition(info),
            (DialogState::AwaitingCity, Action::Info(Some("Roma".into())))
        );
        assert_eq!(
            DialogState::Idle.transition(Input::Button(Button::Chart(DayWindow::Tomorrow))),
            (DialogState::Idle, Action::Chart(DayWindow::Tomorrow, None))
        );
        assert_eq!(
            DialogState::Idle.transition(Input::UnknownCommand("/meteo".into())),
            (DialogState::Idle, Action::UnknownCommand)
        );
    }

    #[tokio::test]
    async fn store_creates_sessions_lazily() {
        let store = SessionStore::new();
        assert_eq!(store.get(7).await, Session::default());
        assert_eq!(store.user_count().await, 0);

        store.set_state(7, DialogState::AwaitingCity).await;
        assert_eq!(store.user_count().await, 1);
        assert_eq!(store.get(7).await.state, DialogState::AwaitingCity);
        assert_eq!(store.city(7).await, None);
    }

    #[tokio::test]
    async fn blank_city_is_never_stored() {
        let store = SessionStore::new();
        store.set_city(1, "Roma").await;
        store.set_city(1, "  ").await;

        assert_eq!(store.city(1).await.as_deref(), Some("Roma"));
    }

    #[tokio::test]
    async fn sessions_are_per_user() {
        let store = SessionStore::new();
        let shared = store.clone();
        store.set_city(1, "Roma").await;
        shared.set_city(2, "Milano").await;

        assert_eq!(store.city(1).await.as_deref(), Some("Roma"));
        assert_eq!(store.city(2).await.as_deref(), Some("Milano"));
    }
}
