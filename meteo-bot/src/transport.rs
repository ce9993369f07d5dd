//! Chat transport contract consumed by the dialog controller.
//!
//! [`ChatTransport`] is transport-agnostic; [`crate::telegram::TelegramTransport`]
//! implements it via teloxide and tests substitute a recording fake.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// An inbound chat message, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: u64,
    pub chat_id: i64,
    pub text: String,
}

/// What to do with the reply keyboard when sending a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardAction {
    Show,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReply {
    pub text: String,
    pub markdown: bool,
    pub keyboard: Option<KeyboardAction>,
}

impl TextReply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), markdown: false, keyboard: None }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self { text: text.into(), markdown: true, keyboard: None }
    }

    pub fn with_keyboard(mut self, action: KeyboardAction) -> Self {
        self.keyboard = Some(action);
        self
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat_id: i64, reply: TextReply) -> Result<()>;

    /// Sends the image at `path`. The file must exist until this returns.
    async fn send_photo(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()>;
}
