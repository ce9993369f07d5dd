//! Telegram side of the bot: a [`ChatTransport`] over teloxide and the
//! long-polling runner feeding the dialog controller.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{
        BotCommand, InputFile, KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode,
        ReplyMarkup,
    },
};
use tracing::{error, info, warn};

use crate::{
    dialog::DialogController,
    error::{BotError, Result},
    messages::KEYBOARD,
    transport::{ChatTransport, Inbound, KeyboardAction, TextReply},
};

/// Thin wrapper around `teloxide::Bot` implementing [`ChatTransport`].
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

pub fn main_keyboard() -> KeyboardMarkup {
    let rows = KEYBOARD
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(*label)).collect::<Vec<_>>());
    KeyboardMarkup::new(rows).resize_keyboard()
}

fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Mostra la tastiera"),
        BotCommand::new("temp", "Meteo attuale: /temp [città]"),
        BotCommand::new("forcast", "Previsioni di oggi: /forcast [città]"),
        BotCommand::new("grafico", "Grafico temperature di oggi: /grafico [città]"),
        BotCommand::new("domani", "Grafico temperature di domani: /domani [città]"),
        BotCommand::new("annulla", "Annulla l'impostazione della città"),
        BotCommand::new("help", "Elenco dei comandi"),
    ]
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, reply: TextReply) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), reply.text);
        if reply.markdown {
            #[allow(deprecated)]
            {
                request = request.parse_mode(ParseMode::Markdown);
            }
        }
        request = match reply.keyboard {
            Some(KeyboardAction::Show) => {
                request.reply_markup(ReplyMarkup::Keyboard(main_keyboard()))
            }
            Some(KeyboardAction::Remove) => {
                request.reply_markup(ReplyMarkup::KeyboardRemove(KeyboardRemove::new()))
            }
            None => request,
        };

        request.await.map_err(|e| BotError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()> {
        self.bot
            .send_photo(ChatId(chat_id), InputFile::file(path))
            .caption(caption)
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Converts a teloxide message; `None` for messages without text or sender.
fn to_inbound(msg: &Message) -> Option<Inbound> {
    let user_id = msg.from.as_ref()?.id.0;
    let text = msg.text()?;
    Some(Inbound { user_id, chat_id: msg.chat.id.0, text: text.to_string() })
}

/// Registers the command menu and runs the long-polling REPL until Ctrl-C.
pub async fn run(bot: Bot, controller: Arc<DialogController>) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => info!(username = ?me.user.username, "Connected to Telegram"),
        Err(e) => return Err(anyhow::anyhow!("Telegram rejected the bot token: {e}")),
    }

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!(error = %e, "Failed to register command menu");
    }

    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    teloxide::repl(bot, move |msg: Message| {
        let controller = Arc::clone(&controller);
        let transport = Arc::clone(&transport);

        async move {
            let Some(inbound) = to_inbound(&msg) else {
                info!(chat_id = msg.chat.id.0, "Ignoring non-text message");
                return respond(());
            };

            info!(
                user_id = inbound.user_id,
                chat_id = inbound.chat_id,
                message_content = %inbound.text,
                "Received message"
            );

            if let Err(e) = controller.handle(transport.as_ref(), &inbound).await {
                error!(
                    user_id = inbound.user_id,
                    chat_id = inbound.chat_id,
                    error = %e,
                    "Failed to reply"
                );
            }
            respond(())
        }
    })
    .await;

    Ok(())
}
