//! Messaging gateway backed by the Telegram Bot API

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton,
    KeyboardMarkup, ParseMode, ReplyMarkup,
};
use tracing::debug;

use crate::gateway::{Keyboard, MessagingGateway};

pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn to_reply_markup(keyboard: Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply(rows) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(
                rows.into_iter()
                    .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
            )
            .resize_keyboard(),
        ),
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(
            rows.into_iter().map(|row| {
                row.into_iter()
                    .map(|button| InlineKeyboardButton::callback(button.label, button.callback_data))
                    .collect::<Vec<_>>()
            }),
        )),
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_reply_markup(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn send_html(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: Vec<u8>,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        let mut request = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::memory(photo));
        if !caption.is_empty() {
            request = request.caption(caption);
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_reply_markup(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn download_attachment(&self, file_ref: &str) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(FileId(file_ref.to_string()))
            .await
            .context("Failed to resolve Telegram file")?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        );

        let response = reqwest::get(&url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        debug!(file_ref, size = bytes.len(), "Attachment downloaded");
        Ok(bytes.to_vec())
    }
}
