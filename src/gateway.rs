//! Messaging gateway port
//!
//! Everything the marketplace sends to chats goes through this trait. The
//! Telegram implementation lives in `bot::telegram_gateway`.

use anyhow::Result;
use async_trait::async_trait;

/// Inline button carrying callback data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Keyboard attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Persistent reply keyboard, rows of button labels
    Reply(Vec<Vec<String>>),
    /// Buttons attached to the message itself
    Inline(Vec<Vec<InlineButton>>),
}

/// Outbound side of the chat transport
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send plain text
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<()>;

    /// Send text with HTML markup
    async fn send_html(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send a photo with a caption
    async fn send_photo(
        &self,
        chat_id: i64,
        photo: Vec<u8>,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()>;

    /// Fetch the bytes of an attachment by its transport file reference
    async fn download_attachment(&self, file_ref: &str) -> Result<Vec<u8>>;
}
