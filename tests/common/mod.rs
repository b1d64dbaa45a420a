//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::ChatId;
use tempfile::TempDir;

use marketplace_bot::bot::incoming::{IncomingCallback, IncomingMessage, MessageContent, Sender};
use marketplace_bot::bot::AppContext;
use marketplace_bot::db::{connect, init_database_schema, SqliteRepository};
use marketplace_bot::dialogue::{ChatDialogue, ChatState};
use marketplace_bot::gateway::{Keyboard, MessagingGateway};
use marketplace_bot::photo_store::PhotoStore;

pub const DEVELOPER_CONTACT: &str = "https://t.me/dev";
pub const PHOTO_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg";
/// Longest photo caption Telegram accepts
pub const TELEGRAM_CAPTION_LIMIT: usize = 1024;

/// One outgoing message captured by `RecordingGateway`
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Html {
        chat_id: i64,
        text: String,
    },
    Photo {
        chat_id: i64,
        caption: String,
        keyboard: Option<Keyboard>,
        size: usize,
    },
}

impl Sent {
    pub fn chat_id(&self) -> i64 {
        match self {
            Sent::Text { chat_id, .. } | Sent::Html { chat_id, .. } | Sent::Photo { chat_id, .. } => {
                *chat_id
            }
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Sent::Text { text, .. } | Sent::Html { text, .. } => text,
            Sent::Photo { caption, .. } => caption,
        }
    }
}

/// Gateway double that records everything instead of talking to Telegram
pub struct RecordingGateway {
    sent: Mutex<Vec<Sent>>,
    attachment: Mutex<Option<Vec<u8>>>,
    reject_photos: Mutex<bool>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attachment: Mutex::new(Some(PHOTO_BYTES.to_vec())),
            reject_photos: Mutex::new(false),
        }
    }

    /// Make every following photo send fail
    pub fn fail_photos(&self) {
        *self.reject_photos.lock().unwrap() = true;
    }

    /// Make every following download fail
    pub fn fail_downloads(&self) {
        *self.attachment.lock().unwrap() = None;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Drain what was sent so far
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Bodies of the messages sent to one chat
    pub fn bodies_for(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .iter()
            .filter(|sent| sent.chat_id() == chat_id)
            .map(|sent| sent.body().to_string())
            .collect()
    }

    pub fn last_body(&self) -> Option<String> {
        self.sent().last().map(|sent| sent.body().to_string())
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<()> {
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn send_html(&self, chat_id: i64, text: &str) -> Result<()> {
        self.record(Sent::Html {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: Vec<u8>,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        if *self.reject_photos.lock().unwrap() {
            return Err(anyhow!("Bad Request: wrong file identifier"));
        }
        if caption.chars().count() > TELEGRAM_CAPTION_LIMIT {
            return Err(anyhow!("Bad Request: message caption is too long"));
        }
        self.record(Sent::Photo {
            chat_id,
            caption: caption.to_string(),
            keyboard,
            size: photo.len(),
        });
        Ok(())
    }

    async fn download_attachment(&self, file_ref: &str) -> Result<Vec<u8>> {
        self.attachment
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("download of {file_ref} failed"))
    }
}

/// A bot wired to an in-memory database, a temporary photo directory and a recording gateway
pub struct TestBot {
    pub ctx: AppContext,
    pub gateway: Arc<RecordingGateway>,
    pub storage: Arc<InMemStorage<ChatState>>,
    pub photo_dir: TempDir,
}

impl TestBot {
    pub async fn new() -> Result<Self> {
        let pool = connect("sqlite::memory:").await?;
        init_database_schema(&pool).await?;

        let photo_dir = TempDir::new()?;
        let gateway = Arc::new(RecordingGateway::new());
        let ctx = AppContext::new(
            Arc::new(SqliteRepository::new(pool)),
            gateway.clone(),
            PhotoStore::new(photo_dir.path()),
            DEVELOPER_CONTACT,
        );

        Ok(Self {
            ctx,
            gateway,
            storage: InMemStorage::new(),
            photo_dir,
        })
    }

    pub fn dialogue(&self, chat_id: i64) -> ChatDialogue {
        Dialogue::new(self.storage.clone(), ChatId(chat_id))
    }

    pub async fn state(&self, chat_id: i64) -> Result<ChatState> {
        Ok(self.dialogue(chat_id).get().await?.unwrap_or_default())
    }

    pub async fn send(&self, message: IncomingMessage) -> Result<()> {
        let dialogue = self.dialogue(message.chat_id);
        marketplace_bot::bot::handle_incoming(&self.ctx, &dialogue, &message).await
    }

    pub async fn press(&self, callback: IncomingCallback) -> Result<()> {
        marketplace_bot::bot::handle_callback(&self.ctx, &callback).await
    }

    /// Number of files in the photo directory
    pub fn photo_count(&self) -> usize {
        std::fs::read_dir(self.photo_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn sender(user_id: i64, first_name: &str, username: Option<&str>) -> Sender {
    Sender {
        user_id,
        first_name: first_name.to_string(),
        last_name: None,
        username: username.map(str::to_string),
        language_code: Some("ru".to_string()),
    }
}

/// A private-chat text message; the chat id equals the user id as in Telegram
pub fn text(from: &Sender, text: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: from.user_id,
        is_private: true,
        sender: from.clone(),
        content: MessageContent::Text(text.to_string()),
    }
}

pub fn photo(from: &Sender, file_ref: &str) -> IncomingMessage {
    IncomingMessage {
        chat_id: from.user_id,
        is_private: true,
        sender: from.clone(),
        content: MessageContent::Photo(file_ref.to_string()),
    }
}

pub fn callback(from: &Sender, data: &str) -> IncomingCallback {
    IncomingCallback {
        chat_id: from.user_id,
        sender: from.clone(),
        data: data.to_string(),
    }
}

/// Register `who` and make them a seller
pub async fn register_seller(bot: &TestBot, who: &Sender) -> Result<()> {
    bot.send(text(who, "/start")).await?;
    bot.send(text(who, "🔸 Стать продавцом")).await
}

/// Walk `seller` through the whole product creation flow
pub async fn add_product(bot: &TestBot, seller: &Sender, name: &str, price: &str) -> Result<()> {
    bot.send(text(seller, "🔸 Добавить товар")).await?;
    bot.send(text(seller, name)).await?;
    bot.send(text(seller, "Описание")).await?;
    bot.send(text(seller, price)).await?;
    bot.send(photo(seller, "file-ref")).await
}
