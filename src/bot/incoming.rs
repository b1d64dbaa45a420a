//! Transport-neutral views of incoming Telegram updates

use teloxide::types::{CallbackQuery, Message};

use crate::dialogue::StepInput;
use crate::models::NewUser;

/// The Telegram account behind an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

impl Sender {
    /// Registration data for this account
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            user_id: self.user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language_code.as_deref()
    }
}

impl From<&teloxide::types::User> for Sender {
    fn from(user: &teloxide::types::User) -> Self {
        Self {
            user_id: user.id.0 as i64,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            language_code: user.language_code.clone(),
        }
    }
}

/// What a message carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    /// File reference of the largest photo size
    Photo(String),
    Other,
}

impl MessageContent {
    pub fn as_step_input(&self) -> StepInput<'_> {
        match self {
            MessageContent::Text(text) => StepInput::Text(text),
            MessageContent::Photo(file_ref) => StepInput::Photo(file_ref),
            MessageContent::Other => StepInput::Other,
        }
    }
}

/// A message addressed to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub is_private: bool,
    pub sender: Sender,
    pub content: MessageContent,
}

impl IncomingMessage {
    /// Returns `None` for messages without an author, such as channel posts
    pub fn from_telegram(msg: &Message) -> Option<Self> {
        let sender = Sender::from(msg.from.as_ref()?);

        let content = if let Some(text) = msg.text() {
            MessageContent::Text(text.to_string())
        } else if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
            MessageContent::Photo(largest.file.id.0.clone())
        } else {
            MessageContent::Other
        };

        Some(Self {
            chat_id: msg.chat.id.0,
            is_private: msg.chat.is_private(),
            sender,
            content,
        })
    }
}

/// A press on an inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCallback {
    pub chat_id: i64,
    pub sender: Sender,
    pub data: String,
}

impl IncomingCallback {
    pub fn from_telegram(q: &CallbackQuery) -> Self {
        let sender = Sender::from(&q.from);
        // Buttons on messages too old to be delivered still identify the user's private chat
        let chat_id = q
            .message
            .as_ref()
            .map(|message| message.chat().id.0)
            .unwrap_or(sender.user_id);

        Self {
            chat_id,
            sender,
            data: q.data.clone().unwrap_or_default(),
        }
    }
}
