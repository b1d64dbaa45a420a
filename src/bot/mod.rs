//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles incoming text and photo messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Menu commands, keyboards and message formatting
//! - `dialogue_manager`: Product creation and search steps
//! - `incoming`: Transport-neutral views of updates
//! - `context`: Services shared by the handlers
//! - `telegram_gateway`: Outbound messages through the Bot API

pub mod callback_handler;
pub mod context;
pub mod dialogue_manager;
pub mod incoming;
pub mod message_handler;
pub mod telegram_gateway;
pub mod ui_builder;

/// Result type of every update handler
pub type HandlerResult = anyhow::Result<()>;

// Re-export main handler functions for use in main.rs
pub use callback_handler::{callback_handler, handle_callback};
pub use context::AppContext;
pub use message_handler::{handle_incoming, message_handler};
pub use telegram_gateway::TelegramGateway;
