//! Telegram Bot API integration
//!
//! - [`types`] - Webhook update payloads and request bodies (snake_case JSON)
//! - [`client`] - The [`Messenger`] trait and its Bot API implementation

pub mod client;
pub mod types;

pub use client::{split_message, Messenger, TelegramClient, MAX_MESSAGE_LEN};
pub use types::{ChatId, Message, ParseMode, Update};
