//! Telegram Bot API wire layer: payload types and the HTTP client.

pub mod client;
pub mod types;

pub use client::TelegramClient;
