//! Telegram transport for deskrelay.
//!
//! Implements the relay's `ChatApi` against the Bot API via teloxide and
//! feeds inbound updates through the relay engine.

pub mod api;
pub mod bot;
pub mod inbound;

pub use {
    api::TelegramChatApi,
    bot::{build_bot, start_polling},
};
