//! Shared identifier types used across all deskrelay crates.

pub mod types;

pub use types::{ChatId, ChatScope, MessageId, TopicId, UserId};
