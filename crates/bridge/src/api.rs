use async_trait::async_trait;

use deskrelay_common::types::{ChatId, MessageId, TopicId};

use crate::error::CapabilityError;

/// The chat-platform operations the relay consumes.
///
/// One implementation per platform; tests use an in-memory fake. No retries
/// or timeouts live behind this seam — callers apply their own per-path
/// policy.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Create a topic in `chat` and return its thread id.
    async fn create_topic(&self, chat: ChatId, name: &str) -> Result<TopicId, CapabilityError>;

    /// Forward a message into `to` under `thread`, keeping the sender header.
    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message: MessageId,
        thread: TopicId,
    ) -> Result<(), CapabilityError>;

    /// Copy a message into `to` without a forwarded-from header.
    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message: MessageId,
    ) -> Result<(), CapabilityError>;

    /// Send plain text into `to`, optionally inside a thread.
    async fn send_text(
        &self,
        to: ChatId,
        thread: Option<TopicId>,
        text: &str,
    ) -> Result<(), CapabilityError>;

    /// Whether `chat` supports threaded topics. Checked once at startup.
    async fn chat_supports_topics(&self, chat: ChatId) -> Result<bool, CapabilityError>;
}
