//! teloxide-backed implementation of the relay's chat capability.

use {
    async_trait::async_trait,
    teloxide::{
        payloads::{ForwardMessageSetters, SendMessageSetters},
        prelude::*,
        types::{ChatKind, PublicChatKind, ThreadId},
    },
};

use {
    deskrelay_bridge::{api::ChatApi, error::CapabilityError},
    deskrelay_common::types::{ChatId, MessageId, TopicId},
};

/// The Telegram Bot API as the relay sees it.
pub struct TelegramChatApi {
    bot: Bot,
}

impl TelegramChatApi {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn chat(id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(id.0)
}

fn thread(id: TopicId) -> ThreadId {
    ThreadId(teloxide::types::MessageId(id.0))
}

fn message(id: MessageId) -> teloxide::types::MessageId {
    teloxide::types::MessageId(id.0)
}

fn capability(operation: &'static str, e: teloxide::RequestError) -> CapabilityError {
    CapabilityError::new(operation, e)
}

#[async_trait]
impl ChatApi for TelegramChatApi {
    async fn create_topic(&self, to: ChatId, name: &str) -> Result<TopicId, CapabilityError> {
        let topic = self
            .bot
            .create_forum_topic(chat(to), name)
            .await
            .map_err(|e| capability("create_topic", e))?;
        Ok(TopicId(topic.thread_id.0.0))
    }

    async fn forward_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
        thread_id: TopicId,
    ) -> Result<(), CapabilityError> {
        self.bot
            .forward_message(chat(to), chat(from), message(message_id))
            .message_thread_id(thread(thread_id))
            .await
            .map(drop)
            .map_err(|e| capability("forward_message", e))
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<(), CapabilityError> {
        self.bot
            .copy_message(chat(to), chat(from), message(message_id))
            .await
            .map(drop)
            .map_err(|e| capability("copy_message", e))
    }

    async fn send_text(
        &self,
        to: ChatId,
        thread_id: Option<TopicId>,
        text: &str,
    ) -> Result<(), CapabilityError> {
        let mut req = self.bot.send_message(chat(to), text);
        if let Some(t) = thread_id {
            req = req.message_thread_id(thread(t));
        }
        req.await.map(drop).map_err(|e| capability("send_text", e))
    }

    async fn chat_supports_topics(&self, to: ChatId) -> Result<bool, CapabilityError> {
        let info = self
            .bot
            .get_chat(chat(to))
            .await
            .map_err(|e| capability("get_chat", e))?;
        Ok(matches!(
            &info.kind,
            ChatKind::Public(p) if matches!(
                &p.kind,
                PublicChatKind::Supergroup(sg) if sg.is_forum
            )
        ))
    }
}
