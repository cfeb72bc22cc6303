//! The forwarding state machine.

use std::sync::Arc;

use tracing::{debug, info, warn};

use {
    deskrelay_common::types::{ChatId, ChatScope, TopicId},
    deskrelay_directory::DirectoryStore,
    deskrelay_i18n::{Catalog, ERROR_FORWARD_USER},
};

use crate::{
    api::ChatApi,
    classify::{InboundMessage, Verdict, classify},
    error::{CapabilityError, Error, Result},
    provision::TopicProvisioner,
};

/// Engine behavior that belongs to no collaborator.
#[derive(Debug, Clone, Default)]
pub struct RelayOptions {
    /// Answer `/start` in private chats and pre-provision the sender's topic.
    pub start_command: bool,
    /// Text sent back on `/start`; nothing is sent when unset.
    pub welcome_message: Option<String>,
}

/// Routes each inbound message per its classifier verdict and recovers from
/// invalidated topics by rotating the relation.
pub struct RelayEngine {
    api: Arc<dyn ChatApi>,
    store: Arc<DirectoryStore>,
    provisioner: TopicProvisioner,
    catalog: Arc<Catalog>,
    support_chat: ChatId,
    options: RelayOptions,
}

impl RelayEngine {
    pub fn new(
        api: Arc<dyn ChatApi>,
        store: Arc<DirectoryStore>,
        catalog: Arc<Catalog>,
        support_chat: ChatId,
        options: RelayOptions,
    ) -> Self {
        let provisioner =
            TopicProvisioner::new(Arc::clone(&api), Arc::clone(&store), support_chat);
        Self {
            api,
            store,
            provisioner,
            catalog,
            support_chat,
            options,
        }
    }

    /// Route one inbound message.
    ///
    /// `Ok(())` covers everything the relay absorbed by policy, including
    /// ignored messages and undeliverable replies. `Err` is the fatal
    /// taxonomy only: topic creation failed, or a user message was still
    /// undeliverable after rotation.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        if self.options.start_command
            && msg.chat_scope == ChatScope::Private
            && !msg.sender_is_bot
            && msg.is_command("start")
        {
            return self.handle_start(msg).await;
        }

        match classify(msg, self.support_chat) {
            Verdict::ToSupport => self.relay_to_support(msg).await,
            Verdict::ToUser => {
                self.relay_to_user(msg).await;
                Ok(())
            },
            Verdict::Ignored => {
                debug!(chat_id = %msg.chat_id, "message matched no routing rule");
                Ok(())
            },
        }
    }

    /// User → support topic. On forwarding failure the topic is rotated and
    /// the forward retried exactly once; a second failure is terminal for
    /// this message.
    async fn relay_to_support(&self, msg: &InboundMessage) -> Result<()> {
        let Some(user_id) = msg.sender_id else {
            debug!(chat_id = %msg.chat_id, "private message without a sender, ignoring");
            return Ok(());
        };

        let topic = self.provisioner.ensure_topic(user_id).await?;
        match self.forward(msg, topic).await {
            Ok(()) => {
                debug!(user_id = %user_id, topic_id = %topic, "message forwarded to support");
                return Ok(());
            },
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    topic_id = %topic,
                    error = %e,
                    "forward failed, rotating topic"
                );
            },
        }

        let fresh = self.provisioner.rotate_topic(user_id, topic).await?;
        match self.forward(msg, fresh).await {
            Ok(()) => {
                info!(user_id = %user_id, topic_id = %fresh, "message forwarded after rotation");
                Ok(())
            },
            Err(source) => Err(Error::Undeliverable {
                user_id,
                message_id: msg.message_id,
                source,
            }),
        }
    }

    async fn forward(
        &self,
        msg: &InboundMessage,
        topic: TopicId,
    ) -> std::result::Result<(), CapabilityError> {
        self.api
            .forward_message(self.support_chat, msg.chat_id, msg.message_id, topic)
            .await
    }

    /// Support topic → user. Failure never deletes the relation — the topic
    /// is still valid on the support side — so the agent gets a translated
    /// notice in the same topic instead. Terminal either way.
    async fn relay_to_user(&self, msg: &InboundMessage) {
        let Some(topic) = msg.thread_id else {
            return;
        };
        let Some(user_id) = self.store.get_user(topic) else {
            debug!(topic_id = %topic, "reply in an unmapped topic, dropping");
            return;
        };

        let user_chat = ChatId::from(user_id);
        match self
            .api
            .copy_message(user_chat, self.support_chat, msg.message_id)
            .await
        {
            Ok(()) => {
                debug!(topic_id = %topic, user_id = %user_id, "reply copied to user");
            },
            Err(e) => {
                warn!(
                    topic_id = %topic,
                    user_id = %user_id,
                    error = %e,
                    "reply undeliverable, notifying topic"
                );
                let notice = self.catalog.get(ERROR_FORWARD_USER);
                if let Err(e) = self.api.send_text(self.support_chat, Some(topic), notice).await {
                    warn!(topic_id = %topic, error = %e, "could not post delivery notice");
                }
            },
        }
    }

    /// `/start`: provision the topic ahead of the first real message, then
    /// greet when a welcome text is configured. No configured text means no
    /// reply, not an error.
    async fn handle_start(&self, msg: &InboundMessage) -> Result<()> {
        let Some(user_id) = msg.sender_id else {
            return Ok(());
        };
        self.provisioner.ensure_topic(user_id).await?;
        if let Some(text) = &self.options.welcome_message
            && let Err(e) = self.api.send_text(msg.chat_id, None, text).await
        {
            warn!(user_id = %user_id, error = %e, "could not send welcome message");
        }
        Ok(())
    }
}
