//! Routing decision for one inbound message.

use deskrelay_common::types::{ChatId, ChatScope, MessageId, TopicId, UserId};

/// Platform-agnostic shape of one inbound message — exactly the fields
/// routing looks at, flattened out of whatever the platform delivered.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub chat_scope: ChatScope,
    pub message_id: MessageId,
    /// Thread the message was posted in, when the chat is a forum.
    pub thread_id: Option<TopicId>,
    pub sender_id: Option<UserId>,
    pub sender_is_bot: bool,
    /// Text, caption, or any attachment kind — anything a support agent
    /// could see.
    pub has_content: bool,
    /// Leading slash-command name, when the text is a command.
    pub command: Option<String>,
}

impl InboundMessage {
    pub fn is_command(&self, name: &str) -> bool {
        self.command.as_deref() == Some(name)
    }
}

/// Where a message should be relayed, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Private message from an end-user: relay into their support topic.
    ToSupport,
    /// Reply inside a support-chat topic: relay to the mapped user.
    ToUser,
    /// No routing rule applies. Not an error.
    Ignored,
}

/// Classify one inbound message against the designated support chat.
///
/// `ToSupport` and `ToUser` cannot both match: one requires a private chat,
/// the other the support chat itself. `ToSupport` is checked first only for
/// readability.
pub fn classify(msg: &InboundMessage, support_chat: ChatId) -> Verdict {
    if msg.sender_is_bot {
        return Verdict::Ignored;
    }
    if msg.chat_scope == ChatScope::Private && msg.command.is_none() && msg.has_content {
        return Verdict::ToSupport;
    }
    if msg.chat_id == support_chat && msg.thread_id.is_some() {
        return Verdict::ToUser;
    }
    Verdict::Ignored
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const SUPPORT: ChatId = ChatId(-100_500);

    fn private_text() -> InboundMessage {
        InboundMessage {
            chat_id: ChatId(42),
            chat_scope: ChatScope::Private,
            message_id: MessageId(1),
            thread_id: None,
            sender_id: Some(UserId(42)),
            sender_is_bot: false,
            has_content: true,
            command: None,
        }
    }

    fn topic_reply() -> InboundMessage {
        InboundMessage {
            chat_id: SUPPORT,
            chat_scope: ChatScope::Group,
            message_id: MessageId(2),
            thread_id: Some(TopicId(100)),
            sender_id: Some(UserId(9000)),
            sender_is_bot: false,
            has_content: true,
            command: None,
        }
    }

    #[test]
    fn private_message_with_content_goes_to_support() {
        assert_eq!(classify(&private_text(), SUPPORT), Verdict::ToSupport);
    }

    #[test]
    fn threaded_support_chat_message_goes_to_user() {
        assert_eq!(classify(&topic_reply(), SUPPORT), Verdict::ToUser);
    }

    #[rstest]
    #[case::command({
        let mut m = private_text();
        m.command = Some("help".into());
        m
    })]
    #[case::empty({
        let mut m = private_text();
        m.has_content = false;
        m
    })]
    #[case::bot_sender({
        let mut m = private_text();
        m.sender_is_bot = true;
        m
    })]
    #[case::support_general_area({
        let mut m = topic_reply();
        m.thread_id = None;
        m
    })]
    #[case::bot_in_topic({
        let mut m = topic_reply();
        m.sender_is_bot = true;
        m
    })]
    #[case::unrelated_group({
        let mut m = topic_reply();
        m.chat_id = ChatId(-200);
        m
    })]
    fn everything_else_is_ignored(#[case] msg: InboundMessage) {
        assert_eq!(classify(&msg, SUPPORT), Verdict::Ignored);
    }

    #[test]
    fn verdicts_are_mutually_exclusive_by_chat() {
        // A private chat id can never equal the support chat id (group ids
        // are negative), so no message satisfies both arms.
        let msg = private_text();
        assert_ne!(msg.chat_id, SUPPORT);
    }
}
