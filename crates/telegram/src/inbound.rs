//! Flattening teloxide updates into the relay's platform-agnostic shape.

use teloxide::types::{ChatKind, MediaKind, Message, MessageKind, PublicChatKind};

use {
    deskrelay_bridge::classify::InboundMessage,
    deskrelay_common::types::{ChatId, ChatScope, MessageId, TopicId, UserId},
};

/// Flatten a Telegram message into the fields routing cares about.
pub fn profile(msg: &Message) -> InboundMessage {
    let text = extract_text(msg);
    let command = text.as_deref().and_then(parse_command);
    InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        chat_scope: classify_chat(msg),
        message_id: MessageId(msg.id.0),
        thread_id: msg.thread_id.map(|t| TopicId(t.0.0)),
        sender_id: msg.from.as_ref().map(|u| UserId(u.id.0)),
        sender_is_bot: msg.from.as_ref().is_some_and(|u| u.is_bot),
        has_content: text.is_some() || has_media(msg),
        command,
    }
}

/// Text or caption, whichever the message carries.
fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            MediaKind::Photo(p) => p.caption.clone(),
            MediaKind::Document(d) => d.caption.clone(),
            MediaKind::Audio(a) => a.caption.clone(),
            MediaKind::Voice(v) => v.caption.clone(),
            MediaKind::Video(vid) => vid.caption.clone(),
            MediaKind::Animation(a) => a.caption.clone(),
            _ => None,
        },
        _ => None,
    }
}

/// Whether the message carries any attachment kind (photo, sticker, voice…).
fn has_media(msg: &Message) -> bool {
    match &msg.kind {
        MessageKind::Common(common) => !matches!(common.media_kind, MediaKind::Text(_)),
        _ => false,
    }
}

/// Leading slash-command name, lowercased, with any `@BotName` suffix
/// stripped ("/Start@SupportBot hi" → "start").
fn parse_command(text: &str) -> Option<String> {
    let rest = text.strip_prefix('/')?;
    let token = rest.split_whitespace().next().unwrap_or_default();
    let name = token.split('@').next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

fn classify_chat(msg: &Message) -> ChatScope {
    match &msg.chat.kind {
        ChatKind::Private(_) => ChatScope::Private,
        ChatKind::Public(p) => match &p.kind {
            PublicChatKind::Channel(_) => ChatScope::Channel,
            _ => ChatScope::Group,
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).expect("deserialize test message")
    }

    fn private_chat() -> serde_json::Value {
        json!({ "id": 42, "type": "private", "first_name": "Alice" })
    }

    fn support_chat() -> serde_json::Value {
        json!({ "id": -100500, "type": "supergroup", "title": "Support" })
    }

    fn user(id: u64, is_bot: bool) -> serde_json::Value {
        json!({ "id": id, "is_bot": is_bot, "first_name": "Alice" })
    }

    #[test]
    fn private_text_message() {
        let msg = message(json!({
            "message_id": 1,
            "date": 1,
            "chat": private_chat(),
            "from": user(42, false),
            "text": "hello"
        }));
        let p = profile(&msg);
        assert_eq!(p.chat_id, ChatId(42));
        assert_eq!(p.chat_scope, ChatScope::Private);
        assert_eq!(p.sender_id, Some(UserId(42)));
        assert!(!p.sender_is_bot);
        assert!(p.has_content);
        assert_eq!(p.command, None);
        assert_eq!(p.thread_id, None);
    }

    #[test]
    fn start_command_is_parsed() {
        let msg = message(json!({
            "message_id": 2,
            "date": 1,
            "chat": private_chat(),
            "from": user(42, false),
            "text": "/start"
        }));
        assert_eq!(profile(&msg).command.as_deref(), Some("start"));
    }

    #[test]
    fn command_with_bot_suffix_and_args() {
        let msg = message(json!({
            "message_id": 3,
            "date": 1,
            "chat": private_chat(),
            "from": user(42, false),
            "text": "/Start@SupportBot please"
        }));
        assert_eq!(profile(&msg).command.as_deref(), Some("start"));
    }

    #[test]
    fn bare_slash_is_not_a_command() {
        let msg = message(json!({
            "message_id": 4,
            "date": 1,
            "chat": private_chat(),
            "from": user(42, false),
            "text": "/"
        }));
        assert_eq!(profile(&msg).command, None);
    }

    #[test]
    fn threaded_support_chat_message() {
        let msg = message(json!({
            "message_id": 5,
            "date": 1,
            "chat": support_chat(),
            "from": user(9000, false),
            "message_thread_id": 100,
            "is_topic_message": true,
            "text": "we are on it"
        }));
        let p = profile(&msg);
        assert_eq!(p.chat_id, ChatId(-100_500));
        assert_eq!(p.chat_scope, ChatScope::Group);
        assert_eq!(p.thread_id, Some(TopicId(100)));
    }

    #[test]
    fn photo_without_caption_still_counts_as_content() {
        let msg = message(json!({
            "message_id": 6,
            "date": 1,
            "chat": private_chat(),
            "from": user(42, false),
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 1,
                "height": 1
            }]
        }));
        let p = profile(&msg);
        assert!(p.has_content);
        assert_eq!(p.command, None);
    }

    #[test]
    fn photo_caption_can_carry_a_command() {
        let msg = message(json!({
            "message_id": 7,
            "date": 1,
            "chat": private_chat(),
            "from": user(42, false),
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 1,
                "height": 1
            }],
            "caption": "/start"
        }));
        assert_eq!(profile(&msg).command.as_deref(), Some("start"));
    }

    #[test]
    fn bot_sender_is_flagged() {
        let msg = message(json!({
            "message_id": 8,
            "date": 1,
            "chat": private_chat(),
            "from": user(7, true),
            "text": "beep"
        }));
        assert!(profile(&msg).sender_is_bot);
    }
}
