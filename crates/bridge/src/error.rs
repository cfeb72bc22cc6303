use thiserror::Error;

use deskrelay_common::types::{MessageId, UserId};

/// Failure of one external chat-platform call.
///
/// The relay routes on which operation failed; the platform implementation
/// keeps the transport cause chained for logs.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct CapabilityError {
    pub operation: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl CapabilityError {
    #[must_use]
    pub fn new(
        operation: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            operation,
            source: Box::new(source),
        }
    }
}

/// Fatal relay outcomes. Everything else is absorbed by policy and logged.
#[derive(Debug, Error)]
pub enum Error {
    /// Topic creation failed; the triggering message is lost.
    #[error("could not create a topic for user {user_id}: {source}")]
    TopicCreate {
        user_id: UserId,
        #[source]
        source: CapabilityError,
    },

    /// Forwarding failed both before and after topic rotation.
    #[error("message {message_id} from user {user_id} undeliverable after topic rotation: {source}")]
    Undeliverable {
        user_id: UserId,
        message_id: MessageId,
        #[source]
        source: CapabilityError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
