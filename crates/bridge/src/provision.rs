//! Lazy topic provisioning and the rotate-on-failure primitive.

use std::sync::Arc;

use {
    dashmap::DashMap,
    tokio::sync::Mutex,
    tracing::{info, warn},
};

use {
    deskrelay_common::types::{ChatId, TopicId, UserId},
    deskrelay_directory::DirectoryStore,
};

use crate::{
    api::ChatApi,
    error::{Error, Result},
};

/// Turns a user id into a guaranteed-valid topic id, creating and recording
/// one when absent.
///
/// All mapping mutations for one user run under that user's mutex, including
/// the `create_topic` call in the middle of a rotation: serializing on one
/// user's network latency is cheap at this volume, and it rules out the race
/// where two concurrent failures each create a fresh topic and one relation
/// ends up orphaned.
pub struct TopicProvisioner {
    api: Arc<dyn ChatApi>,
    store: Arc<DirectoryStore>,
    support_chat: ChatId,
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl TopicProvisioner {
    pub fn new(api: Arc<dyn ChatApi>, store: Arc<DirectoryStore>, support_chat: ChatId) -> Self {
        Self {
            api,
            store,
            support_chat,
            user_locks: DashMap::new(),
        }
    }

    /// The existing topic for `user_id`, or a freshly created one.
    ///
    /// Creation failure propagates unchanged — fatal for the request that
    /// needed the topic, nothing is retried here.
    pub async fn ensure_topic(&self, user_id: UserId) -> Result<TopicId> {
        if let Some(topic) = self.store.get_topic(user_id) {
            return Ok(topic);
        }
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        // Another task may have provisioned while we waited.
        if let Some(topic) = self.store.get_topic(user_id) {
            return Ok(topic);
        }
        self.create_and_record(user_id).await
    }

    /// Replace a relation whose topic turned out to be invalid.
    ///
    /// The replacement topic is created first and the relation swapped in one
    /// store mutation, so a relation is never left deleted without a
    /// successor. When another task already rotated this user past `stale`,
    /// the current topic is returned untouched.
    pub async fn rotate_topic(&self, user_id: UserId, stale: TopicId) -> Result<TopicId> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;
        if let Some(current) = self.store.get_topic(user_id)
            && current != stale
        {
            info!(
                user_id = %user_id,
                topic_id = %current,
                "topic already rotated by a concurrent task"
            );
            return Ok(current);
        }
        let topic = self.create_and_record(user_id).await?;
        info!(
            user_id = %user_id,
            old_topic = %stale,
            new_topic = %topic,
            "rotated invalid topic"
        );
        Ok(topic)
    }

    fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.user_locks.entry(user_id).or_default().clone()
    }

    async fn create_and_record(&self, user_id: UserId) -> Result<TopicId> {
        let topic = self
            .api
            .create_topic(self.support_chat, &user_id.to_string())
            .await
            .map_err(|source| {
                warn!(user_id = %user_id, error = %source, "topic creation failed");
                Error::TopicCreate { user_id, source }
            })?;
        self.store.save_relation(user_id, topic).await;
        info!(user_id = %user_id, topic_id = %topic, "created topic");
        Ok(topic)
    }
}
