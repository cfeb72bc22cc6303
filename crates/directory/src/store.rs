use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use {
    serde::{Deserialize, Serialize},
    tokio::fs,
    tracing::{debug, error, info},
};

use deskrelay_common::types::{TopicId, UserId};

/// On-disk snapshot: both indexes in one document, string-encoded integer keys.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub topic_by_user: HashMap<UserId, TopicId>,
    pub user_by_topic: HashMap<TopicId, UserId>,
}

/// Bidirectional user ↔ topic directory with full-snapshot JSON persistence.
///
/// Both indexes live behind one lock, so no observer can see them out of
/// step. Every mutation rewrites the snapshot file (write-temp-then-rename,
/// previous snapshot kept as `.bak`), which at one support team's volume is
/// cheap; callers must not assume sub-millisecond mutation latency.
///
/// A failed write is critical but not fatal: the in-memory indexes stay
/// authoritative for the rest of the process lifetime.
pub struct DirectoryStore {
    path: PathBuf,
    indexes: RwLock<DirectorySnapshot>,
    /// Serializes snapshot writes so a slow write can never clobber the file
    /// with state older than a later write.
    persist_lock: tokio::sync::Mutex<()>,
}

impl DirectoryStore {
    /// Open a store backed by `path`. A missing file starts empty; an
    /// unreadable or corrupt file is logged and treated as empty.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let indexes = match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<DirectorySnapshot>(&raw) {
                Ok(snapshot) => {
                    info!(
                        relations = snapshot.topic_by_user.len(),
                        path = %path.display(),
                        "loaded user-topic directory"
                    );
                    snapshot
                },
                Err(e) => {
                    error!(
                        path = %path.display(),
                        error = %e,
                        "corrupt directory snapshot, starting empty"
                    );
                    DirectorySnapshot::default()
                },
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no directory snapshot yet, starting empty");
                DirectorySnapshot::default()
            },
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "cannot read directory snapshot, starting empty"
                );
                DirectorySnapshot::default()
            },
        };
        Self {
            path,
            indexes: RwLock::new(indexes),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Topic mapped to `user_id`, if any.
    pub fn get_topic(&self, user_id: UserId) -> Option<TopicId> {
        self.read().topic_by_user.get(&user_id).copied()
    }

    /// User mapped to `topic_id`, if any.
    pub fn get_user(&self, topic_id: TopicId) -> Option<UserId> {
        self.read().user_by_topic.get(&topic_id).copied()
    }

    /// Number of live relations.
    pub fn len(&self) -> usize {
        self.read().topic_by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace the relation for `user_id`, then persist.
    ///
    /// Replacing a pair removes the old reverse entry in the same critical
    /// section, so the two indexes stay mutual inverses.
    pub async fn save_relation(&self, user_id: UserId, topic_id: TopicId) {
        {
            let mut idx = self.write();
            if let Some(old) = idx.topic_by_user.insert(user_id, topic_id)
                && old != topic_id
            {
                idx.user_by_topic.remove(&old);
            }
            idx.user_by_topic.insert(topic_id, user_id);
        }
        self.persist().await;
        info!(user_id = %user_id, topic_id = %topic_id, "relation saved");
    }

    /// Remove the relation keyed by `user_id`, then persist. No-op if absent.
    pub async fn delete_relation(&self, user_id: UserId) {
        {
            let mut idx = self.write();
            let Some(topic_id) = idx.topic_by_user.remove(&user_id) else {
                return;
            };
            idx.user_by_topic.remove(&topic_id);
        }
        self.persist().await;
        info!(user_id = %user_id, "relation deleted");
    }

    /// Write the current state to disk. The snapshot is taken under the
    /// persist lock, so whichever mutation writes last writes the freshest
    /// state.
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.read().clone();
        if let Err(e) = self.write_snapshot(&snapshot).await {
            error!(
                path = %self.path.display(),
                error = %e,
                "critical: directory snapshot not persisted, continuing in memory"
            );
        }
    }

    /// Atomic write: temp file, rename over target, keep `.bak`.
    async fn write_snapshot(&self, snapshot: &DirectorySnapshot) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json.as_bytes()).await?;

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.path.with_extension("json.bak");
            let _ = fs::rename(&self.path, &bak).await;
        }

        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, DirectorySnapshot> {
        self.indexes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectorySnapshot> {
        self.indexes.write().unwrap_or_else(|e| e.into_inner())
    }
}
