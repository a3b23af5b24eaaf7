//! Table of recordings that have started but not yet stopped.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything needed to stop a recording and catalog its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRecording {
    pub resource_id: String,
    pub sid: String,
    pub channel_name: String,
    pub uid: String,
    pub entity_id: i64,
    pub entity_label: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Storage for active recordings, keyed by the server-issued sid.
#[async_trait]
pub trait RecordingStore: Send + Sync {
    async fn insert(&self, recording: ActiveRecording);

    async fn get(&self, sid: &str) -> Option<ActiveRecording>;

    async fn remove(&self, sid: &str) -> Option<ActiveRecording>;

    async fn list(&self) -> Vec<ActiveRecording>;
}

/// In-process store; contents are lost when the process exits.
#[derive(Clone, Default)]
pub struct ActiveRecordings {
    inner: Arc<RwLock<HashMap<String, ActiveRecording>>>,
}

impl ActiveRecordings {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RecordingStore for ActiveRecordings {
    async fn insert(&self, recording: ActiveRecording) {
        let mut table = self.inner.write().await;
        table.insert(recording.sid.clone(), recording);
    }

    async fn get(&self, sid: &str) -> Option<ActiveRecording> {
        self.inner.read().await.get(sid).cloned()
    }

    async fn remove(&self, sid: &str) -> Option<ActiveRecording> {
        self.inner.write().await.remove(sid)
    }

    async fn list(&self) -> Vec<ActiveRecording> {
        let mut recordings: Vec<_> = self.inner.read().await.values().cloned().collect();
        recordings.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        recordings
    }
}
