//! Interfaces to the systems that own meeting rooms and the media catalog.

use anyhow::Result;
use async_trait::async_trait;

/// Business context a meeting room belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomBinding {
    pub channel_name: String,
    pub entity_id: i64,
    pub entity_label: Option<String>,
}

/// Resolves a room identifier to the entity that owns it.
#[async_trait]
pub trait MeetingLookup: Send + Sync {
    async fn find_room(&self, room_id: &str) -> Result<Option<RoomBinding>>;
}

/// Records finished recordings against their entity.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    async fn record(&self, entity_id: i64, file_name: &str, storage_key: &str) -> Result<()>;
}
