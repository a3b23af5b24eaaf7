//! SQLite-backed implementations of the recording collaborators.
//!
//! rusqlite connections are blocking and not `Sync`, so each call opens its
//! own connection on the blocking pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use super::catalog::CatalogRepository;
use super::init::init_db;
use super::rooms::RoomRepository;
use crate::recording::{MediaCatalog, MeetingLookup, RoomBinding};

async fn with_connection<T, F>(db_path: PathBuf, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = init_db(&db_path)?;
        f(&conn)
    })
    .await
    .context("Database task panicked")?
}

#[derive(Debug, Clone)]
pub struct SqliteMeetingLookup {
    db_path: PathBuf,
}

impl SqliteMeetingLookup {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

#[async_trait]
impl MeetingLookup for SqliteMeetingLookup {
    async fn find_room(&self, room_id: &str) -> Result<Option<RoomBinding>> {
        let room_id = room_id.to_string();
        let record = with_connection(self.db_path.clone(), move |conn| {
            RoomRepository::get_by_room_id(conn, &room_id)
        })
        .await?;

        Ok(record.map(|room| RoomBinding {
            channel_name: room.channel_name,
            entity_id: room.entity_id,
            entity_label: room.entity_label,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct SqliteMediaCatalog {
    db_path: PathBuf,
}

impl SqliteMediaCatalog {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

#[async_trait]
impl MediaCatalog for SqliteMediaCatalog {
    async fn record(&self, entity_id: i64, file_name: &str, storage_key: &str) -> Result<()> {
        let file_name = file_name.to_string();
        let storage_key = storage_key.to_string();
        with_connection(self.db_path.clone(), move |conn| {
            CatalogRepository::insert(conn, entity_id, &file_name, &storage_key).map(|_| ())
        })
        .await
    }
}
