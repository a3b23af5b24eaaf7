//! Media catalog: one row per finished recording file.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub entity_id: i64,
    pub file_name: String,
    pub storage_key: String,
    pub created_at: String,
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        entity_id: row.get(1)?,
        file_name: row.get(2)?,
        storage_key: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub struct CatalogRepository;

impl CatalogRepository {
    pub fn insert(conn: &Connection, entity_id: i64, file_name: &str, storage_key: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO media_catalog (entity_id, file_name, storage_key) VALUES (?1, ?2, ?3)",
            params![entity_id, file_name, storage_key],
        )
        .context("Failed to insert media catalog entry")?;

        Ok(conn.last_insert_rowid())
    }

    /// Entries for one entity, newest first.
    pub fn list_for_entity(conn: &Connection, entity_id: i64, limit: usize) -> Result<Vec<CatalogEntry>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, entity_id, file_name, storage_key, created_at FROM media_catalog \
                 WHERE entity_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
            )
            .context("Failed to prepare media catalog query")?;

        let entries = stmt
            .query_map(params![entity_id, limit as i64], entry_from_row)
            .context("Failed to query media catalog")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map media catalog entries")?;

        Ok(entries)
    }

    pub fn list_recent(conn: &Connection, limit: usize) -> Result<Vec<CatalogEntry>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, entity_id, file_name, storage_key, created_at FROM media_catalog \
                 ORDER BY created_at DESC, id DESC LIMIT ?1",
            )
            .context("Failed to prepare media catalog list query")?;

        let mut entries = Vec::new();
        for row in stmt
            .query_map(params![limit as i64], entry_from_row)
            .context("Failed to list media catalog")?
        {
            entries.push(row?);
        }

        Ok(entries)
    }
}
