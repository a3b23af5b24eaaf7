//! Meeting room bindings.
//!
//! Maps an application room id to the media channel it uses and the
//! business entity recordings of that room belong to.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub id: i64,
    pub room_id: String,
    pub channel_name: String,
    pub entity_id: i64,
    pub entity_label: Option<String>,
    pub created_at: String,
}

const ROOM_COLUMNS: &str = "id, room_id, channel_name, entity_id, entity_label, created_at";

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<RoomRecord> {
    Ok(RoomRecord {
        id: row.get(0)?,
        room_id: row.get(1)?,
        channel_name: row.get(2)?,
        entity_id: row.get(3)?,
        entity_label: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub struct RoomRepository;

impl RoomRepository {
    /// Insert or replace the binding for `room_id`. Returns the row id.
    pub fn upsert(
        conn: &Connection,
        room_id: &str,
        channel_name: &str,
        entity_id: i64,
        entity_label: Option<&str>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO meeting_rooms (room_id, channel_name, entity_id, entity_label) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(room_id) DO UPDATE SET channel_name = excluded.channel_name, \
             entity_id = excluded.entity_id, entity_label = excluded.entity_label",
            params![room_id, channel_name, entity_id, entity_label],
        )
        .context("Failed to upsert meeting room")?;

        let id = conn
            .query_row(
                "SELECT id FROM meeting_rooms WHERE room_id = ?1",
                params![room_id],
                |row| row.get(0),
            )
            .context("Failed to read meeting room id")?;

        Ok(id)
    }

    pub fn get_by_room_id(conn: &Connection, room_id: &str) -> Result<Option<RoomRecord>> {
        let sql = format!("SELECT {} FROM meeting_rooms WHERE room_id = ?1", ROOM_COLUMNS);
        let mut stmt = conn.prepare(&sql).context("Failed to prepare meeting room query")?;

        let mut rows = stmt
            .query_map(params![room_id], room_from_row)
            .context("Failed to query meeting room")?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// All rooms ordered by room id.
    pub fn list(conn: &Connection) -> Result<Vec<RoomRecord>> {
        let sql = format!("SELECT {} FROM meeting_rooms ORDER BY room_id ASC", ROOM_COLUMNS);
        let mut stmt = conn.prepare(&sql).context("Failed to prepare meeting rooms list query")?;

        let rooms = stmt
            .query_map([], room_from_row)
            .context("Failed to list meeting rooms")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map meeting rooms")?;

        Ok(rooms)
    }

    /// Returns whether a row was deleted.
    pub fn remove(conn: &Connection, room_id: &str) -> Result<bool> {
        let deleted = conn
            .execute("DELETE FROM meeting_rooms WHERE room_id = ?1", params![room_id])
            .context("Failed to remove meeting room")?;
        Ok(deleted > 0)
    }
}
