use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open the database at `db_path`, creating the file and schema as needed.
pub fn init_db(db_path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    let conn = Connection::open(db_path).context("Failed to open database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meeting_rooms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            room_id TEXT NOT NULL UNIQUE,
            channel_name TEXT NOT NULL,
            entity_id INTEGER NOT NULL,
            entity_label TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create meeting_rooms table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS media_catalog (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id INTEGER NOT NULL,
            file_name TEXT NOT NULL,
            storage_key TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create media_catalog table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_media_catalog_entity ON media_catalog(entity_id, created_at DESC)",
        [],
    )
    .context("Failed to create media_catalog entity index")?;

    Ok(())
}
