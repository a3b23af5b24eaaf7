use anyhow::Result;

use super::args::{CatalogCliArgs, CatalogCommand};
use crate::config::Config;
use crate::db::{self, CatalogRepository};

pub fn handle_catalog_command(args: CatalogCliArgs, config: &Config) -> Result<()> {
    let conn = db::init_db(&config.database.resolve_path()?)?;

    match args.command {
        CatalogCommand::List { entity, limit } => {
            let entries = match entity {
                Some(entity_id) => CatalogRepository::list_for_entity(&conn, entity_id, limit)?,
                None => CatalogRepository::list_recent(&conn, limit)?,
            };

            if entries.is_empty() {
                println!("No recordings found.");
                return Ok(());
            }

            println!("Found {} recording(s):\n", entries.len());
            for entry in entries {
                println!("ID:     {}", entry.id);
                println!("Entity: {}", entry.entity_id);
                println!("Date:   {}", entry.created_at);
                println!("File:   {}", entry.file_name);
                println!("Key:    {}", entry.storage_key);
                println!("---");
            }
        }
    }

    Ok(())
}
