use anyhow::{anyhow, Result};

use super::args::{RoomsCliArgs, RoomsCommand};
use crate::config::Config;
use crate::db::{self, RoomRepository};

pub fn handle_rooms_command(args: RoomsCliArgs, config: &Config) -> Result<()> {
    let conn = db::init_db(&config.database.resolve_path()?)?;

    match args.command {
        RoomsCommand::Add {
            room_id,
            channel,
            entity,
            label,
        } => {
            RoomRepository::upsert(&conn, &room_id, &channel, entity, label.as_deref())?;
            println!("Room {} bound to channel {} (entity {})", room_id, channel, entity);
        }
        RoomsCommand::List => {
            let rooms = RoomRepository::list(&conn)?;
            if rooms.is_empty() {
                println!("No meeting rooms configured.");
                return Ok(());
            }

            println!("Found {} room(s):\n", rooms.len());
            for room in rooms {
                println!("Room:    {}", room.room_id);
                println!("Channel: {}", room.channel_name);
                println!(
                    "Entity:  {} {}",
                    room.entity_id,
                    room.entity_label.as_deref().unwrap_or("")
                );
                println!("---");
            }
        }
        RoomsCommand::Remove { room_id } => {
            if !RoomRepository::remove(&conn, &room_id)? {
                return Err(anyhow!("Room {} not found", room_id));
            }
            println!("Removed room {}", room_id);
        }
    }

    Ok(())
}
