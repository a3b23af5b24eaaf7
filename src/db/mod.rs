pub mod catalog;
pub mod init;
pub mod lookup;
pub mod rooms;


pub use catalog::{CatalogEntry, CatalogRepository};
pub use init::{init_db, migrate};
pub use lookup::{SqliteMediaCatalog, SqliteMeetingLookup};
pub use rooms::{RoomRecord, RoomRepository};
