pub mod args;
pub mod catalog;
pub mod recording;
pub mod rooms;
pub mod token;

pub use args::*;
pub use catalog::handle_catalog_command;
pub use recording::handle_recording_command;
pub use rooms::handle_rooms_command;
pub use token::handle_token_command;
