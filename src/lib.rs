pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod global;
pub mod recording;
pub mod token;
pub mod transport;

pub use error::{GatewayError, GatewayResult};
