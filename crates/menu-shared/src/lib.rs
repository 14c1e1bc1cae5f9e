//! # Menu Shared
//! 
//! Configuration, telemetry, and constants shared by the menu synchronization crates.

pub mod constants;
pub mod telemetry;
pub mod config;
pub mod error;

pub use config::{AppConfig, PersistenceMode};
pub use error::AppError;
