//! # Menu Infrastructure
//! 
//! Storage adapters for the menu repository ports.

pub mod database;
pub mod memory;

pub use database::{create_pool, run_migrations, PgMenuRepository, PgMenuTransaction};
pub use memory::{InMemoryMenuRepository, InMemoryMenuTransaction};
