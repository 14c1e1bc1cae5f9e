//! Repository traits (ports)

pub mod menu_repository;

pub use menu_repository::{MenuRepository, MenuTransaction, MenuWriter};

#[cfg(test)]
pub use menu_repository::MockMenuWriter;
