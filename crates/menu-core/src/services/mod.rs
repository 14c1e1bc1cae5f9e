//! Domain services (business logic)

pub mod persistence;
pub mod menu_service;

pub use persistence::{ApplyReport, BulkStrategy, IncrementalStrategy, PersistenceStrategy};
pub use menu_service::MenuService;
