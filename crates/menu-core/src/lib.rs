//! # Menu Core
//! 
//! Menu tree types, the reconciliation walk, repository traits, and persistence strategies.

pub mod domain;
pub mod sync;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::{DomainError, ErrorCategory};
pub use sync::MenuSynchronizer;
