//! Reconciliation of a submitted menu tree against the persisted one

mod merge;
pub mod synchronizer;

pub use synchronizer::MenuSynchronizer;
