//! Menu repository traits (ports)

use async_trait::async_trait;

use crate::domain::{MenuId, MenuUpdate, NewMenuRow, PersistedRootMenu};
use crate::error::DomainError;

/// Opens units of work against menu storage
#[async_trait]
pub trait MenuRepository: Send + Sync {
    type Transaction: MenuTransaction;

    async fn begin(&self) -> Result<Self::Transaction, DomainError>;
}

/// A unit of work. Dropping it without [`MenuTransaction::commit`] rolls back.
#[async_trait]
pub trait MenuTransaction: MenuWriter + Sized {
    async fn commit(self) -> Result<(), DomainError>;
}

/// Reads and writes available inside one unit of work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuWriter: Send {
    /// Root menus then their children, each level ordered by `list_order`
    async fn load_existing_tree(&mut self) -> Result<Vec<PersistedRootMenu>, DomainError>;

    /// Insert one batch and return the generated ids in row order
    async fn bulk_insert(&mut self, rows: &[NewMenuRow]) -> Result<Vec<MenuId>, DomainError>;

    async fn bulk_update(&mut self, updates: &[MenuUpdate]) -> Result<u64, DomainError>;

    /// Ids that no longer exist are skipped, not reported
    async fn delete_by_ids(&mut self, ids: &[MenuId]) -> Result<u64, DomainError>;

    async fn save_single(&mut self, row: &NewMenuRow) -> Result<MenuId, DomainError>;

    async fn update_single(&mut self, update: &MenuUpdate) -> Result<(), DomainError>;

    /// Returns whether a row was removed
    async fn delete_single(&mut self, id: MenuId) -> Result<bool, DomainError>;
}
