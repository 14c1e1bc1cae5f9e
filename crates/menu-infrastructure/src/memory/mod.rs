//! In-memory menu storage.
//!
//! Mirrors the `menu` table rules: ids come from a counter, a sub menu must point
//! at an existing main menu, and a main menu cannot be removed while rows still
//! reference it. One transaction holds the table lock and works on a staged copy,
//! so a dropped transaction leaves the table untouched.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use menu_core::domain::{
    assemble_tree, MenuId, MenuRecord, MenuUpdate, NewMenuRow, PersistedRootMenu,
};
use menu_core::error::DomainError;
use menu_core::repositories::{MenuRepository, MenuTransaction, MenuWriter};

#[derive(Debug, Clone, Default)]
struct MenuTable {
    rows: BTreeMap<MenuId, MenuRecord>,
    last_id: MenuId,
}

impl MenuTable {
    fn check_parent(&self, parent_id: Option<MenuId>) -> Result<(), DomainError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };

        match self.rows.get(&parent_id) {
            Some(parent) if parent.parent_id.is_none() => Ok(()),
            Some(_) => Err(DomainError::ConstraintViolation(format!(
                "menu {} is a sub menu and cannot have children",
                parent_id
            ))),
            None => Err(DomainError::ConstraintViolation(format!(
                "parent menu {} does not exist",
                parent_id
            ))),
        }
    }

    fn insert(&mut self, row: &NewMenuRow) -> MenuId {
        self.last_id += 1;
        let id = self.last_id;
        self.rows.insert(
            id,
            MenuRecord {
                id,
                parent_id: row.parent_id,
                name: row.name.clone(),
                list_order: row.list_order,
            },
        );
        id
    }

    fn update(&mut self, update: &MenuUpdate) -> bool {
        match self.rows.get_mut(&update.id) {
            Some(record) => {
                record.name = update.name.clone();
                record.list_order = update.list_order;
                true
            }
            None => false,
        }
    }

    fn delete(&mut self, ids: &[MenuId]) -> Result<u64, DomainError> {
        let doomed: HashSet<MenuId> = ids.iter().copied().collect();

        let orphan = self.rows.values().find(|record| {
            !doomed.contains(&record.id)
                && record.parent_id.is_some_and(|parent| doomed.contains(&parent))
        });
        if let Some(orphan) = orphan {
            return Err(DomainError::ConstraintViolation(format!(
                "menu {} still references parent {}",
                orphan.id,
                orphan.parent_id.unwrap_or_default()
            )));
        }

        let removed = doomed
            .iter()
            .filter(|id| self.rows.remove(*id).is_some())
            .count();
        Ok(removed as u64)
    }
}

/// Menu storage kept in process memory, shared by clones.
#[derive(Clone, Default)]
pub struct InMemoryMenuRepository {
    table: Arc<Mutex<MenuTable>>,
    write_limit: Option<usize>,
}

impl InMemoryMenuRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository whose transactions fail every write after the first `limit`.
    pub fn failing_after(limit: usize) -> Self {
        Self {
            table: Arc::default(),
            write_limit: Some(limit),
        }
    }

    /// Committed rows ordered by id
    pub async fn records(&self) -> Vec<MenuRecord> {
        self.table.lock().await.rows.values().cloned().collect()
    }
}

#[async_trait]
impl MenuRepository for InMemoryMenuRepository {
    type Transaction = InMemoryMenuTransaction;

    async fn begin(&self) -> Result<InMemoryMenuTransaction, DomainError> {
        let guard = Arc::clone(&self.table).lock_owned().await;
        let staged = guard.clone();

        Ok(InMemoryMenuTransaction {
            guard,
            staged,
            writes_left: self.write_limit,
        })
    }
}

pub struct InMemoryMenuTransaction {
    guard: OwnedMutexGuard<MenuTable>,
    staged: MenuTable,
    writes_left: Option<usize>,
}

impl InMemoryMenuTransaction {
    fn spend_write(&mut self) -> Result<(), DomainError> {
        match self.writes_left.as_mut() {
            Some(0) => Err(DomainError::DatabaseError(
                "write limit reached".to_string(),
            )),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MenuTransaction for InMemoryMenuTransaction {
    async fn commit(self) -> Result<(), DomainError> {
        let InMemoryMenuTransaction {
            mut guard, staged, ..
        } = self;
        debug!("Committing {} menu rows", staged.rows.len());
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl MenuWriter for InMemoryMenuTransaction {
    async fn load_existing_tree(&mut self) -> Result<Vec<PersistedRootMenu>, DomainError> {
        assemble_tree(self.staged.rows.values().cloned().collect())
    }

    async fn bulk_insert(&mut self, rows: &[NewMenuRow]) -> Result<Vec<MenuId>, DomainError> {
        self.spend_write()?;
        for row in rows {
            self.staged.check_parent(row.parent_id)?;
        }
        Ok(rows.iter().map(|row| self.staged.insert(row)).collect())
    }

    async fn bulk_update(&mut self, updates: &[MenuUpdate]) -> Result<u64, DomainError> {
        self.spend_write()?;
        let updated = updates
            .iter()
            .filter(|update| self.staged.update(update))
            .count();
        Ok(updated as u64)
    }

    async fn delete_by_ids(&mut self, ids: &[MenuId]) -> Result<u64, DomainError> {
        self.spend_write()?;
        self.staged.delete(ids)
    }

    async fn save_single(&mut self, row: &NewMenuRow) -> Result<MenuId, DomainError> {
        self.spend_write()?;
        self.staged.check_parent(row.parent_id)?;
        Ok(self.staged.insert(row))
    }

    async fn update_single(&mut self, update: &MenuUpdate) -> Result<(), DomainError> {
        self.spend_write()?;
        self.staged.update(update);
        Ok(())
    }

    async fn delete_single(&mut self, id: MenuId) -> Result<bool, DomainError> {
        self.spend_write()?;
        Ok(self.staged.delete(&[id])? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(parent_id: Option<MenuId>, name: &str, list_order: i32) -> NewMenuRow {
        NewMenuRow {
            parent_id,
            name: name.to_string(),
            list_order,
        }
    }

    #[tokio::test]
    async fn test_batch_ids_are_contiguous_and_in_row_order() {
        let repo = InMemoryMenuRepository::new();
        let mut tx = repo.begin().await.unwrap();

        let ids = tx
            .bulk_insert(&[row(None, "1. Menu", 1), row(None, "2. Menu", 2)])
            .await
            .unwrap();
        let child = tx.save_single(&row(Some(ids[0]), "1-1. Menu", 1)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(ids, vec![1, 2]);
        assert_eq!(child, 3);
        assert_eq!(repo.records().await[2].parent_id, Some(1));
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let repo = InMemoryMenuRepository::new();
        {
            let mut tx = repo.begin().await.unwrap();
            tx.save_single(&row(None, "1. Menu", 1)).await.unwrap();
        }

        assert!(repo.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_parent_must_exist_and_be_a_main_menu() {
        let repo = InMemoryMenuRepository::new();
        let mut tx = repo.begin().await.unwrap();

        let missing = tx.save_single(&row(Some(99), "orphan", 1)).await;
        assert!(matches!(missing, Err(DomainError::ConstraintViolation(_))));

        let root = tx.save_single(&row(None, "1. Menu", 1)).await.unwrap();
        let sub = tx.save_single(&row(Some(root), "1-1. Menu", 1)).await.unwrap();
        let too_deep = tx.bulk_insert(&[row(Some(sub), "1-1-1. Menu", 1)]).await;
        assert!(matches!(too_deep, Err(DomainError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_main_menu_with_children_cannot_be_deleted_alone() {
        let repo = InMemoryMenuRepository::new();
        let mut tx = repo.begin().await.unwrap();
        let root = tx.save_single(&row(None, "1. Menu", 1)).await.unwrap();
        let sub = tx.save_single(&row(Some(root), "1-1. Menu", 1)).await.unwrap();

        let result = tx.delete_single(root).await;
        assert!(matches!(result, Err(DomainError::ConstraintViolation(_))));

        assert_eq!(tx.delete_by_ids(&[sub]).await.unwrap(), 1);
        assert!(tx.delete_single(root).await.unwrap());
        assert!(!tx.delete_single(root).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_missing_ids_is_not_an_error() {
        let repo = InMemoryMenuRepository::new();
        let mut tx = repo.begin().await.unwrap();

        assert_eq!(tx.delete_by_ids(&[1, 2, 3]).await.unwrap(), 0);

        let root = tx.save_single(&row(None, "1. Menu", 1)).await.unwrap();
        assert_eq!(tx.delete_by_ids(&[root, 99]).await.unwrap(), 1);
        assert_eq!(tx.delete_by_ids(&[root]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_limit_fails_later_writes() {
        let repo = InMemoryMenuRepository::failing_after(1);
        let mut tx = repo.begin().await.unwrap();

        assert!(tx.save_single(&row(None, "1. Menu", 1)).await.is_ok());
        let result = tx.save_single(&row(None, "2. Menu", 2)).await;
        assert!(matches!(result, Err(DomainError::DatabaseError(_))));
    }
}
