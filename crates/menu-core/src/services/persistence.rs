// ============================================================================
// Menu Core - Persistence Strategies
// File: crates/menu-core/src/services/persistence.rs
// ============================================================================
//! Row-by-row and batched execution of a change set

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info};

use menu_shared::PersistenceMode;

use crate::domain::{ChangeSet, InsertParent, MenuId, MenuLevel, MenuUpdate, NewMenuRow};
use crate::error::DomainError;
use crate::repositories::MenuWriter;

/// Rows touched by one applied change set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub inserted: usize,
    pub updated: u64,
    pub deleted: u64,
}

/// Writes a [`ChangeSet`] through an open unit of work.
///
/// Order is always inserts, then updates, then sub menu deletes, then main menu
/// deletes. The first failing statement aborts the call; the caller drops the
/// transaction to roll back.
#[async_trait]
pub trait PersistenceStrategy: Send + Sync {
    fn mode(&self) -> PersistenceMode;

    async fn apply<W>(&self, writer: &mut W, changes: ChangeSet) -> Result<ApplyReport, DomainError>
    where
        W: MenuWriter + ?Sized;
}

/// One statement per row; a new main menu's id is known before its children are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalStrategy;

/// One statement per operation type and tree level.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkStrategy;

#[async_trait]
impl PersistenceStrategy for IncrementalStrategy {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::Incremental
    }

    async fn apply<W>(&self, writer: &mut W, changes: ChangeSet) -> Result<ApplyReport, DomainError>
    where
        W: MenuWriter + ?Sized,
    {
        info!(
            "Applying menu changes row by row: {} inserts, {} updates, {} deletes",
            changes.inserts().len(),
            changes.updates().len(),
            changes.delete_count()
        );

        let mut report = ApplyReport::default();
        let mut root_ids: Vec<MenuId> = Vec::with_capacity(changes.pending_roots());

        for insert in changes.inserts() {
            let row = NewMenuRow {
                parent_id: resolve_parent(insert.parent, &root_ids)?,
                name: insert.name.clone(),
                list_order: insert.list_order,
            };
            let id = writer.save_single(&row).await?;
            debug!("Inserted menu {} ({})", id, row.name);

            if insert.parent == InsertParent::Root {
                root_ids.push(id);
            }
            report.inserted += 1;
        }

        for update in changes.updates() {
            writer.update_single(update).await?;
            report.updated += 1;
        }

        report.deleted = delete_children_then_parents(writer, &changes).await?;

        Ok(report)
    }
}

#[async_trait]
impl PersistenceStrategy for BulkStrategy {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::Bulk
    }

    async fn apply<W>(&self, writer: &mut W, changes: ChangeSet) -> Result<ApplyReport, DomainError>
    where
        W: MenuWriter + ?Sized,
    {
        info!(
            "Applying menu changes in batches: {} inserts, {} updates, {} deletes",
            changes.inserts().len(),
            changes.updates().len(),
            changes.delete_count()
        );

        let mut report = ApplyReport::default();

        let roots: Vec<NewMenuRow> = changes
            .main_inserts()
            .map(|insert| NewMenuRow {
                parent_id: None,
                name: insert.name.clone(),
                list_order: insert.list_order,
            })
            .collect();
        let root_ids = insert_batch(writer, &roots).await?;
        report.inserted += root_ids.len();

        let subs: Vec<NewMenuRow> = changes
            .sub_inserts()
            .map(|insert| {
                Ok(NewMenuRow {
                    parent_id: resolve_parent(insert.parent, &root_ids)?,
                    name: insert.name.clone(),
                    list_order: insert.list_order,
                })
            })
            .collect::<Result<_, DomainError>>()?;
        report.inserted += insert_batch(writer, &subs).await?.len();

        for level in [MenuLevel::Main, MenuLevel::Sub] {
            let batch: Vec<MenuUpdate> = changes.updates_at(level).cloned().collect();
            if !batch.is_empty() {
                debug!("Updating {} {:?} menus in one batch", batch.len(), level);
                report.updated += writer.bulk_update(&batch).await?;
            }
        }

        report.deleted = delete_children_then_parents(writer, &changes).await?;

        Ok(report)
    }
}

/// Insert one batch and insist on one returned id per row.
async fn insert_batch<W>(writer: &mut W, rows: &[NewMenuRow]) -> Result<Vec<MenuId>, DomainError>
where
    W: MenuWriter + ?Sized,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids = writer.bulk_insert(rows).await?;
    if ids.len() != rows.len() {
        error!(
            "Batch insert returned {} ids for {} rows; refusing to derive parent ids",
            ids.len(),
            rows.len()
        );
        return Err(DomainError::IdInferenceViolation {
            expected: rows.len(),
            actual: ids.len(),
        });
    }

    debug!("Inserted {} menus in one batch", ids.len());
    Ok(ids)
}

async fn delete_children_then_parents<W>(
    writer: &mut W,
    changes: &ChangeSet,
) -> Result<u64, DomainError>
where
    W: MenuWriter + ?Sized,
{
    let mut deleted = 0;

    if !changes.sub_deletes().is_empty() {
        deleted += writer.delete_by_ids(changes.sub_deletes()).await?;
    }
    if !changes.main_deletes().is_empty() {
        deleted += writer.delete_by_ids(changes.main_deletes()).await?;
    }

    Ok(deleted)
}

fn resolve_parent(
    parent: InsertParent,
    root_ids: &[MenuId],
) -> Result<Option<MenuId>, DomainError> {
    match parent {
        InsertParent::Root => Ok(None),
        InsertParent::Existing(id) => Ok(Some(id)),
        InsertParent::PendingRoot(slot) => root_ids.get(slot).copied().map(Some).ok_or(
            DomainError::IdInferenceViolation {
                expected: slot + 1,
                actual: root_ids.len(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PersistedRootMenu, PersistedSubMenu, RootMenu, SubMenu, SubMenuParent};
    use crate::repositories::MockMenuWriter;
    use crate::sync::MenuSynchronizer;
    use mockall::Sequence;

    fn creation_changes() -> ChangeSet {
        let submitted = vec![
            RootMenu::new(None, "1. Menu", 1, vec![SubMenu::new(None, "1-1. Menu", 1)]),
            RootMenu::new(None, "2. Menu", 2, vec![]),
        ];
        MenuSynchronizer::reconcile(&submitted, &[]).unwrap()
    }

    fn mixed_changes() -> ChangeSet {
        let persisted = vec![
            PersistedRootMenu {
                id: 1,
                name: "1. Menu".to_string(),
                list_order: 1,
                children: vec![PersistedSubMenu {
                    id: 3,
                    name: "1-1. Menu".to_string(),
                    list_order: 1,
                }],
            },
            PersistedRootMenu {
                id: 2,
                name: "2. Menu".to_string(),
                list_order: 2,
                children: vec![PersistedSubMenu {
                    id: 4,
                    name: "2-1. Menu".to_string(),
                    list_order: 1,
                }],
            },
        ];
        let submitted = vec![RootMenu::new(
            Some(1),
            "1. Menu renamed",
            1,
            vec![SubMenu::new(Some(3), "1-1. Menu", 2)],
        )];
        MenuSynchronizer::reconcile(&submitted, &persisted).unwrap()
    }

    #[tokio::test]
    async fn test_bulk_inserts_children_with_returned_parent_ids() {
        let mut writer = MockMenuWriter::new();
        let mut seq = Sequence::new();

        writer
            .expect_bulk_insert()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|rows| rows.len() == 2 && rows.iter().all(|row| row.parent_id.is_none()))
            .returning(|_| Ok(vec![100, 101]));
        writer
            .expect_bulk_insert()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|rows| {
                rows.len() == 1 && rows[0].parent_id == Some(100) && rows[0].name == "1-1. Menu"
            })
            .returning(|_| Ok(vec![102]));

        let report = BulkStrategy.apply(&mut writer, creation_changes()).await.unwrap();

        assert_eq!(report.inserted, 3);
        assert_eq!(report.updated, 0);
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn test_bulk_rejects_short_id_list() {
        let mut writer = MockMenuWriter::new();
        writer
            .expect_bulk_insert()
            .times(1)
            .returning(|_| Ok(vec![100]));

        let result = BulkStrategy.apply(&mut writer, creation_changes()).await;

        assert!(matches!(
            result,
            Err(DomainError::IdInferenceViolation { expected: 2, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn test_bulk_updates_per_level_then_deletes_children_first() {
        let mut writer = MockMenuWriter::new();
        let mut seq = Sequence::new();

        writer
            .expect_bulk_update()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|updates| {
                updates.len() == 1 && updates[0].id == 1 && updates[0].level == MenuLevel::Main
            })
            .returning(|updates| Ok(updates.len() as u64));
        writer
            .expect_bulk_update()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|updates| updates.len() == 1 && updates[0].id == 3 && updates[0].list_order == 2)
            .returning(|updates| Ok(updates.len() as u64));
        writer
            .expect_delete_by_ids()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|ids| ids.to_vec() == vec![4])
            .returning(|ids| Ok(ids.len() as u64));
        writer
            .expect_delete_by_ids()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|ids| ids.to_vec() == vec![2])
            .returning(|ids| Ok(ids.len() as u64));

        let report = BulkStrategy.apply(&mut writer, mixed_changes()).await.unwrap();

        assert_eq!(report, ApplyReport { inserted: 0, updated: 2, deleted: 2 });
    }

    #[tokio::test]
    async fn test_incremental_saves_root_before_children() {
        let mut writer = MockMenuWriter::new();
        let mut seq = Sequence::new();

        writer
            .expect_save_single()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|row| row.parent_id.is_none() && row.name == "1. Menu")
            .returning(|_| Ok(10));
        writer
            .expect_save_single()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|row| row.parent_id == Some(10) && row.name == "1-1. Menu")
            .returning(|_| Ok(11));
        writer
            .expect_save_single()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|row| row.parent_id.is_none() && row.name == "2. Menu")
            .returning(|_| Ok(12));

        let report = IncrementalStrategy.apply(&mut writer, creation_changes()).await.unwrap();

        assert_eq!(report.inserted, 3);
    }

    #[tokio::test]
    async fn test_incremental_updates_each_row_then_deletes() {
        let mut writer = MockMenuWriter::new();
        let mut seq = Sequence::new();

        writer
            .expect_update_single()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        writer
            .expect_delete_by_ids()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|ids| ids.to_vec() == vec![4])
            .returning(|_| Ok(1));
        writer
            .expect_delete_by_ids()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|ids| ids.to_vec() == vec![2])
            .returning(|_| Ok(1));

        let report = IncrementalStrategy.apply(&mut writer, mixed_changes()).await.unwrap();

        assert_eq!(report, ApplyReport { inserted: 0, updated: 2, deleted: 2 });
    }

    #[tokio::test]
    async fn test_sub_insert_queued_first_does_not_shift_root_slots() {
        let mut changes = ChangeSet::new();
        changes.insert_sub(SubMenuParent::Existing(7), "7-1. Menu", 1);
        let slot = changes.insert_root("1. Menu", 1);
        changes.insert_sub(SubMenuParent::PendingRoot(slot), "1-1. Menu", 1);
        assert_eq!(changes.pending_roots(), 1);

        let mut writer = MockMenuWriter::new();
        let mut seq = Sequence::new();
        writer
            .expect_save_single()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|row| row.parent_id == Some(7) && row.name == "7-1. Menu")
            .returning(|_| Ok(101));
        writer
            .expect_save_single()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|row| row.parent_id.is_none() && row.name == "1. Menu")
            .returning(|_| Ok(102));
        writer
            .expect_save_single()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|row| row.parent_id == Some(102) && row.name == "1-1. Menu")
            .returning(|_| Ok(103));

        let report = IncrementalStrategy.apply(&mut writer, changes.clone()).await.unwrap();
        assert_eq!(report.inserted, 3);

        let mut writer = MockMenuWriter::new();
        let mut seq = Sequence::new();
        writer
            .expect_bulk_insert()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|rows| rows.len() == 1 && rows[0].name == "1. Menu")
            .returning(|_| Ok(vec![102]));
        writer
            .expect_bulk_insert()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|rows| {
                rows.len() == 2 && rows[0].parent_id == Some(7) && rows[1].parent_id == Some(102)
            })
            .returning(|_| Ok(vec![101, 103]));

        let report = BulkStrategy.apply(&mut writer, changes).await.unwrap();
        assert_eq!(report.inserted, 3);
    }

    #[tokio::test]
    async fn test_incremental_stops_at_first_failure() {
        let mut writer = MockMenuWriter::new();
        writer
            .expect_save_single()
            .times(1)
            .returning(|_| Err(DomainError::DatabaseError("connection reset".to_string())));

        let result = IncrementalStrategy.apply(&mut writer, creation_changes()).await;

        assert!(matches!(result, Err(DomainError::DatabaseError(_))));
    }

    #[test]
    fn test_resolve_parent() {
        assert_eq!(resolve_parent(InsertParent::Root, &[]).unwrap(), None);
        assert_eq!(resolve_parent(InsertParent::Existing(7), &[]).unwrap(), Some(7));
        assert_eq!(resolve_parent(InsertParent::PendingRoot(1), &[20, 21]).unwrap(), Some(21));
        assert!(resolve_parent(InsertParent::PendingRoot(2), &[20, 21]).is_err());
    }
}
