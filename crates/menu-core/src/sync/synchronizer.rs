// ============================================================================
// Menu Core - Synchronizer
// File: crates/menu-core/src/sync/synchronizer.rs
// ============================================================================
//! Diff a submitted menu tree against the persisted tree

use tracing::debug;

use super::merge::{merge_walk, Step};
use crate::domain::{
    ChangeSet, MenuLevel, PersistedRootMenu, PersistedSubMenu, RootMenu, SubMenu, SubMenuParent,
};
use crate::error::DomainError;

/// Pure reconciliation: no I/O, no state between calls.
pub struct MenuSynchronizer;

impl MenuSynchronizer {
    /// Classify every difference between `submitted` and `persisted`.
    ///
    /// Children of a removed main menu are queued for deletion before the main menu
    /// itself; children of a new main menu reference it by its insert slot.
    pub fn reconcile(
        submitted: &[RootMenu],
        persisted: &[PersistedRootMenu],
    ) -> Result<ChangeSet, DomainError> {
        let mut changes = ChangeSet::new();

        merge_walk(submitted, persisted, |step| match step {
            Step::Create(menu) => {
                let slot = changes.insert_root(&menu.name, menu.list_order);
                reconcile_sub_menus(
                    &menu.children,
                    &[],
                    SubMenuParent::PendingRoot(slot),
                    &mut changes,
                )
            }
            Step::Matched { submitted, persisted } => {
                if submitted.name != persisted.name
                    || submitted.list_order != persisted.list_order
                {
                    changes.update(
                        persisted.id,
                        MenuLevel::Main,
                        &submitted.name,
                        submitted.list_order,
                    );
                }
                reconcile_sub_menus(
                    &submitted.children,
                    &persisted.children,
                    SubMenuParent::Existing(persisted.id),
                    &mut changes,
                )
            }
            Step::Remove(menu) => {
                for child in &menu.children {
                    changes.delete_sub(child.id);
                }
                changes.delete_main(menu.id);
                Ok(())
            }
        })?;

        debug!(
            "Reconciled menus: {} inserts, {} updates, {} sub deletes, {} main deletes",
            changes.inserts().len(),
            changes.updates().len(),
            changes.sub_deletes().len(),
            changes.main_deletes().len()
        );

        Ok(changes)
    }
}

fn reconcile_sub_menus(
    submitted: &[SubMenu],
    persisted: &[PersistedSubMenu],
    parent: SubMenuParent,
    changes: &mut ChangeSet,
) -> Result<(), DomainError> {
    merge_walk(submitted, persisted, |step| {
        match step {
            Step::Create(menu) => changes.insert_sub(parent, &menu.name, menu.list_order),
            Step::Matched { submitted, persisted } => {
                if submitted.name != persisted.name
                    || submitted.list_order != persisted.list_order
                {
                    changes.update(
                        persisted.id,
                        MenuLevel::Sub,
                        &submitted.name,
                        submitted.list_order,
                    );
                }
            }
            Step::Remove(menu) => changes.delete_sub(menu.id),
        }
        Ok(())
    })
}
