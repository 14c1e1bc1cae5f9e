// ============================================================================
// Menu Core - Menu Service
// File: crates/menu-core/src/services/menu_service.rs
// ============================================================================
//! Load, reconcile, and persist the menu tree inside one transaction

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use menu_shared::PersistenceMode;

use crate::domain::{ChangeSet, MenuId, PersistedRootMenu, RootMenu};
use crate::error::DomainError;
use crate::repositories::{MenuRepository, MenuTransaction, MenuWriter};
use crate::services::persistence::{ApplyReport, PersistenceStrategy};
use crate::sync::MenuSynchronizer;

/// Menu tree service, generic over storage and the way change sets are written
pub struct MenuService<R: MenuRepository, S: PersistenceStrategy> {
    menu_repo: Arc<R>,
    strategy: S,
}

impl<R: MenuRepository, S: PersistenceStrategy> MenuService<R, S> {
    pub fn new(menu_repo: Arc<R>, strategy: S) -> Self {
        Self { menu_repo, strategy }
    }

    pub fn mode(&self) -> PersistenceMode {
        self.strategy.mode()
    }

    /// Current tree, main menus then sub menus, ordered by list order
    pub async fn get_menus(&self) -> Result<Vec<PersistedRootMenu>, DomainError> {
        let mut tx = self.menu_repo.begin().await?;
        let menus = tx.load_existing_tree().await?;
        tx.commit().await?;
        Ok(menus)
    }

    /// Make storage match `submitted`.
    ///
    /// Load, diff, and writes share one transaction; any error drops it unapplied.
    pub async fn change_menus(&self, submitted: Vec<RootMenu>) -> Result<ApplyReport, DomainError> {
        info!(
            "Menu change requested: {} main menus ({} mode)",
            submitted.len(),
            self.strategy.mode().as_str()
        );

        validate_submission(&submitted)?;

        let mut tx = self.menu_repo.begin().await?;
        let persisted = tx.load_existing_tree().await?;

        let changes = MenuSynchronizer::reconcile(&submitted, &persisted).map_err(|e| {
            warn!("Menu submission rejected: {}", e);
            e
        })?;

        if changes.is_empty() {
            info!("Menus already match the submission");
            tx.commit().await?;
            return Ok(ApplyReport::default());
        }

        let report = self.strategy.apply(&mut tx, changes).await?;
        tx.commit().await?;

        info!(
            "Menus synchronized: {} inserted, {} updated, {} deleted",
            report.inserted, report.updated, report.deleted
        );
        Ok(report)
    }

    /// Reconcile without writing anything
    pub async fn preview(&self, submitted: &[RootMenu]) -> Result<ChangeSet, DomainError> {
        validate_submission(submitted)?;

        let mut tx = self.menu_repo.begin().await?;
        let persisted = tx.load_existing_tree().await?;

        MenuSynchronizer::reconcile(submitted, &persisted)
    }

    /// Delete one menu. A main menu takes its sub menus with it.
    pub async fn remove_menu(&self, id: MenuId) -> Result<(), DomainError> {
        info!("Removing menu {}", id);

        let mut tx = self.menu_repo.begin().await?;
        let tree = tx.load_existing_tree().await?;

        if let Some(root) = tree.iter().find(|menu| menu.id == id) {
            let children: Vec<MenuId> = root.children.iter().map(|child| child.id).collect();
            if !children.is_empty() {
                tx.delete_by_ids(&children).await?;
            }
        } else if !tree
            .iter()
            .flat_map(|menu| menu.children.iter())
            .any(|child| child.id == id)
        {
            warn!("Menu {} does not exist", id);
            return Err(DomainError::MenuNotFound(id));
        }

        if !tx.delete_single(id).await? {
            return Err(DomainError::MenuNotFound(id));
        }

        tx.commit().await
    }
}

fn validate_submission(submitted: &[RootMenu]) -> Result<(), DomainError> {
    for menu in submitted {
        menu.validate().map_err(|e| {
            warn!("Menu submission failed validation: {}", e);
            DomainError::from(e)
        })?;
    }
    Ok(())
}
