// ============================================================================
// Menu Core - Change Set
// File: crates/menu-core/src/domain/change_set.rs
// Description: Inserts, updates, and deletes discovered by one reconciliation
// ============================================================================

use serde::Serialize;

use super::menu::MenuId;

/// Tree level of a menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuLevel {
    Main,
    Sub,
}

/// Where a new menu hangs in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum InsertParent {
    /// New main menu
    Root,
    /// Child of a main menu created in the same change set, by its position among
    /// the main menu inserts
    PendingRoot(usize),
    /// Child of a main menu that already exists
    Existing(MenuId),
}

/// Parent of a new sub menu. Has no root variant, so a sub insert cannot be
/// mistaken for a main menu insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubMenuParent {
    PendingRoot(usize),
    Existing(MenuId),
}

impl From<SubMenuParent> for InsertParent {
    fn from(parent: SubMenuParent) -> Self {
        match parent {
            SubMenuParent::PendingRoot(slot) => InsertParent::PendingRoot(slot),
            SubMenuParent::Existing(id) => InsertParent::Existing(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuInsert {
    pub parent: InsertParent,
    pub name: String,
    pub list_order: i32,
}

impl MenuInsert {
    pub fn level(&self) -> MenuLevel {
        match self.parent {
            InsertParent::Root => MenuLevel::Main,
            InsertParent::PendingRoot(_) | InsertParent::Existing(_) => MenuLevel::Sub,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuUpdate {
    pub id: MenuId,
    pub level: MenuLevel,
    pub name: String,
    pub list_order: i32,
}

/// Row handed to storage once the parent id is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMenuRow {
    pub parent_id: Option<MenuId>,
    pub name: String,
    pub list_order: i32,
}

/// Operations needed to turn the persisted tree into the submitted one.
///
/// Built once per reconciliation and consumed once by a persistence strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    to_insert: Vec<MenuInsert>,
    to_update: Vec<MenuUpdate>,
    sub_deletes: Vec<MenuId>,
    main_deletes: Vec<MenuId>,
    #[serde(skip)]
    pending_roots: usize,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a new main menu and return its slot for children to reference.
    pub fn insert_root(&mut self, name: &str, list_order: i32) -> usize {
        let slot = self.pending_roots;
        self.pending_roots += 1;
        self.to_insert.push(MenuInsert {
            parent: InsertParent::Root,
            name: name.to_string(),
            list_order,
        });
        slot
    }

    pub fn insert_sub(&mut self, parent: SubMenuParent, name: &str, list_order: i32) {
        self.to_insert.push(MenuInsert {
            parent: parent.into(),
            name: name.to_string(),
            list_order,
        });
    }

    pub fn update(&mut self, id: MenuId, level: MenuLevel, name: &str, list_order: i32) {
        self.to_update.push(MenuUpdate {
            id,
            level,
            name: name.to_string(),
            list_order,
        });
    }

    pub fn delete_sub(&mut self, id: MenuId) {
        self.sub_deletes.push(id);
    }

    pub fn delete_main(&mut self, id: MenuId) {
        self.main_deletes.push(id);
    }

    pub fn inserts(&self) -> &[MenuInsert] {
        &self.to_insert
    }

    pub fn main_inserts(&self) -> impl Iterator<Item = &MenuInsert> {
        self.to_insert.iter().filter(|insert| insert.level() == MenuLevel::Main)
    }

    pub fn sub_inserts(&self) -> impl Iterator<Item = &MenuInsert> {
        self.to_insert.iter().filter(|insert| insert.level() == MenuLevel::Sub)
    }

    pub fn updates(&self) -> &[MenuUpdate] {
        &self.to_update
    }

    pub fn updates_at(&self, level: MenuLevel) -> impl Iterator<Item = &MenuUpdate> {
        self.to_update.iter().filter(move |update| update.level == level)
    }

    pub fn sub_deletes(&self) -> &[MenuId] {
        &self.sub_deletes
    }

    pub fn main_deletes(&self) -> &[MenuId] {
        &self.main_deletes
    }

    /// Number of main menu inserts, i.e. the size of the first insert batch
    pub fn pending_roots(&self) -> usize {
        self.pending_roots
    }

    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty()
            && self.to_update.is_empty()
            && self.sub_deletes.is_empty()
            && self.main_deletes.is_empty()
    }

    pub fn delete_count(&self) -> usize {
        self.sub_deletes.len() + self.main_deletes.len()
    }
}
