//! # Menu Core - Domain Module
//! 
//! Menu tree shapes and the change set produced by one reconciliation.

pub mod menu;
pub mod change_set;

pub use menu::{
    assemble_tree, into_menu_tree, MenuId, MenuNode, MenuRecord, PersistedRootMenu,
    PersistedSubMenu, RootMenu, SubMenu,
};
pub use change_set::{
    ChangeSet, InsertParent, MenuInsert, MenuLevel, MenuUpdate, NewMenuRow, SubMenuParent,
};
