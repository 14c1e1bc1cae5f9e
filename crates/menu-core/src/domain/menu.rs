// ============================================================================
// Menu Core - Menu Tree Entities
// File: crates/menu-core/src/domain/menu.rs
// Description: Submitted and persisted shapes of the two-level menu tree
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;

pub type MenuId = i64;

/// Menu node as it arrives from a client.
///
/// The shape is recursive so that a malformed submission can be represented and
/// rejected; the reconciliation itself only ever sees [`RootMenu`] and [`SubMenu`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    #[serde(default)]
    pub id: Option<MenuId>,
    pub name: String,
    pub list_order: i32,
    #[serde(default)]
    pub children: Vec<MenuNode>,
}

/// Main menu. Only root menus carry children.
///
/// Built from a [`MenuNode`] so names are always trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RootMenu {
    pub id: Option<MenuId>,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Menu name must be between 1 and 100 characters"
    ))]
    pub name: String,

    pub list_order: i32,

    #[validate(nested)]
    pub children: Vec<SubMenu>,
}

/// Sub menu. Has no children field, so a third level cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubMenu {
    pub id: Option<MenuId>,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Menu name must be between 1 and 100 characters"
    ))]
    pub name: String,

    pub list_order: i32,
}

impl RootMenu {
    pub fn new(id: Option<MenuId>, name: &str, list_order: i32, children: Vec<SubMenu>) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            list_order,
            children,
        }
    }
}

impl SubMenu {
    pub fn new(id: Option<MenuId>, name: &str, list_order: i32) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            list_order,
        }
    }
}

impl TryFrom<MenuNode> for RootMenu {
    type Error = DomainError;

    fn try_from(node: MenuNode) -> Result<Self, Self::Error> {
        let children = node
            .children
            .into_iter()
            .map(SubMenu::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RootMenu::new(node.id, &node.name, node.list_order, children))
    }
}

impl TryFrom<MenuNode> for SubMenu {
    type Error = DomainError;

    fn try_from(node: MenuNode) -> Result<Self, Self::Error> {
        if !node.children.is_empty() {
            return Err(DomainError::MenuDepthExceeded {
                name: node.name.trim().to_string(),
            });
        }

        Ok(SubMenu::new(node.id, &node.name, node.list_order))
    }
}

/// Convert a submitted forest into the two-level tree, rejecting anything deeper.
pub fn into_menu_tree(nodes: Vec<MenuNode>) -> Result<Vec<RootMenu>, DomainError> {
    nodes.into_iter().map(RootMenu::try_from).collect()
}

/// Storage row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRecord {
    pub id: MenuId,
    pub parent_id: Option<MenuId>,
    pub name: String,
    pub list_order: i32,
}

/// Root menu as loaded from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRootMenu {
    pub id: MenuId,
    pub name: String,
    pub list_order: i32,
    pub children: Vec<PersistedSubMenu>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSubMenu {
    pub id: MenuId,
    pub name: String,
    pub list_order: i32,
}

impl From<&PersistedRootMenu> for RootMenu {
    fn from(menu: &PersistedRootMenu) -> Self {
        RootMenu {
            id: Some(menu.id),
            name: menu.name.clone(),
            list_order: menu.list_order,
            children: menu.children.iter().map(SubMenu::from).collect(),
        }
    }
}

impl From<&PersistedSubMenu> for SubMenu {
    fn from(menu: &PersistedSubMenu) -> Self {
        SubMenu {
            id: Some(menu.id),
            name: menu.name.clone(),
            list_order: menu.list_order,
        }
    }
}

/// Group flat rows into root menus and their children, each level ordered by
/// `list_order` then `id`.
pub fn assemble_tree(records: Vec<MenuRecord>) -> Result<Vec<PersistedRootMenu>, DomainError> {
    let (roots, subs): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|record| record.parent_id.is_none());

    let mut tree: Vec<PersistedRootMenu> = roots
        .into_iter()
        .map(|record| PersistedRootMenu {
            id: record.id,
            name: record.name,
            list_order: record.list_order,
            children: Vec::new(),
        })
        .collect();

    let slots: HashMap<MenuId, usize> = tree
        .iter()
        .enumerate()
        .map(|(slot, root)| (root.id, slot))
        .collect();

    for record in subs {
        let Some(parent_id) = record.parent_id else {
            continue;
        };
        let slot = slots.get(&parent_id).copied().ok_or_else(|| {
            DomainError::CorruptMenuTree(format!(
                "menu {} references parent {} which is not a root menu",
                record.id, parent_id
            ))
        })?;
        tree[slot].children.push(PersistedSubMenu {
            id: record.id,
            name: record.name,
            list_order: record.list_order,
        });
    }

    tree.sort_by_key(|root| (root.list_order, root.id));
    for root in &mut tree {
        root.children.sort_by_key(|child| (child.list_order, child.id));
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: MenuId, parent_id: Option<MenuId>, name: &str, list_order: i32) -> MenuRecord {
        MenuRecord {
            id,
            parent_id,
            name: name.to_string(),
            list_order,
        }
    }

    #[test]
    fn test_deserialize_camel_case_submission() {
        let json = r#"[
            {"name": "1. Menu", "listOrder": 1, "children": [
                {"name": "1-1. Menu", "listOrder": 1}
            ]},
            {"id": 7, "name": "2. Menu", "listOrder": 2}
        ]"#;
        let nodes: Vec<MenuNode> = serde_json::from_str(json).unwrap();

        let tree = into_menu_tree(nodes).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, None);
        assert_eq!(tree[0].children[0].name, "1-1. Menu");
        assert_eq!(tree[1].id, Some(7));
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_json_names_are_trimmed_on_conversion() {
        let json = r#"[{"id": 3, "name": "  1. Menu ", "listOrder": 1,
            "children": [{"name": "\t1-1. Menu  ", "listOrder": 1}]}]"#;
        let nodes: Vec<MenuNode> = serde_json::from_str(json).unwrap();

        let tree = into_menu_tree(nodes).unwrap();
        assert_eq!(tree[0].name, "1. Menu");
        assert_eq!(tree[0].children[0].name, "1-1. Menu");
    }

    #[test]
    fn test_third_level_is_rejected() {
        let nodes = vec![MenuNode {
            id: None,
            name: "1. Menu".to_string(),
            list_order: 1,
            children: vec![MenuNode {
                id: None,
                name: "1-1. Menu".to_string(),
                list_order: 1,
                children: vec![MenuNode {
                    id: None,
                    name: "1-1-1. Menu".to_string(),
                    list_order: 1,
                    children: Vec::new(),
                }],
            }],
        }];

        match into_menu_tree(nodes) {
            Err(DomainError::MenuDepthExceeded { name }) => assert_eq!(name, "1-1. Menu"),
            other => panic!("expected depth violation, got {:?}", other),
        }
    }

    #[test]
    fn test_names_are_trimmed_and_validated() {
        let root = RootMenu::new(None, "  Dashboard  ", 1, vec![SubMenu::new(None, "   ", 1)]);
        assert_eq!(root.name, "Dashboard");
        assert!(root.validate().is_err());

        let root = RootMenu::new(None, "Dashboard", 1, vec![SubMenu::new(None, "Reports", 1)]);
        assert!(root.validate().is_ok());
    }

    #[test]
    fn test_assemble_tree_orders_by_list_order() {
        let tree = assemble_tree(vec![
            record(3, None, "3. Menu", 3),
            record(1, None, "1. Menu", 1),
            record(5, Some(1), "1-2. Menu", 2),
            record(4, Some(1), "1-1. Menu", 1),
            record(2, None, "2. Menu", 2),
            record(6, Some(2), "2-1. Menu", 1),
        ])
        .unwrap();

        let names: Vec<&str> = tree.iter().map(|root| root.name.as_str()).collect();
        assert_eq!(names, vec!["1. Menu", "2. Menu", "3. Menu"]);

        let children: Vec<&str> = tree[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, vec!["1-1. Menu", "1-2. Menu"]);
        assert_eq!(tree[1].children.len(), 1);
        assert!(tree[2].children.is_empty());
    }

    #[test]
    fn test_assemble_tree_rejects_grandchildren() {
        let result = assemble_tree(vec![
            record(1, None, "1. Menu", 1),
            record(2, Some(1), "1-1. Menu", 1),
            record(3, Some(2), "1-1-1. Menu", 1),
        ]);

        assert!(matches!(result, Err(DomainError::CorruptMenuTree(_))));
    }

    #[test]
    fn test_persisted_tree_converts_back_to_submission() {
        let persisted = PersistedRootMenu {
            id: 1,
            name: "1. Menu".to_string(),
            list_order: 1,
            children: vec![PersistedSubMenu {
                id: 2,
                name: "1-1. Menu".to_string(),
                list_order: 1,
            }],
        };

        let root = RootMenu::from(&persisted);
        assert_eq!(root.id, Some(1));
        assert_eq!(root.children, vec![SubMenu::new(Some(2), "1-1. Menu", 1)]);
    }
}
