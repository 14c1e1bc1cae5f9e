//! Two-pointer walk over id-sorted sibling lists

use std::cmp::Ordering;

use crate::domain::{MenuId, PersistedRootMenu, PersistedSubMenu, RootMenu, SubMenu};
use crate::error::DomainError;

pub(crate) trait SubmittedEntry {
    fn id(&self) -> Option<MenuId>;
}

pub(crate) trait PersistedEntry {
    fn id(&self) -> MenuId;
}

impl SubmittedEntry for RootMenu {
    fn id(&self) -> Option<MenuId> {
        self.id
    }
}

impl SubmittedEntry for SubMenu {
    fn id(&self) -> Option<MenuId> {
        self.id
    }
}

impl PersistedEntry for PersistedRootMenu {
    fn id(&self) -> MenuId {
        self.id
    }
}

impl PersistedEntry for PersistedSubMenu {
    fn id(&self) -> MenuId {
        self.id
    }
}

/// One decision of the walk
#[derive(Debug)]
pub(crate) enum Step<'a, N, O> {
    /// Submitted without an id
    Create(&'a N),
    Matched { submitted: &'a N, persisted: &'a O },
    /// Persisted sibling absent from the submission
    Remove(&'a O),
}

/// Walk one sibling level.
///
/// Persisted entries are sorted by id; submitted entries by id with missing ids
/// last, so every id-bearing submission meets its persisted twin before any
/// creation is visited. A submitted id that is not persisted at this level is
/// rejected instead of being skipped.
pub(crate) fn merge_walk<'a, N, O, F>(
    submitted: &'a [N],
    persisted: &'a [O],
    mut visit: F,
) -> Result<(), DomainError>
where
    N: SubmittedEntry,
    O: PersistedEntry,
    F: FnMut(Step<'a, N, O>) -> Result<(), DomainError>,
{
    let mut new_menus: Vec<&'a N> = submitted.iter().collect();
    new_menus.sort_by_key(|menu| (menu.id().is_none(), menu.id()));

    if let Some(id) = first_duplicate(&new_menus) {
        return Err(DomainError::DuplicateMenuId(id));
    }

    let mut old_menus: Vec<&'a O> = persisted.iter().collect();
    old_menus.sort_by_key(|menu| menu.id());

    let mut new_menus = new_menus.into_iter().peekable();
    let mut old_menus = old_menus.into_iter().peekable();

    loop {
        let step = match (new_menus.peek().copied(), old_menus.peek().copied()) {
            (None, None) => break,
            (None, Some(old)) => {
                old_menus.next();
                Step::Remove(old)
            }
            (Some(new), old) => match (new.id(), old) {
                (None, _) => {
                    new_menus.next();
                    Step::Create(new)
                }
                (Some(id), None) => return Err(DomainError::UnknownMenuId(id)),
                (Some(id), Some(old)) => match old.id().cmp(&id) {
                    Ordering::Equal => {
                        new_menus.next();
                        old_menus.next();
                        Step::Matched {
                            submitted: new,
                            persisted: old,
                        }
                    }
                    Ordering::Less => {
                        old_menus.next();
                        Step::Remove(old)
                    }
                    Ordering::Greater => return Err(DomainError::UnknownMenuId(id)),
                },
            },
        };

        visit(step)?;
    }

    Ok(())
}

fn first_duplicate<N: SubmittedEntry>(sorted: &[&N]) -> Option<MenuId> {
    sorted.windows(2).find_map(|pair| match (pair[0].id(), pair[1].id()) {
        (Some(left), Some(right)) if left == right => Some(left),
        _ => None,
    })
}
