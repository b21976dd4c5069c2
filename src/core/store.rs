//! Collection store: the unfiltered list backing one view

use crate::core::entity::{Entity, EntityId};
use crate::core::error::ValidationError;
use std::collections::HashMap;

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// Full, unfiltered collection of one entity kind.
///
/// Holds at most one entity per id, in arrival order, with an id index for
/// constant-time lookup. Filtering and sorting read from the store and never
/// write to it.
#[derive(Debug, Clone)]
pub struct CollectionStore<E: Entity> {
    items: Vec<E>,
    positions: HashMap<EntityId, usize>,
}

impl<E: Entity> Default for CollectionStore<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<E: Entity> CollectionStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection.
    ///
    /// A later element with an id already seen replaces the earlier one in
    /// place, so the store never carries duplicates even if the backend does.
    pub fn replace_all(&mut self, items: Vec<E>) {
        self.items = Vec::with_capacity(items.len());
        self.positions = HashMap::with_capacity(items.len());

        for item in items {
            match item.id() {
                Some(id) => match self.positions.get(&id) {
                    Some(&slot) => self.items[slot] = item,
                    None => {
                        self.positions.insert(id, self.items.len());
                        self.items.push(item);
                    }
                },
                None => self.items.push(item),
            }
        }
    }

    /// Replace the element with the same id, or append it
    pub fn upsert(&mut self, item: E) -> Result<UpsertOutcome, ValidationError> {
        let id = item.id().ok_or(ValidationError::MissingId {
            entity: E::resource_name_singular(),
        })?;

        match self.positions.get(&id) {
            Some(&slot) => {
                self.items[slot] = item;
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                self.positions.insert(id, self.items.len());
                self.items.push(item);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Remove by id, returning the removed element
    pub fn remove(&mut self, id: EntityId) -> Option<E> {
        let slot = self.positions.remove(&id)?;
        let removed = self.items.remove(slot);
        for position in self.positions.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.positions.get(&id).map(|&slot| &self.items[slot])
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::{User, UserRole};

    fn user(id: Option<i64>, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            role: UserRole::Customer,
            ..User::default()
        }
    }

    #[test]
    fn test_replace_all_dedupes_by_id() {
        let mut store = CollectionStore::new();
        store.replace_all(vec![
            user(Some(1), "Ana"),
            user(Some(2), "Ben"),
            user(Some(1), "Ana (renamed)"),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.items()[0].name, "Ana (renamed)");
        assert_eq!(store.items()[1].name, "Ben");
    }

    #[test]
    fn test_upsert_replaces_instead_of_appending() {
        let mut store = CollectionStore::new();
        store.replace_all(vec![user(Some(1), "Ana"), user(Some(2), "Ben")]);

        let outcome = store.upsert(user(Some(2), "Benjamin")).unwrap();
        assert_eq!(outcome, UpsertOutcome::Replaced);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(2).unwrap().name, "Benjamin");

        let outcome = store.upsert(user(Some(3), "Cleo")).unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(store.items().last().unwrap().name, "Cleo");
    }

    #[test]
    fn test_upsert_requires_id() {
        let mut store = CollectionStore::new();
        let err = store.upsert(user(None, "Draft")).unwrap_err();
        assert_eq!(err, ValidationError::MissingId { entity: "user" });
        assert!(store.is_empty());
    }

    #[test]
    fn test_lookup_follows_removals() {
        let mut store = CollectionStore::new();
        store.replace_all((1..=5).map(|id| user(Some(id), &format!("U{id}"))).collect());

        store.remove(2);
        assert_eq!(store.get(4).map(|u| u.name.as_str()), Some("U4"));
        assert_eq!(store.get(5).map(|u| u.name.as_str()), Some("U5"));

        store.upsert(user(Some(4), "Four")).unwrap();
        let names: Vec<_> = store.items().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["U1", "U3", "Four", "U5"]);
    }

    #[test]
    fn test_remove() {
        let mut store = CollectionStore::new();
        store.replace_all(vec![user(Some(1), "Ana"), user(Some(2), "Ben")]);
        assert_eq!(store.remove(1).map(|u| u.name), Some("Ana".to_string()));
        assert!(store.remove(1).is_none());
        assert_eq!(store.len(), 1);
    }
}
