//! Entity index: id -> entity, filled incrementally as pages arrive.

use crate::traits::CachedEntity;
use airsense_core::EntityId;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// First-look cache consulted by every lookup.
///
/// Entries are never removed. Merging an id that is already present replaces
/// the stored copy with the newer one.
#[derive(Debug)]
pub struct EntityIndex<T: CachedEntity> {
    entries: RwLock<HashMap<EntityId, T>>,
}

impl<T: CachedEntity> EntityIndex<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<T> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Merge a batch of entities in one write.
    ///
    /// Returns the number of ids that were not indexed before.
    pub fn merge<'a, I>(&self, entities: I) -> usize
    where
        I: IntoIterator<Item = &'a T>,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut added = 0;
        for entity in entities {
            if entries.insert(entity.entity_id(), entity.clone()).is_none() {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All indexed entities, ordered by id.
    pub fn snapshot(&self) -> Vec<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut values: Vec<T> = entries.values().cloned().collect();
        values.sort_by_key(|entity| entity.entity_id());
        values
    }
}

impl<T: CachedEntity> Default for EntityIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tagged {
        id: EntityId,
        label: &'static str,
    }

    impl CachedEntity for Tagged {
        fn entity_id(&self) -> EntityId {
            self.id
        }
    }

    #[test]
    fn test_merge_counts_new_ids_only() {
        let index = EntityIndex::new();
        let first = [Tagged { id: 1, label: "a" }, Tagged { id: 2, label: "b" }];
        assert_eq!(index.merge(&first), 2);

        let second = [Tagged { id: 2, label: "b2" }, Tagged { id: 3, label: "c" }];
        assert_eq!(index.merge(&second), 1);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_last_write_wins() {
        let index = EntityIndex::new();
        index.merge(&[Tagged { id: 9, label: "old" }]);
        index.merge(&[Tagged { id: 9, label: "new" }]);
        assert_eq!(index.get(9).map(|p| p.label), Some("new"));
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let index = EntityIndex::new();
        index.merge(&[
            Tagged { id: 5, label: "e" },
            Tagged { id: 1, label: "a" },
            Tagged { id: 3, label: "c" },
        ]);
        let ids: Vec<EntityId> = index.snapshot().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert!(index.contains(3));
        assert!(!index.contains(4));
        assert!(index.get(4).is_none());
    }
}
