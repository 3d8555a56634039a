//! Standardized record collections
//!
//! This module provides the in-memory implementation of the collection
//! interfaces defined in the common traits. Records are kept in a `BTreeMap`
//! indexed by id, so iteration is always in creation order.

use std::collections::BTreeMap;
use std::fmt;

use crate::common::traits::{CatalogRecord, LookupCollection, RecordCollection};
use crate::models::types::RecordId;

/// Generic record collection implementation
///
/// Ids are assigned on insert from a monotonically increasing counter and
/// are never reused.
pub struct GenericCollection<T: CatalogRecord> {
    /// Records indexed by id
    items: BTreeMap<RecordId, T>,
    /// Next id to hand out
    next_id: u64,
}

impl<T: CatalogRecord> GenericCollection<T> {
    /// Create a new empty collection
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a collection from records that already carry ids
    ///
    /// Used when loading a snapshot. The id counter resumes after the
    /// largest restored id.
    #[must_use]
    pub fn restore(records: Vec<T>) -> Self {
        let mut collection = Self::new();
        for record in records {
            let id = record.id();
            collection.next_id = collection.next_id.max(id.0 + 1);
            collection.items.insert(id, record);
        }
        collection
    }

    /// Remove a record from the collection
    pub fn remove(&mut self, id: RecordId) -> Option<T> {
        self.items.remove(&id)
    }

    /// Iterate records in id order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Clone all records out, in id order
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.values().cloned().collect()
    }
}

impl<T: CatalogRecord> Default for GenericCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CatalogRecord> fmt::Debug for GenericCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericCollection")
            .field("count", &self.items.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<T: CatalogRecord> RecordCollection<T> for GenericCollection<T> {
    fn insert(&mut self, mut record: T) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        record.assign_id(id);
        self.items.insert(id, record);
        id
    }

    fn get(&self, id: RecordId) -> Option<&T> {
        self.items.get(&id)
    }

    fn get_mut(&mut self, id: RecordId) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    fn all(&self) -> Vec<&T> {
        self.items.values().collect()
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn find<F>(&self, predicate: F) -> Vec<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.values().filter(|record| predicate(record)).collect()
    }

    fn find_first<F>(&self, predicate: F) -> Option<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.values().find(|record| predicate(record))
    }
}

impl<T: CatalogRecord> LookupCollection<T> for GenericCollection<T> {}
