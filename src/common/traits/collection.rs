//! Standardized collection traits
//!
//! This module defines the record store interface used by every catalog:
//! create, fetch by id, and predicate queries over composite keys, ranges and
//! set membership.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::models::types::RecordId;

/// A record stored in a catalog collection
pub trait CatalogRecord: Clone + Debug + Send + Sync {
    /// Store identifier
    fn id(&self) -> RecordId;

    /// Set the store identifier on insert
    fn assign_id(&mut self, id: RecordId);
}

/// Core trait for record stores
///
/// Query results are returned in ascending id order, which is creation
/// order; callers that need "the first match" rely on this.
pub trait RecordCollection<T: CatalogRecord>: Send + Sync + Debug {
    /// Insert a new record and return its assigned id
    fn insert(&mut self, record: T) -> RecordId;

    /// Get a record by id
    fn get(&self, id: RecordId) -> Option<&T>;

    /// Get a mutable record by id
    fn get_mut(&mut self, id: RecordId) -> Option<&mut T>;

    /// All records in id order
    fn all(&self) -> Vec<&T>;

    /// Number of records
    fn count(&self) -> usize;

    /// Records matching a predicate, in id order
    fn find<F>(&self, predicate: F) -> Vec<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.all().into_iter().filter(|record| predicate(record)).collect()
    }

    /// First record matching a predicate (smallest id)
    fn find_first<F>(&self, predicate: F) -> Option<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.all().into_iter().find(|record| predicate(record))
    }

    /// Ids of the records matching a predicate, in id order
    fn ids_where<F>(&self, predicate: F) -> Vec<RecordId>
    where
        F: Fn(&T) -> bool,
    {
        self.find(predicate).into_iter().map(CatalogRecord::id).collect()
    }

    /// Check if the collection contains a record with the given id
    fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }
}

/// Trait for creating lookups from collections
pub trait LookupCollection<T: CatalogRecord>: RecordCollection<T> {
    /// Create a lookup map using a key function; later records do not
    /// replace earlier ones under the same key
    fn create_lookup<K, F>(&self, key_fn: F) -> HashMap<K, RecordId>
    where
        K: Eq + Hash,
        F: Fn(&T) -> K,
    {
        let mut lookup = HashMap::with_capacity(self.count());
        for record in self.all() {
            lookup.entry(key_fn(record)).or_insert_with(|| record.id());
        }
        lookup
    }
}
