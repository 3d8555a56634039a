//! Common traits used across the codebase
//!
//! This module defines the storage traits the catalog is written against,
//! so that any store with equivalent query power can stand in for the
//! in-memory collections.

pub mod collection;

// Re-export collection traits
pub use collection::{CatalogRecord, LookupCollection, RecordCollection};
