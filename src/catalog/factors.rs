//! Actuarial factor catalog operations
//!
//! Factor tables are stored per `(kind, issuer, year)`. Lookups transform
//! the input into the table's key space and fall back to the table default
//! on a miss. A missing table is a [`CatalogError::LookupMiss`] for every
//! kind except composite tiers, which default to 1.0.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::catalog::Catalog;
use crate::common::traits::RecordCollection;
use crate::error::{CatalogError, Result};
use crate::models::factor::table_key;
use crate::models::{ActuarialFactor, FactorInput, FactorKind, FactorSnapshot, RecordId};

/// Value used when a composite tier table is missing
const MISSING_COMPOSITE_TIER_FACTOR: f64 = 1.0;

impl Catalog {
    /// Store a factor table unless the current one is identical
    ///
    /// Returns the id of the current table afterwards and whether a new
    /// record was created. Tables are never merged. A table that differs in
    /// any field replaces the current table of its `(kind, issuer, year)`,
    /// so the last table ingested is always the one in effect.
    pub fn upsert_factor(&mut self, factor: ActuarialFactor) -> (RecordId, bool) {
        if let Some(current) = self
            .factor_record(factor.kind, &factor.issuer_hios_id, factor.active_year)
            .filter(|current| current.same_content(&factor))
        {
            return (current.id, false);
        }
        for superseded in self.factors.ids_where(|stored| {
            stored.kind == factor.kind
                && stored.issuer_hios_id == factor.issuer_hios_id
                && stored.active_year == factor.active_year
        }) {
            self.factors.remove(superseded);
        }
        (self.factors.insert(factor), true)
    }

    /// Current factor table for an issuer and year
    ///
    /// Snapshots written before tables were replaced on upsert may hold
    /// several; the most recently stored one is used.
    #[must_use]
    pub fn factor_record(
        &self,
        kind: FactorKind,
        issuer_hios_id: &str,
        active_year: i32,
    ) -> Option<&ActuarialFactor> {
        self.factors
            .find(|factor| {
                factor.kind == kind
                    && factor.issuer_hios_id == issuer_hios_id
                    && factor.active_year == active_year
            })
            .pop()
    }

    /// Factor value for an input
    pub fn lookup(&self, input: &FactorInput<'_>, issuer_hios_id: &str, active_year: i32) -> Result<f64> {
        match self.factor_record(input.kind(), issuer_hios_id, active_year) {
            Some(factor) => Ok(factor.value_for(input)),
            None => missing_factor(input.kind(), issuer_hios_id, active_year),
        }
    }

    /// Composite tier factor for a free-text tier name
    pub fn composite_tier_factor(
        &self,
        issuer_hios_id: &str,
        active_year: i32,
        tier_name: &str,
    ) -> Result<f64> {
        self.lookup(&FactorInput::CompositeTier(tier_name), issuer_hios_id, active_year)
    }

    /// Snapshot of a factor table for copying onto products
    #[must_use]
    pub fn factor_snapshot(
        &self,
        kind: FactorKind,
        issuer_hios_id: &str,
        active_year: i32,
    ) -> Option<FactorSnapshot> {
        self.factor_record(kind, issuer_hios_id, active_year)
            .map(ActuarialFactor::snapshot)
    }
}

fn missing_factor(kind: FactorKind, issuer_hios_id: &str, year: i32) -> Result<f64> {
    if kind.defaults_when_missing() {
        log::warn!(
            "No {kind} factor for issuer {issuer_hios_id} in {year}, defaulting to {MISSING_COMPOSITE_TIER_FACTOR}"
        );
        return Ok(MISSING_COMPOSITE_TIER_FACTOR);
    }
    Err(CatalogError::LookupMiss {
        factor: kind,
        issuer_hios_id: issuer_hios_id.to_string(),
        year,
    })
}

/// One materialized factor table
#[derive(Debug, Clone)]
struct CachedTable {
    default_factor_value: f64,
    max_integer_factor_key: Option<i64>,
    entries: FxHashMap<String, f64>,
}

/// Materialized factor tables for quote resolution
///
/// Built once from a catalog and read concurrently by quote requests.
/// After a re-ingestion the owner calls [`FactorCache::rebuild`]; the cache
/// never reads the catalog on its own.
#[derive(Debug, Clone)]
pub struct FactorCache {
    tables: FxHashMap<(FactorKind, String, i32), CachedTable>,
    built_at: Instant,
    ttl: Option<Duration>,
}

impl FactorCache {
    /// Materialize every current factor table of a catalog
    ///
    /// # Arguments
    /// * `catalog` - Catalog to read factor tables from
    /// * `ttl` - Age after which [`FactorCache::is_stale`] reports true
    #[must_use]
    pub fn build(catalog: &Catalog, ttl: Option<Duration>) -> Self {
        let mut cache = Self {
            tables: FxHashMap::default(),
            built_at: Instant::now(),
            ttl,
        };
        cache.load(catalog);
        cache
    }

    /// Replace the cached tables with the catalog's current ones
    pub fn rebuild(&mut self, catalog: &Catalog) {
        self.tables.clear();
        self.load(catalog);
        self.built_at = Instant::now();
    }

    fn load(&mut self, catalog: &Catalog) {
        // Later records supersede earlier ones, matching `factor_record`
        for factor in catalog.factors().iter() {
            self.tables.insert(
                (factor.kind, factor.issuer_hios_id.clone(), factor.active_year),
                CachedTable {
                    default_factor_value: factor.default_factor_value,
                    max_integer_factor_key: factor.max_integer_factor_key,
                    entries: factor
                        .entries
                        .iter()
                        .map(|(key, value)| (key.clone(), *value))
                        .collect(),
                },
            );
        }
        log::debug!("Factor cache holds {} tables", self.tables.len());
    }

    /// Same result as [`Catalog::lookup`], served from the cache
    pub fn cached_lookup(&self, input: &FactorInput<'_>, issuer_hios_id: &str, active_year: i32) -> Result<f64> {
        let key = (input.kind(), issuer_hios_id.to_string(), active_year);
        match self.tables.get(&key) {
            Some(table) => Ok(table
                .entries
                .get(&table_key(input, table.max_integer_factor_key))
                .copied()
                .unwrap_or(table.default_factor_value)),
            None => missing_factor(input.kind(), issuer_hios_id, active_year),
        }
    }

    /// Whether the cache is older than its TTL
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.ttl
            .is_some_and(|ttl| self.built_at.elapsed() >= ttl)
    }

    /// Number of cached tables
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the cache holds no tables
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
