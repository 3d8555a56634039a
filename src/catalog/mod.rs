//! The plan catalog store
//!
//! [`Catalog`] owns one record collection per record type and implements
//! the catalog operations on top of them:
//!
//! * [`geography`] - county/zip records, rating and service areas
//! * [`factors`] - actuarial factor tables and the quote-time [`FactorCache`]
//! * [`products`] - product queries used by the builders and for quoting
//!
//! Collections are only reached through [`RecordCollection`], so another
//! store with create, fetch-by-key and range/set queries could replace the
//! in-memory one.

pub mod factors;
pub mod geography;
pub mod products;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collections::GenericCollection;
use crate::common::traits::RecordCollection;
use crate::error::Result;
use crate::models::{ActuarialFactor, Area, AreaKind, CountyZip, Product};

pub use factors::FactorCache;
pub use geography::RatingAreaIndex;

/// In-memory catalog of geography, factors and products
#[derive(Debug, Default)]
pub struct Catalog {
    county_zips: GenericCollection<CountyZip>,
    rating_areas: GenericCollection<Area>,
    service_areas: GenericCollection<Area>,
    factors: GenericCollection<ActuarialFactor>,
    products: GenericCollection<Product>,
}

/// Serializable copy of every collection
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogSnapshot {
    county_zips: Vec<CountyZip>,
    rating_areas: Vec<Area>,
    service_areas: Vec<Area>,
    factors: Vec<ActuarialFactor>,
    products: Vec<Product>,
}

impl Catalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// County/zip records
    #[must_use]
    pub fn county_zips(&self) -> &GenericCollection<CountyZip> {
        &self.county_zips
    }

    /// Rating or service areas
    #[must_use]
    pub fn areas(&self, kind: AreaKind) -> &GenericCollection<Area> {
        match kind {
            AreaKind::Rating => &self.rating_areas,
            AreaKind::Service => &self.service_areas,
        }
    }

    pub(crate) fn areas_mut(&mut self, kind: AreaKind) -> &mut GenericCollection<Area> {
        match kind {
            AreaKind::Rating => &mut self.rating_areas,
            AreaKind::Service => &mut self.service_areas,
        }
    }

    /// Actuarial factor tables
    #[must_use]
    pub fn factors(&self) -> &GenericCollection<ActuarialFactor> {
        &self.factors
    }

    /// Products
    #[must_use]
    pub fn products(&self) -> &GenericCollection<Product> {
        &self.products
    }

    /// Mutable products, for the builders
    pub fn products_mut(&mut self) -> &mut GenericCollection<Product> {
        &mut self.products
    }

    /// Record counts per collection
    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            county_zips: self.county_zips.count(),
            rating_areas: self.rating_areas.count(),
            service_areas: self.service_areas.count(),
            factors: self.factors.count(),
            products: self.products.count(),
            premium_tables: self
                .products
                .iter()
                .map(|product| product.premium_tables.len())
                .sum(),
        }
    }

    /// Export every collection as a JSON document
    pub fn to_json(&self) -> Result<String> {
        let snapshot = CatalogSnapshot {
            county_zips: self.county_zips.to_vec(),
            rating_areas: self.rating_areas.to_vec(),
            service_areas: self.service_areas.to_vec(),
            factors: self.factors.to_vec(),
            products: self.products.to_vec(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Rebuild a catalog from a document written by [`Catalog::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        Ok(Self {
            county_zips: GenericCollection::restore(snapshot.county_zips),
            rating_areas: GenericCollection::restore(snapshot.rating_areas),
            service_areas: GenericCollection::restore(snapshot.service_areas),
            factors: GenericCollection::restore(snapshot.factors),
            products: GenericCollection::restore(snapshot.products),
        })
    }
}

/// Record counts of a catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// County/zip records
    pub county_zips: usize,
    /// Rating areas
    pub rating_areas: usize,
    /// Service areas
    pub service_areas: usize,
    /// Actuarial factor tables
    pub factors: usize,
    /// Products
    pub products: usize,
    /// Premium tables across all products
    pub premium_tables: usize,
}

impl fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Catalog:")?;
        writeln!(f, "  County/zip records: {}", self.county_zips)?;
        writeln!(f, "  Rating areas: {}", self.rating_areas)?;
        writeln!(f, "  Service areas: {}", self.service_areas)?;
        writeln!(f, "  Actuarial factors: {}", self.factors)?;
        writeln!(f, "  Products: {}", self.products)?;
        writeln!(f, "  Premium tables: {}", self.premium_tables)
    }
}
