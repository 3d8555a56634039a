//! Quote-time price resolution
//!
//! [`QuoteResolver`] composes a product's premium table for a rating area
//! and date with the employer's actuarial factors. It only reads the
//! catalog and the injected [`FactorCache`]. Premium tables it has found
//! are remembered per `(product, rating area, year, quarter)` for the life
//! of the resolver, which is meant to span one request batch.

pub mod request;

use chrono::{Datelike, NaiveDate};
use rustc_hash::FxHashMap;

use crate::catalog::{Catalog, FactorCache};
use crate::common::traits::RecordCollection;
use crate::error::{CatalogError, Result};
use crate::models::factor::FactorInput;
use crate::models::product::{PremiumTable, PremiumTuple, Product};
use crate::models::types::{BenefitMarketKind, RecordId};
use crate::utils::dates::quarter_of;

pub use request::QuoteRequest;

type TableKey = (RecordId, RecordId, i32, u32);

/// Request-scoped premium resolver
#[derive(Debug)]
pub struct QuoteResolver<'a> {
    catalog: &'a Catalog,
    factors: &'a FactorCache,
    tables: FxHashMap<TableKey, usize>,
}

impl<'a> QuoteResolver<'a> {
    /// Create a resolver over a catalog and a factor cache built from it
    #[must_use]
    pub fn new(catalog: &'a Catalog, factors: &'a FactorCache) -> Self {
        if factors.is_stale() {
            log::warn!("Quoting against a stale factor cache; rebuild it after re-ingestion");
        }
        Self {
            catalog,
            factors,
            tables: FxHashMap::default(),
        }
    }

    /// Monthly premium of a product for a request
    ///
    /// # Arguments
    /// * `product` - Product to price
    /// * `request` - Rating area, date, age and group inputs
    ///
    /// # Returns
    /// The premium at the requested age multiplied by the group factors
    pub fn price_product(&mut self, product: &Product, request: &QuoteRequest) -> Result<f64> {
        let table = self.premium_table(product, request.rating_area_id, request.effective_date)?;
        let tuple = tuple_for_age(table, request.age).ok_or_else(|| {
            CatalogError::validation(format!(
                "product {} has no premium for age {}",
                product.hios_id(),
                request.age
            ))
        })?;
        Ok(tuple.cost * self.group_factor(product, request)?)
    }

    /// Price a product by id
    pub fn price_product_id(&mut self, product_id: RecordId, request: &QuoteRequest) -> Result<f64> {
        let catalog = self.catalog;
        let product = catalog.products().get(product_id).ok_or_else(|| {
            CatalogError::validation(format!("product {product_id} does not exist"))
        })?;
        self.price_product(product, request)
    }

    /// "Starting at" price: the minimum-age premium with the group factors
    ///
    /// The request's age is ignored.
    pub fn starting_price(&mut self, product: &Product, request: &QuoteRequest) -> Result<f64> {
        let table = self.premium_table(product, request.rating_area_id, request.effective_date)?;
        let tuple = table.minimum_age_tuple().ok_or_else(|| {
            CatalogError::validation(format!("product {} has an empty premium table", product.hios_id()))
        })?;
        Ok(tuple.cost * self.group_factor(product, request)?)
    }

    /// Number of premium tables remembered so far
    #[must_use]
    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }

    fn premium_table<'p>(
        &mut self,
        product: &'p Product,
        rating_area_id: RecordId,
        date: NaiveDate,
    ) -> Result<&'p PremiumTable> {
        let key = (product.id, rating_area_id, date.year(), quarter_of(date));
        if let Some(&index) = self.tables.get(&key) {
            // A table may end inside a quarter, so a hit is re-checked
            if let Some(table) = product
                .premium_tables
                .get(index)
                .filter(|t| t.rating_area_id == rating_area_id && t.effective_period.contains(date))
            {
                return Ok(table);
            }
        }

        let index = product
            .premium_tables
            .iter()
            .position(|t| t.rating_area_id == rating_area_id && t.effective_period.contains(date))
            .ok_or_else(|| {
                CatalogError::validation(format!(
                    "product {} has no premium table for rating area {} on {}",
                    product.hios_id(),
                    rating_area_id,
                    date
                ))
            })?;
        self.tables.insert(key, index);
        Ok(&product.premium_tables[index])
    }

    /// Product of the group size, participation, SIC and composite tier
    /// factors; 1.0 outside the SHOP market
    fn group_factor(&self, product: &Product, request: &QuoteRequest) -> Result<f64> {
        if product.benefit_market_kind != BenefitMarketKind::Shop {
            return Ok(1.0);
        }
        let issuer = product.issuer_hios_ids.iter().next().ok_or_else(|| {
            CatalogError::validation(format!("product {} has no issuer", product.hios_id()))
        })?;
        let year = product.active_year();

        let mut inputs: Vec<FactorInput<'_>> = Vec::with_capacity(4);
        if let Some(size) = request.group_size {
            inputs.push(FactorInput::GroupSize(size));
        }
        if let Some(rate) = request.participation_rate {
            inputs.push(FactorInput::ParticipationRate(rate));
        }
        if let Some(code) = request.sic_code.as_deref() {
            inputs.push(FactorInput::SicCode(code));
        }
        if let Some(tier) = request.composite_tier.as_deref() {
            inputs.push(FactorInput::CompositeTier(tier));
        }

        inputs.iter().try_fold(1.0, |factor, input| {
            Ok(factor * self.factors.cached_lookup(input, issuer, year)?)
        })
    }
}

/// Tuple for an age, clamped into the table's age bounds
///
/// Bucketed ages are stored at their bound (`0-14` as 14), so younger and
/// older enrollees take the nearest edge tuple.
fn tuple_for_age(table: &PremiumTable, age: u32) -> Option<&PremiumTuple> {
    let (min, max) = table.age_bounds()?;
    table.tuple_for_age(age.clamp(min, max))
}
