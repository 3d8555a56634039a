//! Products and their premium tables
//!
//! A product is identified by `(hios_base_id, csr_variant_id)` within its
//! application period. It owns premium tables whose effective periods lie
//! inside the application period. Tables of the same rating area never
//! overlap each other. The checks live in [`Product::add_premium_table`] so
//! that no caller can bypass them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::common::traits::CatalogRecord;
use crate::error::{CatalogError, Result};
use crate::models::factor::FactorSnapshot;
use crate::models::types::{AgeRange, BenefitMarketKind, ProductKind, RecordId};
use crate::utils::dates::DateRange;

/// Premium for one age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PremiumTuple {
    /// Age of the primary enrollee
    pub age: u32,
    /// Monthly premium
    pub cost: f64,
}

/// Premiums for one rating area over one effective period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumTable {
    /// Period the rates apply to
    pub effective_period: DateRange,
    /// Rating area the rates apply to
    pub rating_area_id: RecordId,
    /// One tuple per age, sorted by age
    pub premium_tuples: Vec<PremiumTuple>,
}

impl PremiumTable {
    /// Build a table from an age to cost map
    ///
    /// Fails if the map is empty or holds a non-positive cost.
    pub fn new(
        effective_period: DateRange,
        rating_area_id: RecordId,
        costs: &BTreeMap<u32, f64>,
    ) -> Result<Self> {
        if costs.is_empty() {
            return Err(CatalogError::validation(format!(
                "premium table for {effective_period} has no premium tuples"
            )));
        }
        if let Some((age, cost)) = costs.iter().find(|(_, cost)| !(**cost > 0.0)) {
            return Err(CatalogError::validation(format!(
                "premium for age {age} must be positive, got {cost}"
            )));
        }
        Ok(Self {
            effective_period,
            rating_area_id,
            premium_tuples: costs
                .iter()
                .map(|(&age, &cost)| PremiumTuple { age, cost })
                .collect(),
        })
    }

    /// Tuple for an exact age
    #[must_use]
    pub fn tuple_for_age(&self, age: u32) -> Option<&PremiumTuple> {
        self.premium_tuples
            .binary_search_by_key(&age, |tuple| tuple.age)
            .ok()
            .map(|index| &self.premium_tuples[index])
    }

    /// Tuple with the lowest age
    #[must_use]
    pub fn minimum_age_tuple(&self) -> Option<&PremiumTuple> {
        self.premium_tuples.first()
    }

    /// Lowest and highest rated ages
    #[must_use]
    pub fn age_bounds(&self) -> Option<(u32, u32)> {
        let first = self.premium_tuples.first()?;
        let last = self.premium_tuples.last()?;
        Some((first.age, last.age))
    }
}

/// Copay and coinsurance of one service type, currency-unwrapped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCost {
    /// In-network copay
    pub copay: Option<String>,
    /// In-network coinsurance
    pub coinsurance: Option<String>,
}

/// Summary-of-benefits cost scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageExample {
    /// Deductible paid in the scenario
    pub deductible: Option<String>,
    /// Copayments paid in the scenario
    pub copayment: Option<String>,
    /// Coinsurance paid in the scenario
    pub coinsurance: Option<String>,
    /// Limits or exclusions paid in the scenario
    pub limit: Option<String>,
}

/// Health-only product attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthDetails {
    /// HMO, PPO, POS, EPO, indemnity
    pub plan_type: String,
    /// Share of the premium attributable to essential health benefits
    pub ehb: f64,
    /// Primary care visit to treat an injury or illness
    pub primary_care: ServiceCost,
    /// Inpatient hospital stay
    pub hospital_stay: ServiceCost,
    /// Emergency room services
    pub emergency: ServiceCost,
    /// Generic drugs
    pub prescription: ServiceCost,
    /// Whether the plan is a standardized design
    pub is_standard_plan: bool,
    /// Formulary URL
    pub rx_formulary_url: Option<String>,
    /// Having-a-baby scenario
    pub having_baby: Option<CoverageExample>,
    /// Managing-diabetes scenario
    pub having_diabetes: Option<CoverageExample>,
    /// Simple-fracture scenario
    pub simple_fracture: Option<CoverageExample>,
}

/// Dental-only product attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DentalDetails {
    /// HMO or PPO style dental plan
    pub dental_plan_kind: String,
    /// High or low coverage level
    pub dental_level: String,
    /// Basic dental care coinsurance
    pub basic_dental_services: Option<String>,
    /// Major dental care coinsurance
    pub major_dental_services: Option<String>,
    /// Preventive dental care coinsurance
    pub preventive_dental_services: Option<String>,
}

/// Kind-specific attributes, the discriminator of a product's kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductDetails {
    /// Medical product
    Health(HealthDetails),
    /// Stand-alone dental product
    Dental(DentalDetails),
}

impl ProductDetails {
    /// Kind of product these details belong to
    #[must_use]
    pub const fn kind(&self) -> ProductKind {
        match self {
            Self::Health(_) => ProductKind::Health,
            Self::Dental(_) => ProductKind::Dental,
        }
    }
}

/// A sellable product for one plan year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store identifier
    pub id: RecordId,
    /// Fourteen character plan id shared by all variants
    pub hios_base_id: String,
    /// Cost-sharing-reduction variant suffix; `None` for dental products
    pub csr_variant_id: Option<String>,
    /// Period the product may be sold in; fixed once set
    pub application_period: DateRange,
    /// Market the product is sold in
    pub benefit_market_kind: BenefitMarketKind,
    /// Marketing name
    pub title: String,
    /// Metal tier (health) or coverage level (dental)
    pub metal_level: String,
    /// Issuers that submitted the product
    pub issuer_hios_ids: BTreeSet<String>,
    /// Package tags the product may be offered in
    pub product_package_kinds: BTreeSet<String>,
    /// Ages with premiums
    pub premium_ages: AgeRange,
    /// Service area the product is offered in
    pub service_area_id: Option<RecordId>,
    /// Group size factors copied at build time
    pub group_size_factors: Option<FactorSnapshot>,
    /// Composite tier factors copied at build time
    pub group_tier_factors: Option<FactorSnapshot>,
    /// Participation rate factors copied at build time
    pub participation_factors: Option<FactorSnapshot>,
    /// Whether the product qualifies for a health savings account
    pub hsa_eligible: bool,
    /// Individual in-network deductible
    pub deductible: Option<String>,
    /// Family in-network deductible
    pub family_deductible: Option<String>,
    /// Individual in-network maximum out of pocket
    pub out_of_pocket_in_network: Option<String>,
    /// Network description
    pub network_information: Option<String>,
    /// Provider directory URL
    pub provider_directory_url: Option<String>,
    /// Kind-specific attributes
    pub details: ProductDetails,
    /// Premium tables, non-overlapping per rating area
    pub premium_tables: Vec<PremiumTable>,
}

impl Product {
    /// Create an unsaved product with default attributes
    pub fn new(
        hios_base_id: impl Into<String>,
        csr_variant_id: Option<String>,
        application_period: DateRange,
        details: ProductDetails,
    ) -> Self {
        Self {
            id: RecordId::default(),
            hios_base_id: hios_base_id.into(),
            csr_variant_id,
            application_period,
            benefit_market_kind: BenefitMarketKind::Individual,
            title: String::new(),
            metal_level: String::new(),
            issuer_hios_ids: BTreeSet::new(),
            product_package_kinds: BTreeSet::new(),
            premium_ages: AgeRange::default(),
            service_area_id: None,
            group_size_factors: None,
            group_tier_factors: None,
            participation_factors: None,
            hsa_eligible: false,
            deductible: None,
            family_deductible: None,
            out_of_pocket_in_network: None,
            network_information: None,
            provider_directory_url: None,
            details,
            premium_tables: Vec::new(),
        }
    }

    /// Health or dental
    #[must_use]
    pub const fn kind(&self) -> ProductKind {
        self.details.kind()
    }

    /// Full plan id, `<hios_base_id>-<csr_variant_id>` for variants
    #[must_use]
    pub fn hios_id(&self) -> String {
        match &self.csr_variant_id {
            Some(variant) => format!("{}-{variant}", self.hios_base_id),
            None => self.hios_base_id.clone(),
        }
    }

    /// Year of the application period
    #[must_use]
    pub fn active_year(&self) -> i32 {
        self.application_period.year()
    }

    /// Whether the product matches an identity key for a year
    #[must_use]
    pub fn has_identity(&self, hios_base_id: &str, csr_variant_id: Option<&str>, year: &DateRange) -> bool {
        self.hios_base_id == hios_base_id
            && self.csr_variant_id.as_deref() == csr_variant_id
            && self.application_period.is_subset_of(year)
    }

    /// Attach a premium table after checking the period invariants
    ///
    /// The table's effective period must lie inside the application period
    /// and must not overlap any table already attached for the same rating
    /// area.
    pub fn add_premium_table(&mut self, table: PremiumTable) -> Result<()> {
        if !table.effective_period.is_subset_of(&self.application_period) {
            return Err(CatalogError::InvalidPeriod {
                hios_id: self.hios_id(),
                period: table.effective_period,
                application_period: self.application_period,
            });
        }
        if let Some(existing) = self
            .premium_tables
            .iter()
            .find(|existing| {
                existing.rating_area_id == table.rating_area_id
                    && existing.effective_period.overlaps(&table.effective_period)
            })
        {
            return Err(CatalogError::Overlap {
                hios_id: self.hios_id(),
                existing: existing.effective_period,
                attempted: table.effective_period,
            });
        }

        self.premium_tables.push(table);
        self.premium_tables
            .sort_by_key(|t| (t.effective_period, t.rating_area_id));
        self.refresh_premium_ages();
        Ok(())
    }

    /// Remove all premium tables
    pub fn clear_premium_tables(&mut self) {
        self.premium_tables.clear();
        self.premium_ages = AgeRange::default();
    }

    /// Premium table for a rating area covering a date
    #[must_use]
    pub fn premium_table_for(&self, rating_area_id: RecordId, date: NaiveDate) -> Option<&PremiumTable> {
        self.premium_tables
            .iter()
            .find(|t| t.rating_area_id == rating_area_id && t.effective_period.contains(date))
    }

    fn refresh_premium_ages(&mut self) {
        let bounds = self
            .premium_tables
            .iter()
            .filter_map(PremiumTable::age_bounds)
            .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)));
        self.premium_ages = match bounds {
            Some((min, max)) => AgeRange { min, max },
            None => AgeRange::default(),
        };
    }
}

impl CatalogRecord for Product {
    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
