//! Plan builder
//!
//! Turns parsed plan and benefit templates into products. Every sellable
//! cost-share variance becomes (or updates) one product keyed by
//! `(hios_base_id, csr_variant_id, year)`. Dental products are not variant
//! specific and are keyed by base id alone.

use std::collections::HashMap;

use chrono::Datelike;
use rustc_hash::FxHashMap;

use crate::builder::BuildReport;
use crate::catalog::Catalog;
use crate::common::traits::RecordCollection;
use crate::config::IngestConfig;
use crate::error::{CatalogError, RowFailure};
use crate::loader::{PlanMetadata, PlanMetadataMaps};
use crate::models::{
    BenefitMarketKind, CoverageExample, DentalDetails, FactorKind, FactorSnapshot, HealthDetails,
    Product, ProductDetails, ProductKind, RecordId, ServiceCost,
};
use crate::parser::{CostShareVariance, PackageHeader, PackageRecord, PlanRecord, QhpDocument, Sbc};
use crate::utils::dates::DateRange;
use crate::utils::sanitize::unwrap_currency;

/// Visit type names of the service costs stored on products
mod visit {
    pub const PRIMARY_CARE: &str = "Primary Care Visit to Treat an Injury or Illness";
    pub const HOSPITAL_STAY: &str = "Inpatient Hospital Services (e.g., Hospital Stay)";
    pub const EMERGENCY: &str = "Emergency Room Services";
    pub const PRESCRIPTION: &str = "Generic Drugs";
    pub const BASIC_DENTAL: &str = "Basic Dental Care - Adult";
    pub const MAJOR_DENTAL: &str = "Major Dental Care - Adult";
    pub const PREVENTIVE_DENTAL: &str = "Routine Dental Services (Adult)";
}

/// EHB share used when the template leaves it blank or zero
const DEFAULT_EHB: f64 = 1.0;

/// Group rating factors copied onto products
#[derive(Debug, Clone, Default)]
struct GroupFactors {
    group_size: Option<FactorSnapshot>,
    group_tier: Option<FactorSnapshot>,
    participation: Option<FactorSnapshot>,
}

/// Builds products from plan and benefit templates
///
/// A builder lives for one ingestion stage. It caches the factor snapshots
/// of each `(issuer, year)` and the service area index of each year for
/// its lifetime.
pub struct PlanBuilder<'a> {
    catalog: &'a mut Catalog,
    metadata: &'a PlanMetadataMaps,
    config: &'a IngestConfig,
    factors: FxHashMap<(String, i32), GroupFactors>,
    service_areas: FxHashMap<i32, HashMap<(String, String), RecordId>>,
}

/// Product attributes derived from one variance
struct VarianceInput<'p> {
    header: &'p PackageHeader,
    plan: &'p PlanRecord,
    variance: &'p CostShareVariance,
    kind: ProductKind,
}

impl<'a> PlanBuilder<'a> {
    /// Create a builder writing into a catalog
    pub fn new(catalog: &'a mut Catalog, metadata: &'a PlanMetadataMaps, config: &'a IngestConfig) -> Self {
        Self {
            catalog,
            metadata,
            config,
            factors: FxHashMap::default(),
            service_areas: FxHashMap::default(),
        }
    }

    /// Build every product of a document
    ///
    /// Malformed packages, plans and variances are reported and skipped;
    /// everything else is written.
    pub fn build(&mut self, source: &str, document: &QhpDocument) -> BuildReport {
        let mut report = BuildReport::default();
        report.add_parse_failures(source, &document.failures);
        for package in &document.packages {
            self.build_package(source, package, &mut report);
        }
        report
    }

    fn build_package(&mut self, source: &str, package: &PackageRecord, report: &mut BuildReport) {
        report.add_parse_failures(source, &package.failures);
        for plan in &package.plans {
            report.add_parse_failures(source, &plan.failures);
            let kind = if package.is_dental(plan) {
                ProductKind::Dental
            } else {
                ProductKind::Health
            };
            for variance in &plan.variances {
                let input = VarianceInput {
                    header: &package.header,
                    plan,
                    variance,
                    kind,
                };
                if let Err(e) = self.build_variance(&input, report) {
                    report
                        .failures
                        .push(RowFailure::new(source, variance.plan_id.clone(), e));
                }
            }
        }
    }

    fn build_variance(&mut self, input: &VarianceInput<'_>, report: &mut BuildReport) -> Result<(), CatalogError> {
        let variance = input.variance;
        if variance.is_base_row() {
            report.skipped += 1;
            return Ok(());
        }

        let (hios_base_id, variant) = variance.split_plan_id();
        if self.config.is_excluded(hios_base_id) || self.config.is_excluded(&variance.plan_id) {
            log::debug!("Dropping excluded plan {}", variance.plan_id);
            report.skipped += 1;
            return Ok(());
        }
        let csr_variant_id = match input.kind {
            ProductKind::Dental => None,
            ProductKind::Health => variant.map(str::to_string),
        };

        let active_year = input.plan.attributes.plan_effective_date.year();
        let application_period = DateRange::calendar_year(active_year).ok_or_else(|| {
            CatalogError::validation(format!("plan year {active_year} is out of range"))
        })?;

        let issuer = input.header.issuer_id.clone();
        let factors = self.group_factors(&issuer, active_year);
        let service_area_id = self.service_area_id(&issuer, input.plan, active_year);
        let metadata_maps = self.metadata;
        let metadata = metadata_maps.get(input.kind, hios_base_id, active_year);

        let existing = self
            .catalog
            .find_product(hios_base_id, csr_variant_id.as_deref(), &application_period)
            .map(|product| product.id);

        let products = self.catalog.products_mut();
        let id = match existing {
            Some(id) => {
                report.updated += 1;
                id
            }
            None => {
                report.created += 1;
                products.insert(Product::new(
                    hios_base_id,
                    csr_variant_id,
                    application_period,
                    details(input, metadata),
                ))
            }
        };
        let product = products
            .get_mut(id)
            .ok_or_else(|| CatalogError::validation(format!("product {id} is missing from the catalog")))?;

        product.issuer_hios_ids.insert(issuer);
        apply_attributes(product, input, metadata);
        product.service_area_id = service_area_id.or(product.service_area_id);
        product.group_size_factors = factors.group_size;
        product.group_tier_factors = factors.group_tier;
        product.participation_factors = factors.participation;
        Ok(())
    }

    fn group_factors(&mut self, issuer: &str, active_year: i32) -> GroupFactors {
        let catalog = &*self.catalog;
        self.factors
            .entry((issuer.to_string(), active_year))
            .or_insert_with(|| GroupFactors {
                group_size: catalog.factor_snapshot(FactorKind::GroupSize, issuer, active_year),
                group_tier: catalog.factor_snapshot(FactorKind::CompositeTier, issuer, active_year),
                participation: catalog.factor_snapshot(FactorKind::ParticipationRate, issuer, active_year),
            })
            .clone()
    }

    fn service_area_id(&mut self, issuer: &str, plan: &PlanRecord, active_year: i32) -> Option<RecordId> {
        let code = plan.attributes.service_area_id.as_deref()?;
        let catalog = &*self.catalog;
        let index = self
            .service_areas
            .entry(active_year)
            .or_insert_with(|| catalog.service_area_index(active_year));
        let id = index
            .get(&(issuer.to_string(), code.to_uppercase()))
            .copied();
        if id.is_none() {
            log::warn!(
                "Plan {} names unknown service area {code} for issuer {issuer} in {active_year}",
                plan.attributes.standard_component_id
            );
        }
        id
    }
}

fn service_cost(variance: &CostShareVariance, visit_type: &str) -> ServiceCost {
    variance
        .visit(visit_type)
        .map(|visit| ServiceCost {
            copay: unwrap_currency(visit.copay_in_network.as_deref()),
            coinsurance: unwrap_currency(visit.coinsurance_in_network.as_deref()),
        })
        .unwrap_or_default()
}

fn coinsurance(variance: &CostShareVariance, visit_type: &str) -> Option<String> {
    service_cost(variance, visit_type).coinsurance
}

fn scenario(example: &CoverageExample) -> Option<CoverageExample> {
    let unwrapped = CoverageExample {
        deductible: unwrap_currency(example.deductible.as_deref()),
        copayment: unwrap_currency(example.copayment.as_deref()),
        coinsurance: unwrap_currency(example.coinsurance.as_deref()),
        limit: unwrap_currency(example.limit.as_deref()),
    };
    (unwrapped != CoverageExample::default()).then_some(unwrapped)
}

fn ehb(raw: Option<f64>) -> f64 {
    match raw {
        Some(value) if value > 1.0 => value / 100.0,
        Some(value) if value > 0.0 => value,
        _ => DEFAULT_EHB,
    }
}

/// Kind-specific attributes of a variance
fn details(input: &VarianceInput<'_>, metadata: Option<&PlanMetadata>) -> ProductDetails {
    let attributes = &input.plan.attributes;
    let variance = input.variance;
    match input.kind {
        ProductKind::Health => {
            let sbc = variance.sbc.clone().unwrap_or_else(Sbc::default);
            ProductDetails::Health(HealthDetails {
                plan_type: attributes.plan_type.to_lowercase(),
                ehb: ehb(attributes.ehb_percent_premium),
                primary_care: service_cost(variance, visit::PRIMARY_CARE),
                hospital_stay: service_cost(variance, visit::HOSPITAL_STAY),
                emergency: service_cost(variance, visit::EMERGENCY),
                prescription: service_cost(variance, visit::PRESCRIPTION),
                is_standard_plan: metadata
                    .and_then(|meta| meta.is_standard_plan)
                    .unwrap_or(false),
                rx_formulary_url: metadata.and_then(|meta| meta.rx_formulary_url.clone()),
                having_baby: scenario(&sbc.having_baby),
                having_diabetes: scenario(&sbc.having_diabetes),
                simple_fracture: scenario(&sbc.simple_fracture),
            })
        }
        ProductKind::Dental => ProductDetails::Dental(DentalDetails {
            dental_plan_kind: attributes.plan_type.to_lowercase(),
            dental_level: attributes.metal_level.clone(),
            basic_dental_services: coinsurance(variance, visit::BASIC_DENTAL),
            major_dental_services: coinsurance(variance, visit::MAJOR_DENTAL),
            preventive_dental_services: coinsurance(variance, visit::PREVENTIVE_DENTAL),
        }),
    }
}

/// Overwrite the shared and kind-specific attributes of a product
fn apply_attributes(product: &mut Product, input: &VarianceInput<'_>, metadata: Option<&PlanMetadata>) {
    let attributes = &input.plan.attributes;
    let variance = input.variance;
    let deductible = variance.deductible();

    product.title = if variance.plan_marketing_name.is_empty() {
        attributes.plan_marketing_name.clone()
    } else {
        variance.plan_marketing_name.clone()
    };
    product.metal_level = if variance.metal_level.is_empty() {
        attributes.metal_level.clone()
    } else {
        variance.metal_level.clone()
    };
    product.deductible = deductible.and_then(|d| unwrap_currency(d.in_network_individual.as_deref()));
    product.family_deductible = deductible.and_then(|d| unwrap_currency(d.in_network_family.as_deref()));
    product.out_of_pocket_in_network = variance
        .moop()
        .and_then(|m| unwrap_currency(m.in_network_individual.as_deref()));

    let market_coverage = attributes
        .market_coverage
        .as_deref()
        .unwrap_or(&input.header.market_coverage);
    product.benefit_market_kind = BenefitMarketKind::from_market_coverage(market_coverage);
    product.hsa_eligible = attributes.hsa_eligible;
    product.details = details(input, metadata);

    if let Some(meta) = metadata {
        product
            .product_package_kinds
            .extend(meta.product_package_kinds.iter().cloned());
        if let Some(hsa) = meta.hsa_eligible {
            product.hsa_eligible = hsa;
        }
        if meta.network_information.is_some() {
            product.network_information = meta.network_information.clone();
        }
        if meta.provider_directory_url.is_some() {
            product.provider_directory_url = meta.provider_directory_url.clone();
        }
    }
}
