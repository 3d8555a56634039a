use plan_catalog::builder::PlanBuilder;
use plan_catalog::common::traits::RecordCollection;
use plan_catalog::loader::{PlanMetadataMaps, parse_plan_metadata};
use plan_catalog::models::{ProductDetails, ProductKind};
use plan_catalog::parser::QhpDocument;
use plan_catalog::{BenefitMarketKind, Catalog, DateRange, IngestConfig};

use crate::utils::{ISSUER, dental_document, health_document, metadata_workbook, seeded_catalog, xml};

fn metadata() -> PlanMetadataMaps {
    let mut maps = PlanMetadataMaps::default();
    for (kind, parsed) in parse_plan_metadata(&metadata_workbook(), "metadata").unwrap() {
        maps.extend(kind, parsed.rows);
    }
    maps
}

fn build(catalog: &mut Catalog, document: &str, config: &IngestConfig) -> plan_catalog::builder::BuildReport {
    let root = xml(document);
    let document = QhpDocument::parse_document(&root).unwrap();
    let metadata = metadata();
    PlanBuilder::new(catalog, &metadata, config).build("plans.xml", &document)
}

fn year() -> DateRange {
    DateRange::calendar_year(2024).unwrap()
}

#[test]
fn test_base_rows_are_skipped() {
    let mut catalog = seeded_catalog();
    let report = build(&mut catalog, &health_document(), &IngestConfig::default());

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.created, 3);
    assert_eq!(report.skipped, 1);
    assert!(catalog.find_product("12345MA0010001", Some("00"), &year()).is_none());
    assert!(catalog.find_product("12345MA0010001", Some("01"), &year()).is_some());
    assert!(catalog.find_product("12345MA0010001", Some("04"), &year()).is_some());
}

#[test]
fn test_product_attributes() {
    let mut catalog = seeded_catalog();
    build(&mut catalog, &health_document(), &IngestConfig::default());

    let product = catalog.find_product("12345MA0010001", Some("01"), &year()).unwrap();
    assert_eq!(product.hios_id(), "12345MA0010001-01");
    assert_eq!(product.title, "Bay State Bronze");
    assert_eq!(product.metal_level, "bronze");
    assert_eq!(product.benefit_market_kind, BenefitMarketKind::Shop);
    assert!(product.issuer_hios_ids.contains(ISSUER));
    assert_eq!(product.deductible.as_deref(), Some("2000"));
    assert_eq!(product.family_deductible.as_deref(), Some("4000"));
    assert_eq!(product.out_of_pocket_in_network.as_deref(), Some("7000"));
    assert!(product.group_size_factors.is_some());
    assert!(product.participation_factors.is_some());
    assert!(product.group_tier_factors.is_some());

    let service_area = catalog.areas(plan_catalog::AreaKind::Service).get(product.service_area_id.unwrap()).unwrap();
    assert_eq!(service_area.code, "MAS001");

    let ProductDetails::Health(details) = &product.details else {
        panic!("expected health details");
    };
    assert_eq!(details.plan_type, "hmo");
    assert!((details.ehb - 0.995).abs() < 1e-9);
    assert_eq!(details.primary_care.copay.as_deref(), Some("25"));
    assert_eq!(details.primary_care.coinsurance.as_deref(), Some("20%"));
    assert_eq!(details.having_baby.as_ref().and_then(|e| e.deductible.as_deref()), Some("2000"));
    assert!(details.having_diabetes.is_none());
}

#[test]
fn test_market_coverage_and_metadata() {
    let mut catalog = seeded_catalog();
    build(&mut catalog, &health_document(), &IngestConfig::default());

    let gold = catalog.find_product("12345MA0010002", Some("01"), &year()).unwrap();
    assert_eq!(gold.benefit_market_kind, BenefitMarketKind::Individual);
    assert!(gold.product_package_kinds.is_empty());

    let bronze = catalog.find_product("12345MA0010001", Some("04"), &year()).unwrap();
    assert!(bronze.hsa_eligible);
    assert!(bronze.product_package_kinds.contains("metal_level"));
    assert!(bronze.product_package_kinds.contains("single_issuer"));
    assert_eq!(bronze.network_information.as_deref(), Some("Broad network"));
    let ProductDetails::Health(details) = &bronze.details else {
        panic!("expected health details");
    };
    assert!(details.is_standard_plan);
    assert_eq!(details.rx_formulary_url.as_deref(), Some("https://example.com/formulary"));
}

#[test]
fn test_dental_products_have_no_variant() {
    let mut catalog = seeded_catalog();
    let report = build(&mut catalog, &dental_document(), &IngestConfig::default());
    assert_eq!(report.created, 1);

    let dental = catalog.find_product("12345MA0020001", None, &year()).unwrap();
    assert_eq!(dental.kind(), ProductKind::Dental);
    assert_eq!(dental.hios_id(), "12345MA0020001");
    let ProductDetails::Dental(details) = &dental.details else {
        panic!("expected dental details");
    };
    assert_eq!(details.dental_level, "high");
    assert_eq!(details.major_dental_services.as_deref(), Some("50%"));
}

#[test]
fn test_rebuilding_updates_in_place() {
    let mut catalog = seeded_catalog();
    build(&mut catalog, &health_document(), &IngestConfig::default());
    let count = catalog.products().count();

    let report = build(&mut catalog, &health_document(), &IngestConfig::default());
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 3);
    assert_eq!(catalog.products().count(), count);
}

#[test]
fn test_excluded_plans_are_dropped() {
    let mut catalog = seeded_catalog();
    let config = IngestConfig {
        excluded_plan_ids: vec!["12345MA0010002".to_string()],
        ..IngestConfig::default()
    };
    let report = build(&mut catalog, &health_document(), &config);
    assert_eq!(report.created, 2);
    assert_eq!(report.skipped, 2);
    assert!(catalog.find_product("12345MA0010002", Some("01"), &year()).is_none());
}
