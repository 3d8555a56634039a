use plan_catalog::builder::{PlanBuilder, build_rates};
use plan_catalog::loader::PlanMetadataMaps;
use plan_catalog::parser::{QhpDocument, parse_rate_groups};
use plan_catalog::{Catalog, DateRange, IngestConfig, Product};

use crate::utils::{date, dental_document, health_document, rate_document, seeded_catalog, xml};

fn catalog_with_products() -> Catalog {
    let mut catalog = seeded_catalog();
    let metadata = PlanMetadataMaps::default();
    let config = IngestConfig::default();
    for document in [health_document(), dental_document()] {
        let root = xml(&document);
        let document = QhpDocument::parse_document(&root).unwrap();
        PlanBuilder::new(&mut catalog, &metadata, &config).build("plans.xml", &document);
    }
    catalog
}

fn rate_sources(document: &str) -> Vec<(String, Vec<plan_catalog::parser::RateGroup>)> {
    let root = xml(document);
    vec![("rates.xml".to_string(), parse_rate_groups(&root).unwrap())]
}

fn product<'a>(catalog: &'a Catalog, base: &str, variant: Option<&str>) -> &'a Product {
    let year = DateRange::calendar_year(2024).unwrap();
    catalog.find_product(base, variant, &year).unwrap()
}

#[test]
fn test_rates_attach_to_every_variant() {
    let mut catalog = catalog_with_products();
    let report = build_rates(&mut catalog, &rate_sources(&rate_document()));
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    for variant in ["01", "04"] {
        let bronze = product(&catalog, "12345MA0010001", Some(variant));
        assert_eq!(bronze.premium_tables.len(), 2);
        assert_eq!(bronze.premium_ages.min, 14);
        assert_eq!(bronze.premium_ages.max, 64);
    }
}

#[test]
fn test_bucket_and_single_ages_share_a_table() {
    let mut catalog = catalog_with_products();
    build_rates(&mut catalog, &rate_sources(&rate_document()));

    let bronze = product(&catalog, "12345MA0010001", Some("01"));
    let area = catalog.rating_area_index(2024).resolve("R-MA001").unwrap();
    let table = bronze.premium_table_for(area, date(2024, 2, 1)).unwrap();
    let ages: Vec<u32> = table.premium_tuples.iter().map(|t| t.age).collect();
    assert_eq!(ages, [14, 15, 21, 40, 64]);
    assert_eq!(table.tuple_for_age(14).unwrap().cost, 150.0);
    assert_eq!(table.tuple_for_age(15).unwrap().cost, 160.0);

    let later = bronze.premium_table_for(area, date(2024, 7, 1)).unwrap();
    assert_eq!(later.tuple_for_age(21).unwrap().cost, 275.0);
}

#[test]
fn test_display_labels_and_multi_area_rows() {
    let mut catalog = catalog_with_products();
    build_rates(&mut catalog, &rate_sources(&rate_document()));
    let index = catalog.rating_area_index(2024);

    let gold = product(&catalog, "12345MA0010002", Some("01"));
    assert_eq!(gold.premium_tables.len(), 1);
    assert_eq!(gold.premium_tables[0].rating_area_id, index.resolve("R-MA001").unwrap());

    let dental = product(&catalog, "12345MA0020001", None);
    assert_eq!(dental.premium_tables.len(), 2);
}

#[test]
fn test_rerunning_rates_is_idempotent() {
    let mut catalog = catalog_with_products();
    let sources = rate_sources(&rate_document());
    build_rates(&mut catalog, &sources);
    let first = product(&catalog, "12345MA0010001", Some("01")).premium_tables.clone();

    let report = build_rates(&mut catalog, &sources);
    assert!(report.failures.is_empty());
    assert_eq!(product(&catalog, "12345MA0010001", Some("01")).premium_tables, first);
}

#[test]
fn test_unknown_area_and_plan_are_failures() {
    let mut catalog = catalog_with_products();
    let document = "<qhpApplicationRateGroupVO><items>\
        <qhpApplicationRateItemVO><planId>12345MA0010001</planId><rateAreaId>R-MA009</rateAreaId>\
          <ageNumber>21</ageNumber><effectiveDate>2024-01-01</effectiveDate>\
          <expirationDate>2024-12-31</expirationDate><primaryEnrollee>100</primaryEnrollee>\
        </qhpApplicationRateItemVO>\
        <qhpApplicationRateItemVO><planId>99999MA0010001</planId><rateAreaId>R-MA001</rateAreaId>\
          <ageNumber>21</ageNumber><effectiveDate>2024-01-01</effectiveDate>\
          <expirationDate>2024-12-31</expirationDate><primaryEnrollee>100</primaryEnrollee>\
        </qhpApplicationRateItemVO>\
        </items></qhpApplicationRateGroupVO>";

    let report = build_rates(&mut catalog, &rate_sources(document));
    assert_eq!(report.created, 0);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.error.is_client_error()));
}

#[test]
fn test_overlapping_periods_are_rejected() {
    let mut catalog = catalog_with_products();
    let document = "<qhpApplicationRateGroupVO><items>\
        <qhpApplicationRateItemVO><planId>12345MA0010002</planId><rateAreaId>R-MA002</rateAreaId>\
          <ageNumber>21</ageNumber><effectiveDate>2024-01-01</effectiveDate>\
          <expirationDate>2024-06-30</expirationDate><primaryEnrollee>100</primaryEnrollee>\
        </qhpApplicationRateItemVO>\
        <qhpApplicationRateItemVO><planId>12345MA0010002</planId><rateAreaId>R-MA002</rateAreaId>\
          <ageNumber>21</ageNumber><effectiveDate>2024-06-01</effectiveDate>\
          <expirationDate>2024-12-31</expirationDate><primaryEnrollee>110</primaryEnrollee>\
        </qhpApplicationRateItemVO>\
        </items></qhpApplicationRateGroupVO>";

    let report = build_rates(&mut catalog, &rate_sources(document));
    assert_eq!(report.created, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, plan_catalog::CatalogError::Overlap { .. }));
}
