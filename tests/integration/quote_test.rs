use std::sync::Arc;

use plan_catalog::{
    Address, Catalog, FileSystemSource, PlanCatalogService, ProductKind, QuoteConfig, QuoteRequest,
    RecordId,
};

use crate::utils::{REGION, date, test_config, write_region};

fn ingested_service() -> (tempfile::TempDir, PlanCatalogService) {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path()).unwrap();
    let service = PlanCatalogService::with_catalog(
        Catalog::new(),
        Arc::new(FileSystemSource),
        test_config(),
        QuoteConfig::default(),
    );
    service.ingest_region(dir.path(), REGION).unwrap();
    (dir, service)
}

fn rating_area(service: &PlanCatalogService, address: &Address) -> RecordId {
    service
        .resolve_rating_area(address, date(2024, 2, 1))
        .unwrap()
        .unwrap()
        .id
}

#[test]
fn test_shop_quote_applies_group_factors() {
    let (_dir, service) = ingested_service();
    let address = Address::new("Hampden", "01001", "MA");
    let request = QuoteRequest::new(rating_area(&service, &address), date(2024, 2, 1), 40)
        .with_group(75, 97.4, "0111");

    let products = service.find_products(ProductKind::Health, &address, date(2024, 2, 1)).unwrap();
    let bronze = products
        .iter()
        .find(|p| p.hios_id() == "12345MA0010001-01")
        .unwrap();

    let price = service.price_product(bronze.id, &request).unwrap();
    assert!((price - 300.0 * 0.9 * 0.95 * 1.2).abs() < 1e-9);
}

#[test]
fn test_shop_quote_applies_composite_tier() {
    let (_dir, service) = ingested_service();
    let address = Address::new("Hampden", "01001", "MA");
    let request = QuoteRequest::new(rating_area(&service, &address), date(2024, 2, 1), 40)
        .with_composite_tier("Employee + Spouse");

    let products = service.find_products(ProductKind::Health, &address, date(2024, 2, 1)).unwrap();
    let bronze = products
        .iter()
        .find(|p| p.hios_id() == "12345MA0010001-01")
        .unwrap();
    assert_eq!(service.price_product(bronze.id, &request).unwrap(), 600.0);
}

#[test]
fn test_individual_quote_is_base_premium() {
    let (_dir, service) = ingested_service();
    let address = Address::new("Hampden", "01001", "MA");
    let request = QuoteRequest::new(rating_area(&service, &address), date(2024, 2, 1), 40)
        .with_group(75, 97.4, "0111");

    let products = service.find_products(ProductKind::Health, &address, date(2024, 2, 1)).unwrap();
    let gold = products
        .iter()
        .find(|p| p.hios_id() == "12345MA0010002-01")
        .unwrap();
    assert_eq!(service.price_product(gold.id, &request).unwrap(), 450.0);
}

#[test]
fn test_quote_lists_priced_products() {
    let (_dir, service) = ingested_service();
    let address = Address::new("Hampden", "01022", "MA");
    let request = QuoteRequest::new(rating_area(&service, &address), date(2024, 5, 1), 21);

    let quoted = service.quote(ProductKind::Health, &address, &request).unwrap();
    let ids: Vec<&str> = quoted.iter().map(|q| q.hios_id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(quoted.windows(2).all(|pair| pair[0].price <= pair[1].price));
    assert_eq!(quoted[0].price, 275.0);
    assert_eq!(quoted.last().unwrap().hios_id, "12345MA0010002-01");
}

#[test]
fn test_service_areas_limit_products() {
    let (_dir, service) = ingested_service();
    // Suffolk is only in the statewide service area
    let suffolk = Address::new("Suffolk", "02108", "MA");
    let products = service.find_products(ProductKind::Health, &suffolk, date(2024, 2, 1)).unwrap();
    let ids: Vec<String> = products.iter().map(|p| p.hios_id()).collect();
    assert_eq!(ids, ["12345MA0010002-01"]);

    let dental = service.find_products(ProductKind::Dental, &suffolk, date(2024, 2, 1)).unwrap();
    assert_eq!(dental.len(), 1);
}

#[test]
fn test_rebuilt_factor_cache_is_fresh() {
    let (_dir, service) = ingested_service();
    service.rebuild_factor_cache().unwrap();
    assert!(!service.factor_cache_is_stale().unwrap());
}
