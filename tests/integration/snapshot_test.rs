use std::sync::Arc;

use plan_catalog::{
    Address, Catalog, DateRange, FileSystemSource, PlanCatalogService, QuoteConfig, QuoteRequest,
};

use crate::utils::{REGION, date, test_config, write_region};

#[test]
fn test_json_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path()).unwrap();
    let service = PlanCatalogService::with_catalog(
        Catalog::new(),
        Arc::new(FileSystemSource),
        test_config(),
        QuoteConfig::default(),
    );
    service.ingest_region(dir.path(), REGION).unwrap();

    let snapshot = dir.path().join("catalog.json");
    service.write_snapshot(&snapshot).unwrap();

    let restored = PlanCatalogService::new(test_config(), QuoteConfig::default());
    restored.load_snapshot(&snapshot).unwrap();
    assert_eq!(restored.stats().unwrap(), service.stats().unwrap());

    // Quotes survive the round trip, factor cache included
    let address = Address::new("Hampden", "01001", "MA");
    let area = restored
        .resolve_rating_area(&address, date(2024, 2, 1))
        .unwrap()
        .unwrap();
    let request = QuoteRequest::new(area.id, date(2024, 2, 1), 40).with_group(20, 97.0, "0111");
    let products = restored
        .find_products(plan_catalog::ProductKind::Health, &address, date(2024, 2, 1))
        .unwrap();
    let bronze = products.iter().find(|p| p.hios_id() == "12345MA0010001-01").unwrap();
    let before = service.price_product(bronze.id, &request).unwrap();
    assert_eq!(restored.price_product(bronze.id, &request).unwrap(), before);
}

#[test]
fn test_restored_catalog_keeps_issuing_new_ids() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path()).unwrap();
    let mut catalog = Catalog::new();
    plan_catalog::ingest_region(dir.path(), REGION, &FileSystemSource, &test_config(), &mut catalog).unwrap();

    let mut restored = Catalog::from_json(&catalog.to_json().unwrap()).unwrap();
    let id = restored.upsert_county_zip("Berkshire", "01201", "MA");
    assert!(catalog.county_zips().iter().all(|record| record.id < id));

    let year = DateRange::calendar_year(2024).unwrap();
    assert_eq!(
        restored.find_product("12345MA0020001", None, &year).map(|p| p.hios_id()),
        Some("12345MA0020001".to_string())
    );
}
