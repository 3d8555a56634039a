use std::collections::BTreeSet;

use plan_catalog::common::traits::RecordCollection;
use plan_catalog::{Address, AreaKind};

use crate::utils::{ISSUER, date, seeded_catalog};

#[test]
fn test_resolve_rating_area_by_zip() {
    let catalog = seeded_catalog();
    let address = Address::new("Hampden", "01001", "MA");

    let area = catalog.resolve_rating_area(&address, date(2024, 6, 1)).unwrap();
    assert_eq!(area.code, "R-MA001");
    assert_eq!(area.kind, AreaKind::Rating);

    let suffolk = Address::new("Suffolk", "02108", "MA");
    assert_eq!(
        catalog.resolve_rating_area(&suffolk, date(2024, 6, 1)).map(|a| a.code.as_str()),
        Some("R-MA002")
    );
}

#[test]
fn test_rating_area_is_year_scoped() {
    let catalog = seeded_catalog();
    let address = Address::new("Hampden", "01001", "MA");
    assert!(catalog.resolve_rating_area(&address, date(2025, 1, 1)).is_none());
}

#[test]
fn test_county_zips_are_normalized_and_unique() {
    let catalog = seeded_catalog();
    // Four distinct triples; the rating area rows reuse them
    assert_eq!(catalog.county_zips().count(), 4);
    let ids = catalog.county_zip_ids_for(&Address::new("Worcester", "01501", "MA"));
    assert_eq!(ids.len(), 1);
}

#[test]
fn test_service_area_rows_union_their_zips() {
    let catalog = seeded_catalog();
    let areas = catalog.areas(AreaKind::Service);
    let west = areas
        .find_first(|area| area.code == "MAS001")
        .unwrap();

    assert_eq!(west.issuer_hios_id.as_deref(), Some(ISSUER));
    assert_eq!(west.title.as_deref(), Some("Western MA"));
    let hampden: BTreeSet<_> = catalog
        .county_zip_ids_in_county("Hampden", "MA", &[])
        .into_iter()
        .collect();
    assert_eq!(west.county_zip_ids.len(), 2);
    assert!(west.county_zip_ids.iter().all(|id| hampden.contains(id)));
}

#[test]
fn test_resolve_service_areas_includes_statewide() {
    let catalog = seeded_catalog();

    let hampden = catalog.resolve_service_areas(&Address::new("Hampden", "01022", "MA"), date(2024, 2, 1));
    let codes: Vec<_> = hampden.iter().map(|area| area.code.as_str()).collect();
    assert_eq!(codes, ["MAS001", "MAS002"]);

    let suffolk = catalog.resolve_service_areas(&Address::new("Suffolk", "02108", "MA"), date(2024, 2, 1));
    let codes: Vec<_> = suffolk.iter().map(|area| area.code.as_str()).collect();
    assert_eq!(codes, ["MAS002"]);
}

#[test]
fn test_rating_area_labels() {
    let catalog = seeded_catalog();
    let index = catalog.rating_area_index(2024);
    let by_code = index.resolve("R-MA001").unwrap();
    assert_eq!(index.resolve("r-ma001"), Some(by_code));
    assert_eq!(index.resolve("Rating Area 1"), Some(by_code));
    assert!(index.resolve("Rating Area 9").is_none());
    assert!(catalog.rating_area_index(2023).is_empty());
}
