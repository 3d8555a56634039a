use std::fs;

use plan_catalog::common::traits::RecordCollection;
use plan_catalog::{
    Address, AreaKind, Catalog, CatalogError, DateRange, FileSystemSource, IngestConfig, Stage,
    ingest_region,
};

use crate::utils::{REGION, date, test_config, write_region};

#[test]
fn test_ingest_region_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path()).unwrap();

    let mut catalog = Catalog::new();
    let summary = ingest_region(dir.path(), REGION, &FileSystemSource, &test_config(), &mut catalog).unwrap();

    assert!(summary.is_clean(), "{:?}", summary.failures().collect::<Vec<_>>());
    assert_eq!(summary.stages.len(), 6);
    let order: Vec<Stage> = summary.stages.iter().map(|report| report.stage).collect();
    assert_eq!(order, Stage::ALL);

    let stats = catalog.stats();
    assert_eq!(stats.county_zips, 4);
    assert_eq!(stats.rating_areas, 3);
    assert_eq!(stats.service_areas, 2);
    assert_eq!(stats.factors, 4);
    assert_eq!(stats.products, 4);

    assert_eq!(summary.stage(Stage::Plans).unwrap().skipped, 1);
    let rating_area = catalog
        .resolve_rating_area(&Address::new("Hampden", "01001", "MA"), date(2024, 3, 1))
        .unwrap();
    assert_eq!(rating_area.code, "R-MA001");

    let year = DateRange::calendar_year(2024).unwrap();
    let bronze = catalog.find_product("12345MA0010001", Some("01"), &year).unwrap();
    assert_eq!(bronze.premium_tables.len(), 2);
    assert!(bronze.product_package_kinds.contains("metal_level"));
}

#[test]
fn test_reingesting_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path()).unwrap();
    let config = test_config();

    let mut catalog = Catalog::new();
    ingest_region(dir.path(), REGION, &FileSystemSource, &config, &mut catalog).unwrap();
    let first = catalog.to_json().unwrap();

    let summary = ingest_region(dir.path(), REGION, &FileSystemSource, &config, &mut catalog).unwrap();
    assert!(summary.is_clean());
    assert_eq!(summary.stage(Stage::CountyZips).unwrap().written, 0);
    assert_eq!(summary.stage(Stage::Factors).unwrap().written, 0);
    assert_eq!(catalog.to_json().unwrap(), first);
}

#[test]
fn test_sequential_and_parallel_parsing_agree() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path()).unwrap();

    let mut parallel = Catalog::new();
    ingest_region(dir.path(), REGION, &FileSystemSource, &test_config(), &mut parallel).unwrap();

    let sequential_config = IngestConfig {
        parallel_files: false,
        ..test_config()
    };
    let mut sequential = Catalog::new();
    ingest_region(dir.path(), REGION, &FileSystemSource, &sequential_config, &mut sequential).unwrap();

    assert_eq!(parallel.to_json().unwrap(), sequential.to_json().unwrap());
}

#[test]
fn test_missing_stage_directory_is_empty_stage() {
    let dir = tempfile::tempdir().unwrap();
    let region = write_region(dir.path()).unwrap();
    fs::remove_dir_all(region.join("rates")).unwrap();

    let mut catalog = Catalog::new();
    let summary = ingest_region(dir.path(), REGION, &FileSystemSource, &test_config(), &mut catalog).unwrap();
    let rates = summary.stage(Stage::Rates).unwrap();
    assert_eq!(rates.files, 0);
    assert!(catalog.products().all().iter().all(|p| p.premium_tables.is_empty()));
}

#[test]
fn test_missing_region_fails_before_any_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = Catalog::new();
    let err = ingest_region(dir.path(), "nowhere", &FileSystemSource, &test_config(), &mut catalog).unwrap_err();
    assert!(!matches!(err, CatalogError::StageFailed { .. }));
    assert_eq!(catalog.stats().county_zips, 0);
}

#[test]
fn test_malformed_document_is_a_row_failure() {
    let dir = tempfile::tempdir().unwrap();
    let region = write_region(dir.path()).unwrap();
    fs::write(region.join("plans").join("broken.xml"), "<planBenefitTemplateVO><header>").unwrap();

    let mut catalog = Catalog::new();
    let summary = ingest_region(dir.path(), REGION, &FileSystemSource, &test_config(), &mut catalog).unwrap();
    let plans = summary.stage(Stage::Plans).unwrap();
    assert_eq!(plans.files, 3);
    assert_eq!(plans.failures.len(), 1);
    assert_eq!(plans.failures[0].source, "broken.xml");
    assert_eq!(catalog.stats().products, 4);
}

#[test]
fn test_unreadable_workbook_stops_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let region = write_region(dir.path()).unwrap();
    let sheet = region.join("factors").join("factors.workbook").join("GroupSize.parquet");
    fs::write(&sheet, b"not parquet").unwrap();

    let mut catalog = Catalog::new();
    let err = ingest_region(dir.path(), REGION, &FileSystemSource, &test_config(), &mut catalog).unwrap_err();
    assert!(matches!(err, CatalogError::StageFailed { stage: "actuarial factors", .. }));
    assert!(!err.is_client_error());

    // Earlier stages stay committed
    assert_eq!(catalog.stats().county_zips, 4);
    assert_eq!(catalog.areas(AreaKind::Rating).count(), 3);
    assert_eq!(catalog.stats().products, 0);
}
