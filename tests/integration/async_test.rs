use std::sync::Arc;

use plan_catalog::{Catalog, FileSystemSource, PlanCatalogService, QuoteConfig, Stage};

use crate::utils::{REGION, test_config, write_region};

fn service() -> PlanCatalogService {
    PlanCatalogService::with_catalog(
        Catalog::new(),
        Arc::new(FileSystemSource),
        test_config(),
        QuoteConfig::default(),
    )
}

#[tokio::test]
async fn test_async_ingest_region() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path()).unwrap();

    let service = service();
    let summary = service
        .ingest_region_async(dir.path(), REGION)
        .await
        .unwrap();

    assert!(summary.is_clean());
    assert_eq!(summary.stage(Stage::Rates).unwrap().files, 1);
    let stats = service.stats().unwrap();
    assert_eq!(stats.products, 4);
    assert!(stats.premium_tables > 0);
}

#[tokio::test]
async fn test_async_ingest_missing_region() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    assert!(service.ingest_region_async(dir.path(), "nowhere").await.is_err());
    assert_eq!(service.stats().unwrap().county_zips, 0);
}

#[tokio::test]
async fn test_concurrent_reads_after_ingest() {
    let dir = tempfile::tempdir().unwrap();
    write_region(dir.path()).unwrap();

    let service = Arc::new(service());
    service.ingest_region_async(dir.path(), REGION).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::task::spawn_blocking(move || service.stats().unwrap().products)
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 4);
    }
}
