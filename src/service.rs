//! Catalog service facade
//!
//! [`PlanCatalogService`] is what an API layer holds: a shared catalog, the
//! factor cache quote requests read, and the ingestion entry points. Reads
//! take the catalog lock shared; ingestion takes it exclusively and rebuilds
//! the factor cache afterwards, whether or not every stage succeeded.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::algorithm::ingest::{IngestSummary, ingest_region};
use crate::algorithm::quote::{QuoteRequest, QuoteResolver};
use crate::catalog::{Catalog, CatalogStats, FactorCache};
use crate::config::{IngestConfig, QuoteConfig};
use crate::error::util::safe_read_to_string;
use crate::error::{CatalogError, Result};
use crate::models::{Address, Area, Product, ProductKind, RecordId};
use crate::reader::{DocumentSource, FileSystemSource};
use crate::utils::dates::DateRange;

/// A priced product of a quote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotedProduct {
    pub product_id: RecordId,
    pub hios_id: String,
    pub title: String,
    pub metal_level: String,
    /// Monthly premium for the request
    pub price: f64,
}

/// Shared, lock-protected catalog with ingestion and quoting
pub struct PlanCatalogService {
    catalog: Arc<RwLock<Catalog>>,
    factors: Arc<RwLock<FactorCache>>,
    source: Arc<dyn DocumentSource>,
    ingest_config: IngestConfig,
    quote_config: QuoteConfig,
}

impl PlanCatalogService {
    /// Create a service over an empty catalog reading from the file system
    #[must_use]
    pub fn new(ingest_config: IngestConfig, quote_config: QuoteConfig) -> Self {
        Self::with_catalog(
            Catalog::new(),
            Arc::new(FileSystemSource),
            ingest_config,
            quote_config,
        )
    }

    /// Create a service over an existing catalog and document source
    #[must_use]
    pub fn with_catalog(
        catalog: Catalog,
        source: Arc<dyn DocumentSource>,
        ingest_config: IngestConfig,
        quote_config: QuoteConfig,
    ) -> Self {
        let factors = FactorCache::build(&catalog, quote_config.factor_cache_ttl);
        log::info!("{quote_config}");
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            factors: Arc::new(RwLock::new(factors)),
            source,
            ingest_config,
            quote_config,
        }
    }

    /// Ingest a region synchronously
    ///
    /// # Arguments
    /// * `root` - Directory holding one sub-directory per region
    /// * `region` - Region directory name
    pub fn ingest_region(&self, root: &Path, region: &str) -> Result<IngestSummary> {
        run_ingestion(
            &self.catalog,
            &self.factors,
            self.source.as_ref(),
            &self.ingest_config,
            root,
            region,
        )
    }

    /// Ingest a region on the blocking thread pool
    pub async fn ingest_region_async(
        &self,
        root: impl Into<PathBuf>,
        region: impl Into<String>,
    ) -> Result<IngestSummary> {
        let catalog = Arc::clone(&self.catalog);
        let factors = Arc::clone(&self.factors);
        let source = Arc::clone(&self.source);
        let config = self.ingest_config.clone();
        let root = root.into();
        let region = region.into();

        tokio::task::spawn_blocking(move || {
            run_ingestion(&catalog, &factors, source.as_ref(), &config, &root, &region)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Rating area of an address on a date
    pub fn resolve_rating_area(&self, address: &Address, date: NaiveDate) -> Result<Option<Area>> {
        Ok(self.read()?.resolve_rating_area(address, date).cloned())
    }

    /// Service areas covering an address on a date
    pub fn resolve_service_areas(&self, address: &Address, date: NaiveDate) -> Result<Vec<Area>> {
        Ok(self
            .read()?
            .resolve_service_areas(address, date)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Products of a kind offered at an address during the date's year
    pub fn find_products(
        &self,
        kind: ProductKind,
        address: &Address,
        date: NaiveDate,
    ) -> Result<Vec<Product>> {
        let catalog = self.read()?;
        let Some(year) = DateRange::calendar_year(date.year()) else {
            return Err(CatalogError::validation(format!("no calendar year for {date}")));
        };
        let service_areas = catalog
            .resolve_service_areas(address, date)
            .into_iter()
            .map(|area| area.id)
            .collect();
        Ok(catalog
            .find_products(kind, &service_areas, &year)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Price one product
    pub fn price_product(&self, product_id: RecordId, request: &QuoteRequest) -> Result<f64> {
        let catalog = self.read()?;
        let factors = self.factor_cache()?;
        QuoteResolver::new(&catalog, &factors).price_product_id(product_id, request)
    }

    /// Price every product of a kind offered at an address
    ///
    /// Products without a premium for the request are left out of the
    /// quote. Results are sorted by price.
    pub fn quote(
        &self,
        kind: ProductKind,
        address: &Address,
        request: &QuoteRequest,
    ) -> Result<Vec<QuotedProduct>> {
        let products = self.find_products(kind, address, request.effective_date)?;
        let catalog = self.read()?;
        let factors = self.factor_cache()?;
        let mut resolver = QuoteResolver::new(&catalog, &factors);

        let mut quoted = Vec::with_capacity(products.len());
        for product in &products {
            match resolver.price_product(product, request) {
                Ok(price) => quoted.push(QuotedProduct {
                    product_id: product.id,
                    hios_id: product.hios_id(),
                    title: product.title.clone(),
                    metal_level: product.metal_level.clone(),
                    price,
                }),
                Err(e) if e.is_client_error() => {
                    log::debug!("Leaving {} out of the quote: {e}", product.hios_id());
                }
                Err(e) => return Err(e),
            }
        }
        quoted.sort_by(|a, b| a.price.total_cmp(&b.price));
        Ok(quoted)
    }

    /// Rebuild the factor cache from the current catalog
    pub fn rebuild_factor_cache(&self) -> Result<()> {
        let catalog = self.read()?;
        rebuild(&self.factors, &catalog)
    }

    /// Whether the factor cache has outlived its TTL
    pub fn factor_cache_is_stale(&self) -> Result<bool> {
        Ok(self.factor_cache()?.is_stale())
    }

    /// Record counts of the catalog
    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(self.read()?.stats())
    }

    /// Write the catalog to a JSON snapshot file
    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        let json = self.read()?.to_json()?;
        fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("Failed to write snapshot {}: {}", path.display(), e))?;
        log::info!("Wrote catalog snapshot to {}", path.display());
        Ok(())
    }

    /// Replace the catalog with a JSON snapshot file
    pub fn load_snapshot(&self, path: &Path) -> Result<()> {
        let json = safe_read_to_string(path, "loading catalog snapshot")?;
        let restored = Catalog::from_json(&json)?;
        let mut catalog = self.write()?;
        *catalog = restored;
        rebuild(&self.factors, &catalog)?;
        log::info!("Loaded catalog snapshot from {}", path.display());
        Ok(())
    }

    /// Quote settings of the service
    #[must_use]
    pub fn quote_config(&self) -> &QuoteConfig {
        &self.quote_config
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock on catalog").into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire write lock on catalog").into())
    }

    fn factor_cache(&self) -> Result<RwLockReadGuard<'_, FactorCache>> {
        self.factors
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock on factor cache").into())
    }
}

fn run_ingestion(
    catalog: &RwLock<Catalog>,
    factors: &RwLock<FactorCache>,
    source: &dyn DocumentSource,
    config: &IngestConfig,
    root: &Path,
    region: &str,
) -> Result<IngestSummary> {
    let mut catalog = catalog
        .write()
        .map_err(|_| anyhow::anyhow!("Failed to acquire write lock on catalog"))?;
    let summary = ingest_region(root, region, source, config, &mut catalog);
    rebuild(factors, &catalog)?;
    summary
}

fn rebuild(factors: &RwLock<FactorCache>, catalog: &Catalog) -> Result<()> {
    factors
        .write()
        .map_err(|_| anyhow::anyhow!("Failed to acquire write lock on factor cache"))?
        .rebuild(catalog);
    Ok(())
}
