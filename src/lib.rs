//! A Rust library for ingesting insurance plan, rate and rating-factor
//! documents into a queryable catalog, and for pricing products from it at
//! quote time.

pub mod algorithm;
pub mod builder;
pub mod catalog;
pub mod collections;
pub mod common;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod parser;
pub mod reader;
pub mod service;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use catalog::{Catalog, CatalogStats, FactorCache};
pub use config::{IngestConfig, QuoteConfig, StageDirs};
pub use error::{CatalogError, ParseError, Result, RowFailure};
pub use service::{PlanCatalogService, QuotedProduct};

// Catalog records
pub use models::{
    ActuarialFactor, Address, Area, AreaKind, BenefitMarketKind, CountyZip, FactorInput,
    FactorKind, PremiumTable, Product, ProductKind, RecordId,
};

// Workflows
pub use algorithm::{IngestSummary, QuoteRequest, QuoteResolver, Stage, StageReport, ingest_region};

// Sources
pub use reader::{DocumentSource, FileSystemSource, GridSheet, GridWorkbook, ParquetWorkbook, XmlNode};
pub use utils::dates::DateRange;
