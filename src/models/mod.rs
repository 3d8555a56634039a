//! Domain models for the plan catalog
//!
//! This module contains the records persisted in the catalog: products with
//! their premium tables, geographic records, and actuarial factor tables.

pub mod factor;
pub mod geography;
pub mod product;
pub mod types;

// Re-export commonly used types
pub use factor::{ActuarialFactor, FactorInput, FactorKind, FactorSnapshot};
pub use geography::{Area, AreaKind, CountyZip};
pub use product::{
    CoverageExample, DentalDetails, HealthDetails, PremiumTable, PremiumTuple, Product,
    ProductDetails, ServiceCost,
};
pub use types::{Address, AgeRange, BenefitMarketKind, ProductKind, RecordId};
