//! Catalog workflows
//!
//! * [`ingest`] runs the six ingestion stages of a region
//! * [`quote`] prices products at quote time

pub mod ingest;
pub mod quote;

pub use ingest::{IngestSummary, Stage, StageReport, ingest_region};
pub use quote::{QuoteRequest, QuoteResolver};
