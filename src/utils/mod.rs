//! Shared utilities: value sanitizing, dates, logging and file discovery

pub mod dates;
pub mod logging;
pub mod paths;
pub mod sanitize;

pub use dates::{DateRange, parse_date, quarter_of};
pub use paths::{find_stage_sources, source_name};
