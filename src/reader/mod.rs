//! Document-source readers
//!
//! Ingestion consumes two kinds of sources: workbooks (tabular sheets) and
//! XML template documents. Both are read through the [`DocumentSource`]
//! trait so that the pipeline can run against the file system or against
//! sources assembled in memory.

pub mod sheet;
pub mod workbook;
pub mod xml;

use std::path::Path;

use crate::error::{ParseError, Result};
use crate::error::util::safe_read_to_string;

pub use sheet::{GridSheet, GridWorkbook, HeaderIndex, Sheet, Workbook};
pub use workbook::ParquetWorkbook;
pub use xml::{Fragment, XmlNode};

/// Reader abstraction for the source documents of an ingestion run
pub trait DocumentSource: Send + Sync {
    /// Open a workbook
    fn open_workbook(&self, path: &Path) -> Result<Box<dyn Workbook>>;

    /// Read and parse an XML document
    fn parse_xml(&self, path: &Path) -> Result<XmlNode>;
}

/// Reads workbooks as parquet sheet directories and XML from files
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemSource;

impl DocumentSource for FileSystemSource {
    fn open_workbook(&self, path: &Path) -> Result<Box<dyn Workbook>> {
        Ok(Box::new(ParquetWorkbook::open(path)?))
    }

    fn parse_xml(&self, path: &Path) -> Result<XmlNode> {
        let document = safe_read_to_string(path, "parsing XML template")?;
        XmlNode::parse_str(&document).map_err(|e| {
            ParseError::new(format!("{}:{}", path.display(), e.path), e.message).into()
        })
    }
}
