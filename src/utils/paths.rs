//! Source file discovery for ingestion stages

use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::error::Result;
use crate::error::util::validate_directory;
use crate::utils::logging::{log_sources_found, log_warning};

/// Extension of workbook directories (one parquet file per sheet)
pub const WORKBOOK_EXTENSION: &str = "workbook";

/// Extension of XML template documents
pub const XML_EXTENSION: &str = "xml";

/// Find the sources with a given extension directly inside a stage directory
///
/// A missing stage directory yields no sources. Results are sorted by path so
/// that runs over the same tree visit files in the same order.
///
/// # Arguments
/// * `dir` - The stage directory
/// * `extension` - Extension to match (without the dot), case-insensitive
pub fn find_stage_sources(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        log_warning("Stage directory not found, skipping", Some(dir));
        return Ok(Vec::new());
    }
    validate_directory(dir, "stage sources")?;

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
        if matches {
            sources.push(path);
        }
    }

    let sources = sources.into_iter().sorted().collect_vec();
    log_sources_found(dir, extension, sources.len());
    Ok(sources)
}

/// Short display name of a source for failure reports
#[must_use]
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
