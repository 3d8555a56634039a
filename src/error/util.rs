//! Utility functions for error handling
//!
//! File and directory access with error messages that say what the file was
//! needed for.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{CatalogError, Result};

fn io_error(kind: io::ErrorKind, path: &Path, context: String) -> CatalogError {
    CatalogError::Io(io::Error::new(
        kind,
        format!("{context}: {}", path.display()),
    ))
}

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
///
/// # Returns
/// * `Result<fs::File>` - The opened file or a detailed error
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(io_error(
            io::ErrorKind::NotFound,
            path,
            format!("File not found (needed for: {purpose})"),
        ));
    }

    if !path.is_file() {
        return Err(io_error(
            io::ErrorKind::InvalidInput,
            path,
            format!("Path is not a file (expected a file for: {purpose})"),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => {
                "Permission denied - check file permissions".to_string()
            }
            _ => format!("Failed to open file for: {purpose}"),
        };
        io_error(e.kind(), path, context)
    })
}

/// Check if a directory exists and is readable, with rich error information
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(io_error(
            io::ErrorKind::NotFound,
            path,
            format!("Directory not found (needed for: {purpose})"),
        ));
    }

    if !path.is_dir() {
        return Err(io_error(
            io::ErrorKind::InvalidInput,
            path,
            format!("Path is not a directory (expected a directory for: {purpose})"),
        ));
    }

    match fs::read_dir(path) {
        Ok(_) => Ok(()),
        Err(e) => {
            let context = match e.kind() {
                io::ErrorKind::PermissionDenied => {
                    "Permission denied - check directory permissions".to_string()
                }
                _ => format!("Failed to access directory for: {purpose}"),
            };
            Err(io_error(e.kind(), path, context))
        }
    }
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    match io::Read::read_to_string(&mut file, &mut content) {
        Ok(_) => Ok(content),
        Err(e) => {
            let context = match e.kind() {
                io::ErrorKind::InvalidData => {
                    "File contains invalid UTF-8 data - cannot read as text".to_string()
                }
                _ => format!("Failed to read file content for: {purpose}"),
            };
            Err(io_error(e.kind(), path, context))
        }
    }
}
