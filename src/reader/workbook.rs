//! Parquet-backed workbooks
//!
//! A workbook is a directory ending in `.workbook` that holds one
//! `<sheet>.parquet` file per sheet. Column names form the first sheet row
//! and every column is cast to UTF-8, so numeric and date columns read the
//! same way as text columns.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::kernels::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use itertools::Itertools;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::Result;
use crate::error::util::{safe_open_file, validate_directory};
use crate::reader::sheet::{GridSheet, GridWorkbook, Sheet, Workbook};
use crate::utils::logging::log_warning;

/// Extension of a sheet file inside a workbook directory
const SHEET_EXTENSION: &str = "parquet";

/// A workbook read from a directory of parquet sheets
#[derive(Debug, Clone)]
pub struct ParquetWorkbook {
    path: PathBuf,
    sheets: GridWorkbook,
}

impl ParquetWorkbook {
    /// Read every sheet of a workbook directory
    pub fn open(path: &Path) -> Result<Self> {
        validate_directory(path, "reading workbook")?;

        let sheet_files = fs::read_dir(path)
            .with_context(|| format!("Failed to read workbook directory {}", path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == SHEET_EXTENSION))
            .sorted()
            .collect_vec();

        let mut sheets = GridWorkbook::new();
        for file in &sheet_files {
            let name = file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            sheets.add_sheet(read_sheet(file, &name)?);
        }

        log::debug!(
            "Opened workbook {} with {} sheets",
            path.display(),
            sheet_files.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    /// Directory the workbook was read from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a workbook as a directory of parquet sheets
    ///
    /// The first row of each sheet becomes the column names. Sheets without
    /// columns are skipped.
    pub fn write(path: &Path, workbook: &GridWorkbook) -> Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create workbook directory {}", path.display()))?;

        for sheet in workbook.grid_sheets() {
            let width = sheet.width();
            if width == 0 {
                log_warning(&format!("Skipping empty sheet '{}'", sheet.name()), Some(path));
                continue;
            }

            let mut seen = HashSet::new();
            let fields = (0..width)
                .map(|col| {
                    let mut name = sheet.text(0, col);
                    if name.is_empty() {
                        name = format!("column_{col}");
                    }
                    while !seen.insert(name.clone()) {
                        name.push('_');
                    }
                    Field::new(name, DataType::Utf8, true)
                })
                .collect_vec();
            let schema = Arc::new(Schema::new(fields));

            let columns = (0..width)
                .map(|col| {
                    let values = (1..sheet.row_count())
                        .map(|row| sheet.cell(row, col))
                        .collect_vec();
                    Arc::new(StringArray::from(values)) as ArrayRef
                })
                .collect_vec();
            let batch = RecordBatch::try_new(schema.clone(), columns)?;

            let file_path = path.join(format!("{}.{SHEET_EXTENSION}", sheet.name()));
            let file = fs::File::create(&file_path)
                .with_context(|| format!("Failed to create sheet file {}", file_path.display()))?;
            let mut writer = ArrowWriter::try_new(file, schema, None)?;
            writer.write(&batch)?;
            writer.close()?;
        }
        Ok(())
    }
}

impl Workbook for ParquetWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn sheet(&self, name: &str) -> Option<&dyn Sheet> {
        self.sheets.sheet(name)
    }
}

/// Read one parquet file into a sheet whose first row holds the column names
fn read_sheet(path: &Path, name: &str) -> Result<GridSheet> {
    let file = safe_open_file(path, "reading workbook sheet")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut sheet = GridSheet::new(name);
    sheet.push_row(
        reader
            .schema()
            .fields()
            .iter()
            .map(|field| Some(field.name().clone()))
            .collect(),
    );

    for batch_result in reader {
        let batch = batch_result
            .with_context(|| format!("Failed to read record batch from {}", path.display()))?;

        let columns = batch
            .columns()
            .iter()
            .map(|column| cast::cast(column, &DataType::Utf8))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            let cells = columns
                .iter()
                .map(|column| {
                    column
                        .as_any()
                        .downcast_ref::<StringArray>()
                        .filter(|values| !values.is_null(row))
                        .map(|values| values.value(row).to_string())
                })
                .collect();
            sheet.push_row(cells);
        }
    }

    Ok(sheet)
}
