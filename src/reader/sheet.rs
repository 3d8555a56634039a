//! Tabular sheet access
//!
//! Loaders only need positional cell access plus header lookup, so a sheet
//! is modelled as a grid of optional strings regardless of where it came
//! from.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::error::ParseError;
use crate::utils::sanitize::{clean, normalize_header};

/// A single sheet of cells addressed by zero-based row and column
pub trait Sheet: Send + Sync {
    /// Sheet name
    fn name(&self) -> &str;

    /// Number of rows, including the header row
    fn row_count(&self) -> usize;

    /// Number of columns in the widest row
    fn width(&self) -> usize;

    /// Raw cell value, `None` for empty or out-of-range cells
    fn cell(&self, row: usize, col: usize) -> Option<&str>;

    /// Cleaned cell value, empty string for empty cells
    fn text(&self, row: usize, col: usize) -> String {
        clean(self.cell(row, col))
    }

    /// Coordinate of a cell for error reports
    fn coordinate(&self, row: usize, col: usize) -> String {
        format!("{}!R{}C{}", self.name(), row + 1, col + 1)
    }
}

/// A collection of named sheets
pub trait Workbook: Send + Sync {
    /// Names of all sheets, in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Look up a sheet by name (case-insensitive)
    fn sheet(&self, name: &str) -> Option<&dyn Sheet>;
}

/// In-memory sheet
#[derive(Debug, Clone, Default)]
pub struct GridSheet {
    name: String,
    rows: Vec<Vec<Option<String>>>,
}

impl GridSheet {
    /// Create an empty sheet
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Create a sheet from rows of string cells, blank strings become empty cells
    #[must_use]
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let mut sheet = Self::new(name);
        for row in rows {
            sheet.push_row(
                row.into_iter()
                    .map(|cell| {
                        let value = cell.as_ref();
                        (!value.is_empty()).then(|| value.to_string())
                    })
                    .collect(),
            );
        }
        sheet
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        self.rows.push(row);
    }

    /// All rows
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }
}

impl Sheet for GridSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .and_then(|cell| cell.as_deref())
    }
}

/// In-memory workbook
#[derive(Debug, Clone, Default)]
pub struct GridWorkbook {
    sheets: BTreeMap<String, GridSheet>,
    order: Vec<String>,
}

impl GridWorkbook {
    /// Create an empty workbook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet, replacing any sheet with the same name
    #[must_use]
    pub fn with_sheet(mut self, sheet: GridSheet) -> Self {
        self.add_sheet(sheet);
        self
    }

    /// Add a sheet, replacing any sheet with the same name
    pub fn add_sheet(&mut self, sheet: GridSheet) {
        let key = sheet.name.to_lowercase();
        if !self.sheets.contains_key(&key) {
            self.order.push(sheet.name.clone());
        }
        self.sheets.insert(key, sheet);
    }

    /// Iterate sheets in insertion order
    pub fn grid_sheets(&self) -> impl Iterator<Item = &GridSheet> {
        self.order
            .iter()
            .filter_map(|name| self.sheets.get(&name.to_lowercase()))
    }
}

impl Workbook for GridWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn sheet(&self, name: &str) -> Option<&dyn Sheet> {
        self.sheets
            .get(&name.to_lowercase())
            .map(|sheet| sheet as &dyn Sheet)
    }
}

/// Column positions of a header row, keyed by normalized header text
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    sheet: String,
    header_row: usize,
    columns: FxHashMap<String, usize>,
}

impl HeaderIndex {
    /// Index the header row of a sheet
    pub fn read(sheet: &dyn Sheet, header_row: usize) -> Self {
        let mut columns = FxHashMap::default();
        for col in 0..sheet.width() {
            let key = normalize_header(&sheet.text(header_row, col));
            if !key.is_empty() {
                columns.entry(key).or_insert(col);
            }
        }
        Self {
            sheet: sheet.name().to_string(),
            header_row,
            columns,
        }
    }

    /// Column of a header, if present
    #[must_use]
    pub fn column(&self, header: &str) -> Option<usize> {
        self.columns.get(&normalize_header(header)).copied()
    }

    /// Column of the first header present among several aliases
    #[must_use]
    pub fn column_any(&self, headers: &[&str]) -> Option<usize> {
        headers.iter().find_map(|header| self.column(header))
    }

    /// Column of a required header
    pub fn require(&self, headers: &[&str]) -> Result<usize, ParseError> {
        self.column_any(headers).ok_or_else(|| {
            ParseError::new(
                format!("{}!R{}", self.sheet, self.header_row + 1),
                format!("missing column '{}'", headers.first().copied().unwrap_or_default()),
            )
        })
    }
}
