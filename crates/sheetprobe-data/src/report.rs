//! Per-workbook report document.
//!
//! One [`WorkbookReport`] is produced for every input, whether or not the
//! workbook could be read. Its JSON shape is the interchange format consumed
//! downstream:
//!
//! ```json
//! {
//!   "name": "Invoices",
//!   "filepath": "invoices.xlsx",
//!   "exists": true,
//!   "error": null,
//!   "sheet_name": "Sheet1",
//!   "total_rows": 42,
//!   "total_columns": 6,
//!   "header_row": 2,
//!   "headers": [{"column": "A", "name": "Invoice #", "index": 0}],
//!   "first_20_rows": [{"row_num": 1, "values": [null, "Invoice #"]}],
//!   "sample_data": [
//!     {"row_num": 3, "data": {"A": {"header": "Invoice #", "value": "INV-001", "type": "string"}}}
//!   ]
//! }
//! ```

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::extract::{DisplayValue, HeaderField, TypeTag, TypedRecord};
use crate::grid::{CellValue, Grid};

/// Analysis result for one input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbookReport {
    /// Display name
    pub name: String,
    /// Path as given
    pub filepath: String,
    /// Whether the path existed
    pub exists: bool,
    /// Failure message, if processing stopped
    pub error: Option<String>,
    /// Analyzed sheet
    pub sheet_name: Option<String>,
    /// Rows in the sheet
    pub total_rows: usize,
    /// Columns in the sheet
    pub total_columns: usize,
    /// 1-based header row
    pub header_row: Option<usize>,
    /// Last 1-based row holding data below the header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_data_row: Option<usize>,
    /// Named header columns
    pub headers: Vec<HeaderField>,
    /// Leading rows as plain strings
    #[serde(rename = "first_20_rows")]
    pub preview: Vec<PreviewRow>,
    /// Typed rows below the header
    pub sample_data: Vec<SampleRow>,
}

impl WorkbookReport {
    /// Empty report for an input
    pub fn new(name: impl Into<String>, filepath: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filepath: filepath.into(),
            exists: false,
            error: None,
            sheet_name: None,
            total_rows: 0,
            total_columns: 0,
            header_row: None,
            last_data_row: None,
            headers: Vec::new(),
            preview: Vec::new(),
            sample_data: Vec::new(),
        }
    }

    /// True when the workbook was analyzed without error
    pub fn is_ok(&self) -> bool {
        self.exists && self.error.is_none()
    }
}

/// A leading row rendered as strings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    /// 1-based row number
    pub row_num: usize,
    /// Cell texts; absent cells are `null`, timestamps are dates only
    pub values: Vec<Option<String>>,
}

/// Render the first `count` rows of a grid for the preview
pub fn preview_rows(grid: &Grid, count: usize) -> Vec<PreviewRow> {
    grid.rows()
        .take(count)
        .enumerate()
        .map(|(index, row)| PreviewRow {
            row_num: index + 1,
            values: row
                .iter()
                .map(|cell| match cell {
                    CellValue::Empty => None,
                    CellValue::Timestamp(ts) => Some(ts.format("%Y-%m-%d").to_string()),
                    other => Some(other.to_string()),
                })
                .collect(),
        })
        .collect()
}

/// One typed data row in report form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    /// 1-based row number
    pub row_num: usize,
    /// Cells keyed by column letter, in column order
    pub data: SampleData,
}

impl SampleRow {
    /// Convert a typed record, truncating text to `max_chars` when given
    pub fn from_record(record: &TypedRecord, max_chars: Option<usize>) -> Self {
        let cells = record
            .cells
            .iter()
            .map(|cell| SampleCell {
                column: cell.field.column.clone(),
                header: cell.field.name.clone(),
                value: cell.display(max_chars),
                type_tag: cell.type_tag.clone(),
            })
            .collect();

        Self {
            row_num: record.row_num,
            data: SampleData(cells),
        }
    }
}

/// Ordered column-letter map of sample cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleData(pub Vec<SampleCell>);

impl SampleData {
    /// Cell for a column letter
    pub fn get(&self, column: &str) -> Option<&SampleCell> {
        self.0.iter().find(|c| c.column == column)
    }

    /// Cells in column order
    pub fn iter(&self) -> impl Iterator<Item = &SampleCell> {
        self.0.iter()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the row has no named cells
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SampleData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for cell in &self.0 {
            map.serialize_entry(&cell.column, cell)?;
        }
        map.end()
    }
}

/// One cell of a sample row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleCell {
    /// Column letter (the map key)
    #[serde(skip)]
    pub column: String,
    /// Header field name
    pub header: String,
    /// Rendered value
    pub value: DisplayValue,
    /// Inferred type
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
}
