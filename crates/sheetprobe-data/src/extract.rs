//! Header field and typed record extraction.
//!
//! Once the header row is known, its non-blank cells name the fields. Rows
//! below it are read only at those column positions and each cell is tagged
//! with a primitive type.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::grid::{column_letter, format_timestamp, CellValue, Grid};

/// Inferred type of a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    /// Absent cell
    Empty,
    /// Text
    String,
    /// Whole number
    Integer,
    /// Fractional number
    Number,
    /// Date or date-time
    Date,
    /// Any other scalar, tagged with its kind name
    Other(String),
}

impl TypeTag {
    /// Tag as it appears in reports
    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Empty => "empty",
            TypeTag::String => "string",
            TypeTag::Integer => "integer",
            TypeTag::Number => "number",
            TypeTag::Date => "date",
            TypeTag::Other(kind) => kind,
        }
    }

    /// Classify a cell
    ///
    /// Timestamps are recognised before text and integers before reals, so a
    /// value never falls through to a looser tag.
    pub fn of(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => TypeTag::Empty,
            CellValue::Timestamp(_) => TypeTag::Date,
            CellValue::Text(_) => TypeTag::String,
            CellValue::Integer(_) => TypeTag::Integer,
            CellValue::Real(_) => TypeTag::Number,
            CellValue::Other { kind, .. } => TypeTag::Other(kind.clone()),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Rendered form of a cell for reports
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    /// Absent cell
    Null,
    /// Whole number
    Integer(i64),
    /// Fractional number
    Number(f64),
    /// Text, dates, and other scalars
    Text(String),
}

impl DisplayValue {
    /// Render a cell, cutting text to `max_chars` characters when given
    pub fn of(value: &CellValue, max_chars: Option<usize>) -> Self {
        match value {
            CellValue::Empty => DisplayValue::Null,
            CellValue::Integer(i) => DisplayValue::Integer(*i),
            CellValue::Real(r) => DisplayValue::Number(*r),
            CellValue::Text(s) => DisplayValue::Text(match max_chars {
                Some(limit) => truncate_chars(s, limit),
                None => s.clone(),
            }),
            CellValue::Timestamp(ts) => DisplayValue::Text(format_timestamp(ts)),
            CellValue::Other { text, .. } => DisplayValue::Text(text.clone()),
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Null => f.write_str("None"),
            DisplayValue::Integer(i) => write!(f, "{}", i),
            DisplayValue::Number(n) => write!(f, "{}", n),
            DisplayValue::Text(s) => f.write_str(s),
        }
    }
}

/// First `max_chars` characters of `s`
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}

/// One named column of the header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderField {
    /// Column letter (A, B, ...)
    pub column: String,
    /// Field name taken from the header cell
    pub name: String,
    /// 0-based column index
    pub index: usize,
}

/// The selected header row and its named columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// 1-based header row
    pub row: usize,
    /// Named columns in column order; blank header cells are omitted
    pub fields: Vec<HeaderField>,
}

impl Header {
    /// Field names in column order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Number of named columns
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the header row had no named columns
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Read the field names of the 1-based `header_row`
pub fn extract_header_fields(grid: &Grid, header_row: usize) -> Header {
    let fields = header_row
        .checked_sub(1)
        .and_then(|index| grid.row(index))
        .map(|cells| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| !cell.is_blank())
                .map(|(index, cell)| HeaderField {
                    column: column_letter(index),
                    name: cell.to_string(),
                    index,
                })
                .collect()
        })
        .unwrap_or_default();

    Header {
        row: header_row,
        fields,
    }
}

/// One cell of a typed record
#[derive(Debug, Clone, PartialEq)]
pub struct TypedCell {
    /// Header field this cell belongs to
    pub field: HeaderField,
    /// Raw cell value
    pub value: CellValue,
    /// Inferred type
    pub type_tag: TypeTag,
}

impl TypedCell {
    /// Rendered value, truncated to `max_chars` when given
    pub fn display(&self, max_chars: Option<usize>) -> DisplayValue {
        DisplayValue::of(&self.value, max_chars)
    }
}

/// One data row keyed by the header's fields
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRecord {
    /// 1-based row number
    pub row_num: usize,
    /// One cell per header field, in column order
    pub cells: Vec<TypedCell>,
}

impl TypedRecord {
    /// Cell for a field name
    pub fn get(&self, field_name: &str) -> Option<&TypedCell> {
        self.cells.iter().find(|c| c.field.name == field_name)
    }

    /// Cell for a column letter
    pub fn column(&self, letter: &str) -> Option<&TypedCell> {
        self.cells.iter().find(|c| c.field.column == letter)
    }
}

/// Typed records for up to `count` rows starting at 1-based `start_row`
///
/// Rows past the end of the grid are skipped. Records are built lazily.
pub fn extract_records<'a>(
    grid: &'a Grid,
    header: &'a Header,
    start_row: usize,
    count: usize,
) -> impl Iterator<Item = TypedRecord> + 'a {
    let first = start_row.max(1);
    let last = first.saturating_add(count).min(grid.row_count() + 1);

    (first..last).map(move |row_num| {
        let cells = header
            .fields
            .iter()
            .map(|field| {
                let value = grid
                    .cell(row_num - 1, field.index)
                    .cloned()
                    .unwrap_or_default();
                TypedCell {
                    field: field.clone(),
                    type_tag: TypeTag::of(&value),
                    value,
                }
            })
            .collect();
        TypedRecord { row_num, cells }
    })
}

/// Typed records for the `count` rows directly below the header
pub fn sample_records<'a>(
    grid: &'a Grid,
    header: &'a Header,
    count: usize,
) -> impl Iterator<Item = TypedRecord> + 'a {
    extract_records(grid, header, header.row + 1, count)
}

/// Consecutive empty rows that end the scan for more data
pub const EMPTY_ROW_CUTOFF: usize = 100;

/// Last 1-based row below the header holding a non-blank cell
///
/// The scan stops after [`EMPTY_ROW_CUTOFF`] empty rows in a row, so stray
/// cells far below the table are ignored. Returns `header_row` when nothing
/// follows it.
pub fn last_data_row(grid: &Grid, header_row: usize) -> usize {
    let mut last = header_row;
    let mut empty_run = 0;

    for (index, row) in grid.rows().enumerate().skip(header_row) {
        if row.iter().any(|cell| !cell.is_blank()) {
            last = index + 1;
            empty_run = 0;
        } else {
            empty_run += 1;
            if empty_run >= EMPTY_ROW_CUTOFF {
                break;
            }
        }
    }

    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn invoice_grid() -> Grid {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Grid::new(vec![
            vec![CellValue::text(""), CellValue::text(""), CellValue::text("")],
            vec![
                CellValue::text("Invoice #"),
                CellValue::text("Date"),
                CellValue::text("Amount"),
            ],
            vec![
                CellValue::text("INV-001"),
                CellValue::Timestamp(date),
                CellValue::Real(120.5),
            ],
        ])
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(TypeTag::of(&CellValue::Integer(42)), TypeTag::Integer);
        assert_eq!(TypeTag::of(&CellValue::Real(3.14)), TypeTag::Number);
        assert_eq!(TypeTag::of(&CellValue::Empty), TypeTag::Empty);
        assert_eq!(TypeTag::of(&CellValue::text("x")), TypeTag::String);
        assert_eq!(
            TypeTag::of(&CellValue::other("bool", "true")).as_str(),
            "bool"
        );
    }

    #[test]
    fn test_header_fields() {
        let grid = invoice_grid();
        let header = extract_header_fields(&grid, 2);

        assert_eq!(header.row, 2);
        let fields: Vec<_> = header
            .fields
            .iter()
            .map(|f| (f.index, f.column.as_str(), f.name.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![(0, "A", "Invoice #"), (1, "B", "Date"), (2, "C", "Amount")]
        );
    }

    #[test]
    fn test_header_skips_blank_columns() {
        let grid = Grid::new(vec![vec![
            CellValue::text("Name"),
            CellValue::Empty,
            CellValue::text("   "),
            CellValue::Integer(2024),
        ]]);
        let header = extract_header_fields(&grid, 1);

        let names: Vec<_> = header.names().collect();
        assert_eq!(names, vec!["Name", "2024"]);
        assert_eq!(header.fields[1].column, "D");
        assert_eq!(header.fields[1].index, 3);
    }

    #[test]
    fn test_header_out_of_range() {
        let grid = invoice_grid();
        assert!(extract_header_fields(&grid, 0).is_empty());
        assert!(extract_header_fields(&grid, 10).is_empty());
    }

    #[test]
    fn test_records_keyed_by_header() {
        let grid = invoice_grid();
        let header = extract_header_fields(&grid, 2);
        let records: Vec<_> = sample_records(&grid, &header, 3).collect();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.row_num, 3);

        let invoice = record.get("Invoice #").unwrap();
        assert_eq!(invoice.type_tag, TypeTag::String);
        assert_eq!(invoice.display(None), DisplayValue::Text("INV-001".into()));

        let date = record.get("Date").unwrap();
        assert_eq!(date.type_tag, TypeTag::Date);
        assert_eq!(date.display(None).to_string(), "2024-01-15");

        let amount = record.column("C").unwrap();
        assert_eq!(amount.type_tag, TypeTag::Number);
        assert_eq!(amount.value, CellValue::Real(120.5));
    }

    #[test]
    fn test_records_never_include_unnamed_columns() {
        let grid = Grid::new(vec![
            vec![CellValue::text("A"), CellValue::Empty, CellValue::text("C")],
            vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Integer(3)],
        ]);
        let header = extract_header_fields(&grid, 1);
        let record = sample_records(&grid, &header, 1).next().unwrap();

        assert_eq!(record.cells.len(), 2);
        assert!(record.column("B").is_none());
    }

    #[test]
    fn test_records_clip_to_grid() {
        let grid = invoice_grid();
        let header = extract_header_fields(&grid, 2);

        assert_eq!(extract_records(&grid, &header, 3, 100).count(), 1);
        assert_eq!(extract_records(&grid, &header, 4, 3).count(), 0);
    }

    #[test]
    fn test_truncation_is_display_only() {
        let long = "é".repeat(150);
        let grid = Grid::new(vec![
            vec![CellValue::text("Notes")],
            vec![CellValue::text(long.clone())],
        ]);
        let header = extract_header_fields(&grid, 1);
        let record = sample_records(&grid, &header, 1).next().unwrap();
        let cell = record.get("Notes").unwrap();

        assert_eq!(cell.display(Some(100)).to_string().chars().count(), 100);
        assert_eq!(cell.display(None).to_string(), long);
        assert_eq!(cell.value, CellValue::Text(long));
    }

    #[test]
    fn test_timestamp_with_time_renders_time() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        let display = DisplayValue::of(&CellValue::Timestamp(ts), Some(100));
        assert_eq!(display.to_string(), "2024-02-29 09:05:00");
    }

    #[test]
    fn test_last_data_row() {
        let grid = Grid::new(vec![
            vec![CellValue::text("H")],
            vec![CellValue::Integer(1)],
            vec![CellValue::Empty],
            vec![CellValue::text("x")],
            vec![CellValue::text(" ")],
        ]);
        assert_eq!(last_data_row(&grid, 1), 4);

        let header_only = Grid::new(vec![vec![CellValue::text("H")]]);
        assert_eq!(last_data_row(&header_only, 1), 1);
    }

    #[test]
    fn test_last_data_row_stops_after_empty_run() {
        let table = |gap: usize| {
            let mut rows = vec![vec![CellValue::text("H")], vec![CellValue::Integer(1)]];
            rows.extend((0..gap).map(|_| vec![CellValue::Empty]));
            rows.push(vec![CellValue::text("stray note")]);
            Grid::new(rows)
        };

        assert_eq!(last_data_row(&table(EMPTY_ROW_CUTOFF), 1), 2);
        assert_eq!(
            last_data_row(&table(EMPTY_ROW_CUTOFF - 1), 1),
            EMPTY_ROW_CUTOFF + 2
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("жзий", 2), "жз");
    }
}
