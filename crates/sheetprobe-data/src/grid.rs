//! In-memory worksheet grid.
//!
//! A [`Grid`] is the rectangular, owned copy of one worksheet. Loaders build it
//! once at the source boundary, turning every library-specific cell into a
//! [`CellValue`]; detection and extraction only ever see this closed type.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// No value
    #[default]
    Empty,
    /// Text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Fractional number
    Real(f64),
    /// Calendar date or date-time
    Timestamp(NaiveDateTime),
    /// Any other scalar the source exposes (booleans, error codes, durations...)
    Other {
        /// Kind name used as the type tag
        kind: String,
        /// Stringified value
        text: String,
    },
}

impl CellValue {
    /// Shorthand for [`CellValue::Text`]
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Shorthand for [`CellValue::Other`]
    pub fn other(kind: impl Into<String>, text: impl Into<String>) -> Self {
        CellValue::Other {
            kind: kind.into(),
            text: text.into(),
        }
    }

    /// True for [`CellValue::Empty`]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// True when the cell is absent or is text that is blank after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The text of a [`CellValue::Text`] cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => write!(f, "{}", r),
            CellValue::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
            CellValue::Other { text, .. } => f.write_str(text),
        }
    }
}

/// Render a timestamp as `YYYY-MM-DD`, adding ` HH:MM:SS` unless it is midnight
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    let time = ts.time();
    if time.hour() == 0 && time.minute() == 0 && time.second() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or ISO 8601 `T`-separated text
pub fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Rectangular worksheet contents, 0-indexed internally
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

impl Grid {
    /// Build a grid, padding short rows with [`CellValue::Empty`]
    pub fn new(mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        Self { rows, width }
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.width
    }

    /// True when the grid has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by 0-based index
    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cell by 0-based (row, column)
    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Convert a 0-indexed column number to letters (0=A, 25=Z, 26=AA)
pub fn column_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
