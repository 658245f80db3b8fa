//! Delimited text source.
//!
//! Delimited files carry no cell types. Unless [`CsvOptions::infer_types`] is
//! off, numeric and ISO date fields are typed as they are read; everything
//! else becomes [`CellValue::Text`]. The file is exposed as one sheet named
//! `data`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{DataError, Result};
use crate::grid::{parse_iso_datetime, CellValue, Grid};
use crate::sources::GridSource;

/// Sheet name reported for delimited files
const CSV_SHEET: &str = "data";

/// Options for CSV parsing
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Whether to trim whitespace from fields
    pub trim: bool,
    /// Whether to allow rows of differing length (the grid pads them)
    pub flexible: bool,
    /// Type numeric and ISO date fields instead of keeping them as text
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            trim: false,
            flexible: true,
            infer_types: true,
        }
    }
}

impl CsvOptions {
    /// Create options for tab-separated values (TSV)
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Create options for semicolon-separated values (common in European locales)
    pub fn semicolon() -> Self {
        Self {
            delimiter: b';',
            ..Default::default()
        }
    }
}

/// CSV file data source
pub struct CsvSource {
    /// Path to the CSV file
    path: String,
    /// Parsing options
    options: CsvOptions,
}

impl CsvSource {
    /// Create a new CSV source from a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, CsvOptions::default())
    }

    /// Create a new CSV source with custom options
    pub fn with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();

        if !path.as_ref().exists() {
            return Err(DataError::SourceNotFound(path_str));
        }

        Ok(Self {
            path: path_str,
            options,
        })
    }

    /// Read every record as a grid
    pub fn read_all(&self) -> Result<Grid> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .has_headers(false) // header detection decides which row is the header
            .trim(if self.options.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .flexible(self.options.flexible)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row: Vec<CellValue> = record
                .iter()
                .map(|field| field_value(field, self.options.infer_types))
                .collect();
            rows.push(row);
        }

        Ok(Grid::new(rows))
    }
}

/// Convert one field, typing it when `infer` is set
///
/// Integers with leading zeros (codes such as `007`) stay text.
pub fn field_value(field: &str, infer: bool) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }
    if !infer {
        return CellValue::text(field);
    }

    let trimmed = field.trim();
    let digits = trimmed.trim_start_matches(['-', '+']);
    let leading_zero = digits.len() > 1
        && digits.starts_with('0')
        && digits[1..].starts_with(|c: char| c.is_ascii_digit());

    if !leading_zero {
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Real(f);
            }
        }
    }

    match parse_iso_datetime(trimmed) {
        Some(ts) => CellValue::Timestamp(ts),
        None => CellValue::text(field),
    }
}

impl GridSource for CsvSource {
    fn read_sheet(&self, sheet: &str) -> Result<Grid> {
        if sheet != CSV_SHEET {
            return Err(DataError::SheetNotFound(sheet.to_string()));
        }
        self.read_all()
    }

    fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(vec![CSV_SHEET.to_string()])
    }

    fn default_sheet(&self) -> Option<String> {
        Some(CSV_SHEET.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_csv_read_all() {
        let file = create_test_csv("Name,Age,Score\nAlice,30,95\nBob,25,87\n");

        let source = CsvSource::new(file.path()).unwrap();
        let grid = source.read_all().unwrap();

        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.cell(0, 0), Some(&CellValue::text("Name")));
        assert_eq!(grid.cell(1, 1), Some(&CellValue::Integer(30)));
    }

    #[test]
    fn test_csv_infers_types() {
        let file = create_test_csv(",,\nInvoice #,Date,Amount\nINV-001,2024-01-15,120.5\n");

        let source = CsvSource::new(file.path()).unwrap();
        let grid = source.read_all().unwrap();

        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(grid.cell(2, 0), Some(&CellValue::text("INV-001")));
        assert_eq!(grid.cell(2, 1), Some(&CellValue::Timestamp(date)));
        assert_eq!(grid.cell(2, 2), Some(&CellValue::Real(120.5)));
    }

    #[test]
    fn test_csv_keeps_text_when_inference_is_off() {
        let file = create_test_csv("Id,Date\n42,2024-01-15\n");
        let options = CsvOptions {
            infer_types: false,
            ..Default::default()
        };

        let source = CsvSource::with_options(file.path(), options).unwrap();
        let grid = source.read_all().unwrap();

        assert_eq!(grid.cell(1, 0), Some(&CellValue::text("42")));
        assert_eq!(grid.cell(1, 1), Some(&CellValue::text("2024-01-15")));
    }

    #[test]
    fn test_field_value() {
        assert_eq!(field_value("", true), CellValue::Empty);
        assert_eq!(field_value("-17", true), CellValue::Integer(-17));
        assert_eq!(field_value(" 42 ", true), CellValue::Integer(42));
        assert_eq!(field_value("0", true), CellValue::Integer(0));
        assert_eq!(field_value("0.25", true), CellValue::Real(0.25));
        assert_eq!(field_value("007", true), CellValue::text("007"));
        assert_eq!(field_value("NaN", true), CellValue::text("NaN"));
        assert_eq!(field_value("inf", true), CellValue::text("inf"));
        assert_eq!(field_value("12 apples", true), CellValue::text("12 apples"));
        assert_eq!(
            field_value("2024-01-15 08:30:00", true).to_string(),
            "2024-01-15 08:30:00"
        );
    }

    #[test]
    fn test_csv_empty_fields_are_absent() {
        let file = create_test_csv(",,\nA,,C\n");

        let source = CsvSource::new(file.path()).unwrap();
        let grid = source.read_all().unwrap();

        assert_eq!(grid.cell(0, 0), Some(&CellValue::Empty));
        assert_eq!(grid.cell(1, 1), Some(&CellValue::Empty));
        assert_eq!(grid.cell(1, 2), Some(&CellValue::text("C")));
    }

    #[test]
    fn test_csv_irregular_rows_are_padded() {
        let file = create_test_csv("Title\nA,B,C\n");

        let source = CsvSource::new(file.path()).unwrap();
        let grid = source.read_all().unwrap();

        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.cell(0, 2), Some(&CellValue::Empty));
    }

    #[test]
    fn test_csv_tsv() {
        let file = create_test_csv("Name\tAge\tScore\nAlice\t30\t95\n");

        let source = CsvSource::with_options(file.path(), CsvOptions::tsv()).unwrap();
        let grid = source.read_all().unwrap();

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.cell(0, 2), Some(&CellValue::text("Score")));
    }

    #[test]
    fn test_csv_semicolon() {
        let file = create_test_csv("Name;Age;Score\nAlice;30;95\n");

        let source = CsvSource::with_options(file.path(), CsvOptions::semicolon()).unwrap();
        let grid = source.read_all().unwrap();

        assert_eq!(grid.column_count(), 3);
    }

    #[test]
    fn test_csv_quoted_fields() {
        let csv_content = r#"Name,Description
"Alice","A ""quoted"" value"
"Bob","Value with, comma"
"#;
        let file = create_test_csv(csv_content);

        let source = CsvSource::new(file.path()).unwrap();
        let grid = source.read_all().unwrap();

        assert_eq!(grid.cell(1, 1), Some(&CellValue::text(r#"A "quoted" value"#)));
        assert_eq!(grid.cell(2, 1), Some(&CellValue::text("Value with, comma")));
    }

    #[test]
    fn test_csv_single_sheet() {
        let file = create_test_csv("A,B\n1,2\n");

        let source = CsvSource::new(file.path()).unwrap();
        assert_eq!(source.list_sheets().unwrap(), vec!["data".to_string()]);
        assert_eq!(source.default_sheet(), Some("data".to_string()));
        assert!(source.read_sheet("Sheet1").is_err());
    }

    #[test]
    fn test_csv_file_not_found() {
        let result = CsvSource::new("/nonexistent/path/file.csv");
        assert!(matches!(result, Err(DataError::SourceNotFound(_))));
    }
}
