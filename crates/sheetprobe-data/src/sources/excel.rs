//! Excel/OpenDocument workbook source using calamine.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheet, SheetType, SheetVisible};

use crate::error::{DataError, Result};
use crate::grid::{parse_iso_datetime, CellValue, Grid};
use crate::sources::GridSource;

/// Largest float magnitude that still converts to an exact integer
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Workbook data source (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`)
pub struct ExcelSource {
    /// Path to the workbook
    path: String,
    /// Sheet names cache
    sheet_names: Vec<String>,
    /// Sheet analyzed when the input names none
    default_sheet: Option<String>,
}

impl ExcelSource {
    /// Create a new workbook source from a file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();

        if !path.as_ref().exists() {
            return Err(DataError::SourceNotFound(path_str));
        }

        let workbook = open_workbook_auto(path.as_ref())?;
        let sheet_names = workbook.sheet_names();
        let default_sheet = Self::first_visible_sheet(workbook.sheets_metadata())
            .or_else(|| sheet_names.first().cloned());

        Ok(Self {
            path: path_str,
            sheet_names,
            default_sheet,
        })
    }

    /// First visible worksheet, skipping hidden sheets and chart sheets
    pub fn first_visible_sheet(sheets: &[Sheet]) -> Option<String> {
        sheets
            .iter()
            .find(|sheet| {
                matches!(sheet.visible, SheetVisible::Visible)
                    && matches!(sheet.typ, SheetType::WorkSheet)
            })
            .map(|sheet| sheet.name.clone())
    }

    /// Copy a calamine range into a grid anchored at A1
    ///
    /// Calamine ranges start at the first used cell; leading empty rows and
    /// columns are restored so grid positions match sheet positions.
    pub fn grid_from_range(range: &Range<Data>) -> Grid {
        let Some((end_row, end_col)) = range.end() else {
            return Grid::default();
        };

        let rows = (0..=end_row)
            .map(|row| {
                (0..=end_col)
                    .map(|col| {
                        range
                            .get_value((row, col))
                            .map(Self::cell_value)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Grid::new(rows)
    }

    /// Convert a calamine cell to a [`CellValue`]
    pub fn cell_value(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Integer(*i),
            Data::Float(f) => match whole_number(*f) {
                Some(i) => CellValue::Integer(i),
                None => CellValue::Real(*f),
            },
            Data::Bool(b) => CellValue::other("bool", b.to_string()),
            Data::DateTime(dt) if dt.is_duration() => {
                CellValue::other("duration", dt.as_f64().to_string())
            }
            // Serials below one carry a time of day and no date
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(ts) if (0.0..1.0).contains(&dt.as_f64()) => {
                    CellValue::other("time", ts.format("%H:%M:%S").to_string())
                }
                Some(ts) => CellValue::Timestamp(ts),
                None => CellValue::Real(dt.as_f64()),
            },
            Data::DateTimeIso(s) => match parse_iso_datetime(s) {
                Some(ts) => CellValue::Timestamp(ts),
                None => CellValue::other("datetime", s.clone()),
            },
            Data::DurationIso(s) => CellValue::other("duration", s.clone()),
            Data::Error(e) => CellValue::other("error", e.to_string()),
        }
    }
}

/// Whole floats become integers (sheet files store every number as a float)
fn whole_number(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER {
        Some(f as i64)
    } else {
        None
    }
}

impl GridSource for ExcelSource {
    fn read_sheet(&self, sheet: &str) -> Result<Grid> {
        // Re-open the workbook; the handle is released when this call returns
        let mut workbook = open_workbook_auto(&self.path)?;

        if !self.sheet_names.iter().any(|name| name == sheet) {
            return Err(DataError::SheetNotFound(sheet.to_string()));
        }

        let range = workbook.worksheet_range(sheet)?;
        Ok(Self::grid_from_range(&range))
    }

    fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(self.sheet_names.clone())
    }

    fn default_sheet(&self) -> Option<String> {
        self.default_sheet.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_cell_value_scalars() {
        assert_eq!(ExcelSource::cell_value(&Data::Empty), CellValue::Empty);
        assert_eq!(
            ExcelSource::cell_value(&Data::String("hello".to_string())),
            CellValue::text("hello")
        );
        assert_eq!(ExcelSource::cell_value(&Data::Int(42)), CellValue::Integer(42));
        assert_eq!(ExcelSource::cell_value(&Data::Float(3.14)), CellValue::Real(3.14));
        assert_eq!(ExcelSource::cell_value(&Data::Float(10.0)), CellValue::Integer(10));
        assert_eq!(
            ExcelSource::cell_value(&Data::Bool(true)),
            CellValue::other("bool", "true")
        );
    }

    #[test]
    fn test_cell_value_error_is_other() {
        let value = ExcelSource::cell_value(&Data::Error(CellErrorType::Div0));
        match value {
            CellValue::Other { kind, text } => {
                assert_eq!(kind, "error");
                assert_eq!(text, "#DIV/0!");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cell_value_excel_date() {
        // 45306 is 2024-01-15 in the 1900 date system
        let dt = ExcelDateTime::new(45306.0, ExcelDateTimeType::DateTime, false);
        let value = ExcelSource::cell_value(&Data::DateTime(dt));
        match value {
            CellValue::Timestamp(ts) => {
                assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
                assert_eq!(ts.hour(), 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cell_value_time_of_day() {
        // 0.5625 is 13:30 with no date part (format h:mm)
        let dt = ExcelDateTime::new(0.5625, ExcelDateTimeType::DateTime, false);
        let value = ExcelSource::cell_value(&Data::DateTime(dt));
        assert_eq!(value, CellValue::other("time", "13:30:00"));

        // Whole days keep their date
        let dt = ExcelDateTime::new(45306.5625, ExcelDateTimeType::DateTime, false);
        let value = ExcelSource::cell_value(&Data::DateTime(dt));
        assert_eq!(value.to_string(), "2024-01-15 13:30:00");
    }

    #[test]
    fn test_first_visible_sheet() {
        let sheet = |name: &str, typ, visible| Sheet {
            name: name.to_string(),
            typ,
            visible,
        };
        let sheets = vec![
            sheet("Lookup", SheetType::WorkSheet, SheetVisible::Hidden),
            sheet("Chart", SheetType::ChartSheet, SheetVisible::Visible),
            sheet("Internal", SheetType::WorkSheet, SheetVisible::VeryHidden),
            sheet("Invoices", SheetType::WorkSheet, SheetVisible::Visible),
            sheet("Archive", SheetType::WorkSheet, SheetVisible::Visible),
        ];

        assert_eq!(
            ExcelSource::first_visible_sheet(&sheets),
            Some("Invoices".to_string())
        );
        assert_eq!(ExcelSource::first_visible_sheet(&sheets[..3]), None);
    }

    #[test]
    fn test_cell_value_iso_strings() {
        let value = ExcelSource::cell_value(&Data::DateTimeIso("2024-03-01T08:15:00".to_string()));
        assert_eq!(value.to_string(), "2024-03-01 08:15:00");

        let value = ExcelSource::cell_value(&Data::DateTimeIso("2024-03-01".to_string()));
        assert_eq!(value.to_string(), "2024-03-01");

        let value = ExcelSource::cell_value(&Data::DurationIso("PT1H".to_string()));
        assert_eq!(value, CellValue::other("duration", "PT1H"));
    }

    #[test]
    fn test_grid_from_range_restores_origin() {
        // Used area starts at B2
        let mut range = Range::new((1, 1), (2, 3));
        range.set_value((1, 1), Data::String("Name".to_string()));
        range.set_value((1, 2), Data::String("Age".to_string()));
        range.set_value((2, 1), Data::String("Alice".to_string()));
        range.set_value((2, 2), Data::Float(30.0));

        let grid = ExcelSource::grid_from_range(&range);

        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_count(), 4);
        assert_eq!(grid.cell(0, 0), Some(&CellValue::Empty));
        assert_eq!(grid.cell(1, 1), Some(&CellValue::text("Name")));
        assert_eq!(grid.cell(2, 2), Some(&CellValue::Integer(30)));
        assert_eq!(grid.cell(2, 3), Some(&CellValue::Empty));
    }

    #[test]
    fn test_grid_from_empty_range() {
        let range: Range<Data> = Range::empty();
        let grid = ExcelSource::grid_from_range(&range);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_whole_number_limits() {
        assert_eq!(whole_number(-7.0), Some(-7));
        assert_eq!(whole_number(0.5), None);
        assert_eq!(whole_number(f64::NAN), None);
        assert_eq!(whole_number(1e300), None);
    }

    #[test]
    fn test_missing_file() {
        let result = ExcelSource::new("/nonexistent/path/file.xlsx");
        assert!(matches!(result, Err(DataError::SourceNotFound(_))));
    }
}
