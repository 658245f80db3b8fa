//! Grid loaders.
//!
//! A source opens a file, names its sheets, and copies one sheet into an owned
//! [`Grid`]. Underlying readers are opened and dropped inside each call, so no
//! file handle outlives the load.

pub mod csv;
pub mod excel;

pub use self::csv::{CsvOptions, CsvSource};
pub use excel::ExcelSource;

use std::path::Path;

use crate::error::{DataError, Result};
use crate::grid::Grid;

/// Trait for sources that can provide a worksheet grid
pub trait GridSource {
    /// Read a whole sheet into a grid
    fn read_sheet(&self, sheet: &str) -> Result<Grid>;

    /// List available sheets in the source
    fn list_sheets(&self) -> Result<Vec<String>>;

    /// Get the sheet analyzed when none is named
    fn default_sheet(&self) -> Option<String>;
}

/// One sheet copied out of a source
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    /// Sheet name
    pub name: String,
    /// Sheet contents
    pub grid: Grid,
}

/// Open a source, choosing the reader from the file extension
///
/// `.csv`, `.tsv` and `.tab` files are read as delimited text; everything else
/// goes through the workbook reader.
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn GridSource>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => Ok(Box::new(CsvSource::new(path)?)),
        Some("tsv") | Some("tab") => Ok(Box::new(CsvSource::with_options(path, CsvOptions::tsv())?)),
        _ => Ok(Box::new(ExcelSource::new(path)?)),
    }
}

/// Load the named sheet, or the source's default sheet
pub fn load_sheet(source: &dyn GridSource, sheet: Option<&str>) -> Result<LoadedSheet> {
    let name = match sheet {
        Some(s) => s.to_string(),
        None => source
            .default_sheet()
            .ok_or_else(|| DataError::SheetNotFound("No sheets in workbook".to_string()))?,
    };

    let grid = source.read_sheet(&name)?;
    Ok(LoadedSheet { name, grid })
}
