//! Error types for workbook probing.

use thiserror::Error;

/// Result type for probe operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading and analyzing a workbook
#[derive(Debug, Error)]
pub enum DataError {
    /// Path does not resolve to a file
    #[error("File not found")]
    SourceNotFound(String),

    /// The file exists but its format could not be parsed
    #[error("{kind}: {message}")]
    SourceUnreadable {
        /// Short name of the failing codec (e.g. `XlsxError`)
        kind: String,
        /// Underlying error message
        message: String,
    },

    /// Requested sheet is not in the workbook
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// No row within the scan window qualified as a header
    #[error("No header row found in the first {scanned} rows")]
    NoHeaderFound {
        /// Number of rows examined
        scanned: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Build a [`DataError::SourceUnreadable`] from a kind and any displayable error
    pub fn unreadable(kind: impl Into<String>, err: impl std::fmt::Display) -> Self {
        DataError::SourceUnreadable {
            kind: kind.into(),
            message: err.to_string(),
        }
    }
}

impl From<calamine::Error> for DataError {
    fn from(err: calamine::Error) -> Self {
        let kind = match &err {
            calamine::Error::Io(_) => "IoError",
            calamine::Error::Xls(_) => "XlsError",
            calamine::Error::Xlsx(_) => "XlsxError",
            calamine::Error::Xlsb(_) => "XlsbError",
            calamine::Error::Ods(_) => "OdsError",
            _ => "WorkbookError",
        };
        DataError::unreadable(kind, err)
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::unreadable("CsvError", err)
    }
}
