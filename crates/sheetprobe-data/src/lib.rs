//! # sheetprobe-data
//!
//! Header detection and typed sample extraction for spreadsheets whose layout
//! is not known in advance: title blocks, blank spacer rows and notes above
//! the actual table are common in hand-maintained workbooks.
//!
//! ## Pipeline
//!
//! 1. **Load**: a [`GridSource`] copies one sheet into an owned [`Grid`]
//!    (`calamine` for workbooks, `csv` for delimited text).
//! 2. **Detect**: [`HeaderDetector`] picks the header row from the first
//!    rows of the grid.
//! 3. **Extract**: [`extract_header_fields`] names the columns and
//!    [`extract_records`] types the rows below.
//! 4. **Report**: [`ProbeEngine`] packs the result into a [`WorkbookReport`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use sheetprobe_data::{InputSpec, ProbeEngine, Settings};
//!
//! let engine = ProbeEngine::new(Settings::default());
//! let reports = engine.run_batch(&[
//!     InputSpec::new("invoices.xlsx").with_name("Invoices"),
//!     InputSpec::new("salaries.xlsx").with_name("Salaries"),
//! ]);
//!
//! for report in &reports {
//!     println!("{}: header row {:?}", report.name, report.header_row);
//! }
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod grid;
pub mod report;
pub mod sources;

use std::path::Path;

use tracing::{debug, info, warn};

// Re-exports
pub use config::{ExtractionSettings, InputSpec, OutputSettings, Settings};
pub use detect::{
    detect_header, DetectorConfig, HeaderCandidate, HeaderDetector, MeaningfulRule,
    SelectionPolicy, DEFAULT_HEADER_KEYWORDS,
};
pub use error::{DataError, Result};
pub use extract::{
    extract_header_fields, extract_records, last_data_row, sample_records, DisplayValue, Header,
    HeaderField, TypeTag, TypedCell, TypedRecord,
};
pub use grid::{column_letter, CellValue, Grid};
pub use report::{preview_rows, PreviewRow, SampleCell, SampleData, SampleRow, WorkbookReport};
pub use sources::{load_sheet, open_source, CsvOptions, CsvSource, ExcelSource, GridSource};

/// Header row used when detection finds no candidate
pub const FALLBACK_HEADER_ROW: usize = 1;

/// Detection and extraction result for one grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridAnalysis {
    /// Selected header
    pub header: Header,
    /// True when no row qualified and row 1 was used
    pub fallback: bool,
    /// Typed rows below the header
    pub records: Vec<TypedRecord>,
    /// Last row holding data below the header
    pub last_data_row: usize,
}

/// Runs the load, detect, extract pipeline over workbooks
pub struct ProbeEngine {
    settings: Settings,
    detector: HeaderDetector,
}

impl ProbeEngine {
    /// Create an engine from settings
    pub fn new(settings: Settings) -> Self {
        let detector = HeaderDetector::new(settings.detection.clone());
        Self { settings, detector }
    }

    /// Active settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Detect the header of a grid and type its sample rows
    ///
    /// Never fails: when no row qualifies the header falls back to row 1.
    pub fn analyze_grid(&self, grid: &Grid) -> GridAnalysis {
        let (header_row, fallback) = match self.detector.detect(grid) {
            Ok(row) => (row, false),
            Err(err) => {
                debug!(%err, "falling back to row {}", FALLBACK_HEADER_ROW);
                (FALLBACK_HEADER_ROW, true)
            }
        };

        let header = extract_header_fields(grid, header_row);
        let records = sample_records(grid, &header, self.settings.extraction.sample_rows).collect();

        GridAnalysis {
            last_data_row: last_data_row(grid, header_row),
            header,
            fallback,
            records,
        }
    }

    /// Analyze one input
    ///
    /// Faults are recorded in the report's `error` field rather than returned.
    pub fn analyze(&self, input: &InputSpec) -> WorkbookReport {
        let mut report = WorkbookReport::new(input.display_name(), input.path.clone());

        if !Path::new(&input.path).exists() {
            let err = DataError::SourceNotFound(input.path.clone());
            warn!(path = %input.path, "{}", err);
            report.error = Some(err.to_string());
            return report;
        }
        report.exists = true;

        match self.analyze_file(input) {
            Ok(filled) => report = filled,
            Err(err) => {
                warn!(path = %input.path, %err, "analysis failed");
                report.error = Some(err.to_string());
            }
        }

        report
    }

    /// Analyze every input in order; one failure never stops the batch
    pub fn run_batch(&self, inputs: &[InputSpec]) -> Vec<WorkbookReport> {
        inputs
            .iter()
            .map(|input| {
                info!(name = %input.display_name(), path = %input.path, "analyzing");
                self.analyze(input)
            })
            .collect()
    }

    fn analyze_file(&self, input: &InputSpec) -> Result<WorkbookReport> {
        let sheet = {
            let source = open_source(&input.path)?;
            load_sheet(source.as_ref(), input.sheet.as_deref())?
        };

        let grid = &sheet.grid;
        let analysis = self.analyze_grid(grid);
        let extraction = &self.settings.extraction;
        let width = extraction.persisted_width();

        let mut report = WorkbookReport::new(input.display_name(), input.path.clone());
        report.exists = true;
        report.sheet_name = Some(sheet.name.clone());
        report.total_rows = grid.row_count();
        report.total_columns = grid.column_count();
        report.header_row = Some(analysis.header.row);
        report.last_data_row = Some(analysis.last_data_row);
        report.preview = preview_rows(grid, extraction.preview_rows);
        report.sample_data = analysis
            .records
            .iter()
            .map(|record| SampleRow::from_record(record, width))
            .collect();
        report.headers = analysis.header.fields;

        Ok(report)
    }
}

impl Default for ProbeEngine {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
