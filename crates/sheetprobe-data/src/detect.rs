//! Header row detection.
//!
//! Scans the first `scan_limit` rows of a grid and picks the row most likely
//! to hold column titles. A row is a candidate when it has at least
//! `min_meaningful` meaningful cells; the [`SelectionPolicy`] decides between
//! several candidates. With [`MeaningfulRule::Keywords`] only cells naming a
//! typical column title count, which suits sheets whose title block is as wide
//! as the table.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DataError, Result};
use crate::grid::{CellValue, Grid};

/// Column title words matched by [`MeaningfulRule::Keywords`] (Macedonian and English)
pub const DEFAULT_HEADER_KEYWORDS: &[&str] = &[
    "број", "number", "датум", "date", "продавач", "seller", "купувач", "buyer", "вкупно",
    "total", "износ", "amount", "тип", "type", "опис", "description", "ддв", "vat", "tax",
];

/// How to choose among qualifying rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// First qualifying row, top to bottom
    First,
    /// Qualifying row with the most meaningful cells; earliest row wins ties
    #[default]
    Best,
}

/// Which cells count toward a row's meaningful total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MeaningfulRule {
    /// Any non-absent cell whose text, if textual, is non-blank
    #[default]
    AnyValue,
    /// Only non-blank text cells
    TextOnly,
    /// Only cells whose text contains one of `header_keywords`, case-insensitively
    Keywords,
}

/// Header detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Last 1-based row examined
    pub scan_limit: usize,
    /// Minimum meaningful cells for a row to qualify
    pub min_meaningful: usize,
    /// Selection among qualifying rows
    pub selection: SelectionPolicy,
    /// Reject rows holding a cell that reads like wrapped data
    pub reject_long_cells: bool,
    /// What counts as a meaningful cell
    pub meaningful: MeaningfulRule,
    /// Longest cell text (in characters) a header row may hold
    pub max_header_cell_chars: usize,
    /// Most newlines a header cell may hold
    pub max_header_cell_newlines: usize,
    /// Words looked for under [`MeaningfulRule::Keywords`]
    pub header_keywords: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scan_limit: 15,
            min_meaningful: 3,
            selection: SelectionPolicy::Best,
            reject_long_cells: true,
            meaningful: MeaningfulRule::AnyValue,
            max_header_cell_chars: 100,
            max_header_cell_newlines: 2,
            header_keywords: DEFAULT_HEADER_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl DetectorConfig {
    /// First qualifying text row within the first 20 rows, no shape filter
    pub fn simple() -> Self {
        Self {
            scan_limit: 20,
            selection: SelectionPolicy::First,
            reject_long_cells: false,
            meaningful: MeaningfulRule::TextOnly,
            ..Default::default()
        }
    }

    /// First row within the first 20 holding three keyword cells
    pub fn keywords() -> Self {
        Self {
            scan_limit: 20,
            selection: SelectionPolicy::First,
            reject_long_cells: false,
            meaningful: MeaningfulRule::Keywords,
            ..Default::default()
        }
    }
}

/// A scanned row that met the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderCandidate {
    /// 1-based row index
    pub row: usize,
    /// Meaningful cell count
    pub meaningful: usize,
}

/// Selects the header row of a grid
#[derive(Debug, Clone, Default)]
pub struct HeaderDetector {
    config: DetectorConfig,
}

impl HeaderDetector {
    /// Create a detector with the given configuration
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Count the cells of a row that count as meaningful
    pub fn meaningful_count(&self, row: &[CellValue]) -> usize {
        row.iter()
            .filter(|cell| match self.config.meaningful {
                MeaningfulRule::AnyValue => !cell.is_blank(),
                MeaningfulRule::TextOnly => cell.as_text().is_some_and(|s| !s.trim().is_empty()),
                MeaningfulRule::Keywords => !cell.is_blank() && self.names_keyword(cell),
            })
            .count()
    }

    fn names_keyword(&self, cell: &CellValue) -> bool {
        let text = cell.to_string().to_lowercase();
        self.config
            .header_keywords
            .iter()
            .any(|keyword| text.contains(&keyword.to_lowercase()))
    }

    /// False when any cell is too long or spans too many lines for a title
    pub fn looks_like_header(&self, row: &[CellValue]) -> bool {
        row.iter().filter(|cell| !cell.is_blank()).all(|cell| {
            let text = cell.to_string();
            let text = text.trim();
            text.chars().count() <= self.config.max_header_cell_chars
                && text.matches('\n').count() <= self.config.max_header_cell_newlines
        })
    }

    /// Number of rows the scan covers for this grid
    pub fn scan_window(&self, grid: &Grid) -> usize {
        self.config.scan_limit.min(grid.row_count())
    }

    /// Qualifying rows within the scan window, top to bottom
    pub fn candidates<'a>(&'a self, grid: &'a Grid) -> impl Iterator<Item = HeaderCandidate> + 'a {
        grid.rows()
            .take(self.scan_window(grid))
            .enumerate()
            .filter_map(move |(index, row)| {
                let meaningful = self.meaningful_count(row);
                if meaningful < self.config.min_meaningful {
                    return None;
                }
                if self.config.reject_long_cells && !self.looks_like_header(row) {
                    debug!(row = index + 1, "rejecting candidate with long cell text");
                    return None;
                }
                Some(HeaderCandidate {
                    row: index + 1,
                    meaningful,
                })
            })
    }

    /// Detect the 1-based header row
    ///
    /// Fails with [`DataError::NoHeaderFound`] when no row in the window
    /// qualifies; callers fall back to row 1.
    pub fn detect(&self, grid: &Grid) -> Result<usize> {
        let mut candidates = self.candidates(grid);

        let chosen = match self.config.selection {
            SelectionPolicy::First => candidates.next(),
            SelectionPolicy::Best => candidates.fold(None, |best: Option<HeaderCandidate>, c| match best {
                Some(b) if c.meaningful <= b.meaningful => Some(b),
                _ => Some(c),
            }),
        };

        match chosen {
            Some(candidate) => {
                debug!(
                    row = candidate.row,
                    meaningful = candidate.meaningful,
                    "header row detected"
                );
                Ok(candidate.row)
            }
            None => Err(DataError::NoHeaderFound {
                scanned: self.scan_window(grid),
            }),
        }
    }
}

/// Detect the 1-based header row of `grid` with `config`
pub fn detect_header(grid: &Grid, config: &DetectorConfig) -> Result<usize> {
    HeaderDetector::new(config.clone()).detect(grid)
}
