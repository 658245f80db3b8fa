//! Probe settings.
//!
//! Settings are read from `sheetprobe.toml`:
//!
//! ```toml
//! [detection]
//! scan_limit = 15
//! min_meaningful = 3
//! selection = "best"
//! reject_long_cells = true
//! # "any_value", "text_only" or "keywords"
//! meaningful = "any_value"
//! header_keywords = ["number", "date", "total", "amount"]
//!
//! [extraction]
//! sample_rows = 3
//! display_width = 100
//! truncate_persisted = false
//!
//! [output]
//! json = "excel_analysis_results.json"
//!
//! [[inputs]]
//! path = "invoices.xlsx"
//! name = "Invoices"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detect::DetectorConfig;

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Header detection settings
    pub detection: DetectorConfig,
    /// Sample extraction settings
    pub extraction: ExtractionSettings,
    /// Report output settings
    pub output: OutputSettings,
    /// Workbooks to analyze, in order
    pub inputs: Vec<InputSpec>,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// Sample extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Data rows extracted below the header
    pub sample_rows: usize,
    /// Characters of text shown per value
    pub display_width: usize,
    /// Apply `display_width` to the persisted JSON document too
    pub truncate_persisted: bool,
    /// Leading rows copied into the raw preview
    pub preview_rows: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            sample_rows: 3,
            display_width: 100,
            truncate_persisted: false,
            preview_rows: 20,
        }
    }
}

impl ExtractionSettings {
    /// Truncation width for persisted values, if any
    pub fn persisted_width(&self) -> Option<usize> {
        self.truncate_persisted.then_some(self.display_width)
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// Path of the JSON document to write
    pub json: Option<String>,
}

/// One workbook to analyze
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputSpec {
    /// Path to the workbook
    pub path: String,
    /// Display name (defaults to the file name)
    #[serde(default)]
    pub name: Option<String>,
    /// Sheet to analyze (defaults to the first sheet)
    #[serde(default)]
    pub sheet: Option<String>,
}

impl InputSpec {
    /// Input for a path with no explicit name or sheet
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            sheet: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name shown in reports
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => Path::new(&self.path)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.clone()),
        }
    }
}
