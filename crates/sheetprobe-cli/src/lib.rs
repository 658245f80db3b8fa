//! sheetprobe CLI - Command-line interface library
//!
//! This library provides the CLI functionality for sheetprobe:
//! - Analyze: detect header rows and sample typed data
//! - Sheets: list the sheets of a workbook
//!
//! # Library Usage
//!
//! ```ignore
//! use sheetprobe_cli::{analyze_command, AnalyzeArgs, OutputFormat};
//!
//! let args = AnalyzeArgs {
//!     inputs: vec!["reports/*.xlsx".to_string()],
//!     format: OutputFormat::Json,
//!     ..Default::default()
//! };
//! let reports = analyze_command(&args)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Analyze workbooks listed in sheetprobe.toml
//! sheetprobe analyze
//!
//! # Analyze files directly and save the JSON document
//! sheetprobe analyze invoices.xlsx salaries.xlsx --output results.json
//!
//! # List sheets
//! sheetprobe sheets invoices.xlsx
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    analyze_command, apply_overrides, load_settings, render_text, resolve_inputs, sheets_command,
    write_json,
};
pub use app::{run_cli, AnalyzeArgs, OutputFormat, RuleArg, SelectionArg};
