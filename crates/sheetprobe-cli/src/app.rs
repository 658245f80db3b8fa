//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glob::glob;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use sheetprobe_data::extract::truncate_chars;
use sheetprobe_data::{
    open_source, InputSpec, MeaningfulRule, ProbeEngine, SelectionPolicy, Settings,
    WorkbookReport,
};

/// Settings files looked up in the working directory when `--config` is absent
const CONFIG_CANDIDATES: [&str; 2] = ["sheetprobe.toml", ".sheetprobe.toml"];

/// Width of the banner rules in text reports
const RULE_WIDTH: usize = 80;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON document, one record per workbook
    Json,
}

/// Header selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelectionArg {
    /// First qualifying row
    First,
    /// Fullest qualifying row, earliest on ties
    Best,
}

impl From<SelectionArg> for SelectionPolicy {
    fn from(arg: SelectionArg) -> Self {
        match arg {
            SelectionArg::First => SelectionPolicy::First,
            SelectionArg::Best => SelectionPolicy::Best,
        }
    }
}

/// Which cells count toward a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuleArg {
    /// Any non-blank cell
    AnyValue,
    /// Non-blank text cells
    TextOnly,
    /// Cells naming a typical column title
    Keywords,
}

impl From<RuleArg> for MeaningfulRule {
    fn from(arg: RuleArg) -> Self {
        match arg {
            RuleArg::AnyValue => MeaningfulRule::AnyValue,
            RuleArg::TextOnly => MeaningfulRule::TextOnly,
            RuleArg::Keywords => MeaningfulRule::Keywords,
        }
    }
}

#[derive(Parser)]
#[command(name = "sheetprobe")]
#[command(author, version, about = "Find the header row of messy spreadsheets", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect header rows and sample typed data rows
    Analyze(AnalyzeArgs),

    /// List the sheets of a workbook
    Sheets {
        /// Workbook file
        input: PathBuf,
    },
}

/// Arguments of the analyze command
#[derive(Debug, Clone, Default, Args)]
pub struct AnalyzeArgs {
    /// Workbooks or glob patterns (defaults to the settings file inputs)
    pub inputs: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the JSON document to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Last row examined for the header
    #[arg(long)]
    pub scan_limit: Option<usize>,

    /// Minimum non-blank cells in a header row
    #[arg(long)]
    pub min_meaningful: Option<usize>,

    /// Header selection policy
    #[arg(long, value_enum)]
    pub selection: Option<SelectionArg>,

    /// Which cells count toward a header row
    #[arg(long, value_enum)]
    pub meaningful: Option<RuleArg>,

    /// Data rows sampled below the header
    #[arg(long)]
    pub sample_rows: Option<usize>,

    /// Accept header rows with long or multi-line cells
    #[arg(long)]
    pub allow_long_cells: bool,

    /// Truncate long strings in the JSON document as well
    #[arg(long)]
    pub truncate: bool,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze(args) => {
            analyze_command(&args)?;
        }
        Commands::Sheets { input } => {
            sheets_command(&input)?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the analyze command
pub fn analyze_command(args: &AnalyzeArgs) -> Result<Vec<WorkbookReport>> {
    let mut settings = load_settings(args.config.as_deref())?;
    apply_overrides(&mut settings, args);

    let inputs = resolve_inputs(&args.inputs, &settings)?;
    if inputs.is_empty() {
        anyhow::bail!(
            "No workbooks to analyze.\n\
             \n\
             Pass files on the command line or list them under [[inputs]] in sheetprobe.toml"
        );
    }

    let engine = ProbeEngine::new(settings);
    let reports = engine.run_batch(&inputs);
    let settings = engine.settings();

    let json_path = args
        .output
        .clone()
        .or_else(|| settings.output.json.as_ref().map(PathBuf::from));

    if let Some(path) = &json_path {
        write_json(path, &reports)?;
    }

    match args.format {
        OutputFormat::Json if json_path.is_none() => {
            let json = serde_json::to_string_pretty(&reports)
                .context("Failed to serialize reports to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Json => {}
        OutputFormat::Text => {
            print!(
                "{}",
                render_text(&reports, settings.extraction.display_width)
            );
        }
    }

    if let Some(path) = &json_path {
        println!("Full results saved to: {}", path.display());
    }

    Ok(reports)
}

/// Execute the sheets command
pub fn sheets_command(input: &Path) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let source = open_source(input)
        .with_context(|| format!("Failed to open workbook: {}", input.display()))?;
    let sheets = source
        .list_sheets()
        .with_context(|| format!("Failed to list sheets: {}", input.display()))?;
    let default = source.default_sheet();

    for sheet in sheets {
        if default.as_deref() == Some(sheet.as_str()) {
            println!("{} (analyzed by default)", sheet);
        } else {
            println!("{}", sheet);
        }
    }

    Ok(())
}

/// Load settings from a config file or use defaults
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Settings::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        }
        None => {
            for candidate in CONFIG_CANDIDATES {
                if Path::new(candidate).exists() {
                    let content = fs::read_to_string(candidate)?;
                    match Settings::from_toml_str(&content) {
                        Ok(settings) => {
                            debug!(path = candidate, "loaded settings");
                            return Ok(settings);
                        }
                        Err(err) => warn!(path = candidate, %err, "ignoring invalid settings file"),
                    }
                }
            }
            Ok(Settings::default())
        }
    }
}

/// Apply command-line flags on top of file settings
pub fn apply_overrides(settings: &mut Settings, args: &AnalyzeArgs) {
    let detection = &mut settings.detection;
    if let Some(limit) = args.scan_limit {
        detection.scan_limit = limit;
    }
    if let Some(min) = args.min_meaningful {
        detection.min_meaningful = min;
    }
    if let Some(selection) = args.selection {
        detection.selection = selection.into();
    }
    if let Some(rule) = args.meaningful {
        detection.meaningful = rule.into();
    }
    if args.allow_long_cells {
        detection.reject_long_cells = false;
    }

    let extraction = &mut settings.extraction;
    if let Some(rows) = args.sample_rows {
        extraction.sample_rows = rows;
    }
    if args.truncate {
        extraction.truncate_persisted = true;
    }
}

/// Turn command-line arguments into inputs, expanding glob patterns
///
/// With no arguments the settings file inputs are used. A pattern that
/// matches nothing is kept verbatim so it shows up as a missing file.
pub fn resolve_inputs(args: &[String], settings: &Settings) -> Result<Vec<InputSpec>> {
    if args.is_empty() {
        return Ok(settings.inputs.clone());
    }

    let mut inputs = Vec::new();
    for arg in args {
        if !is_pattern(arg) {
            inputs.push(InputSpec::new(arg.clone()));
            continue;
        }

        let mut matched: Vec<PathBuf> = glob(arg)
            .with_context(|| format!("Invalid glob pattern: {}", arg))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Could not read {}", e);
                    None
                }
            })
            .collect();
        matched.sort();

        if matched.is_empty() {
            inputs.push(InputSpec::new(arg.clone()));
        } else {
            inputs.extend(
                matched
                    .into_iter()
                    .map(|path| InputSpec::new(path.display().to_string())),
            );
        }
    }

    Ok(inputs)
}

fn is_pattern(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

/// Write reports as a pretty-printed JSON array
pub fn write_json(path: &Path, reports: &[WorkbookReport]) -> Result<()> {
    let json =
        serde_json::to_string_pretty(reports).context("Failed to serialize reports to JSON")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write results: {}", path.display()))?;
    Ok(())
}

/// Render the human-readable summary of a batch
pub fn render_text(reports: &[WorkbookReport], display_width: usize) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    for report in reports {
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Excel: {}", report.name);
        let _ = writeln!(out, "File: {}", report.filepath);
        let _ = writeln!(out, "{}", rule);

        if let Some(error) = &report.error {
            let _ = writeln!(out, "ERROR: {}", error);
            let _ = writeln!(out);
            continue;
        }

        let _ = writeln!(
            out,
            "Sheet: {}",
            report.sheet_name.as_deref().unwrap_or("-")
        );
        let _ = writeln!(out, "Total rows: {}", report.total_rows);
        let _ = writeln!(out, "Total columns: {}", report.total_columns);
        if let Some(row) = report.header_row {
            let _ = writeln!(out, "Header Row: {}", row);
        }
        if let Some(row) = report.last_data_row {
            let _ = writeln!(out, "Last data row: {}", row);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Headers ({} columns):", report.headers.len());
        for header in &report.headers {
            let _ = writeln!(out, "  Column {}: {}", header.column, header.name);
        }

        let _ = writeln!(out);
        match report.sample_data.first() {
            Some(first) => {
                let _ = writeln!(out, "Sample Data (first data row after header):");
                let _ = writeln!(out, "  Row {}:", first.row_num);
                for cell in first.data.iter() {
                    let value = truncate_chars(&cell.value.to_string(), display_width);
                    let _ = writeln!(
                        out,
                        "    {} ({}): {} = {}",
                        cell.column, cell.header, cell.type_tag, value
                    );
                }
            }
            None => {
                let _ = writeln!(out, "No data rows below the header.");
            }
        }
        let _ = writeln!(out);
    }

    let analyzed = reports.iter().filter(|r| r.is_ok()).count();
    let _ = writeln!(
        out,
        "Analyzed {} of {} workbooks successfully.",
        analyzed,
        reports.len()
    );

    out
}
