//! CLI argument definitions for the cohort browser.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "melanoma",
    version,
    about = "Melanoma cohort browser - descriptive statistics over a patient database",
    long_about = "Browse a melanoma patient database.\n\n\
                  Loads the cohort CSV and its variable catalog, filters patients and\n\
                  prints descriptive statistics and kinetics series."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Application configuration file.
    #[arg(
        long = "config",
        short = 'c',
        value_name = "PATH",
        default_value = "melanoma.toml",
        global = true
    )]
    pub config: PathBuf,

    /// Patient database CSV (overrides the configured path).
    #[arg(long = "data", value_name = "CSV", global = true)]
    pub data: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the loaded database file.
    Info,

    /// List the configured variables.
    Variables(VariablesArgs),

    /// Print descriptive statistics.
    Stats(StatsArgs),

    /// Print per-patient kinetics series.
    Kinetics(KineticsArgs),

    /// Count and list the patients kept by a set of filters.
    Filter(FilterArgs),

    /// List the saved variable selections.
    Selections,
}

#[derive(Args)]
pub struct VariablesArgs {
    /// Only variables of these kinds.
    #[arg(long = "kind", value_name = "KIND")]
    pub kinds: Vec<String>,

    /// Only selectable variables.
    #[arg(long = "selectable")]
    pub selectable: bool,
}

/// Patient filters shared by several commands.
#[derive(Args, Default)]
pub struct FilterOptions {
    /// Keep rows whose label is one of the values: `ID=VALUE[,VALUE...]`.
    #[arg(long = "where", value_name = "ID=VALUES")]
    pub categorical: Vec<String>,

    /// Keep rows with an iteration valued in a range: `REFERENCE:LOW:HIGH`.
    #[arg(long = "between", value_name = "REF:LOW:HIGH")]
    pub between: Vec<String>,

    /// Keep rows with an iteration valued exactly: `REFERENCE:VALUE`.
    #[arg(long = "at", value_name = "REF:VALUE")]
    pub at: Vec<String>,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Variable ids (default: every selectable variable).
    #[arg(value_name = "ID")]
    pub variables: Vec<String>,

    /// Read the variable ids from a selection file.
    #[arg(long = "selection", value_name = "JSON", conflicts_with = "variables")]
    pub selection: Option<PathBuf>,

    /// Group by categorical or boolean variables.
    #[arg(long = "group-by", value_name = "ID")]
    pub group_by: Vec<String>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,

    /// Denominator of categorical percentages.
    #[arg(long = "percentages", value_enum, default_value = "non-missing")]
    pub percentages: PercentageBaseArg,

    /// Add the span row to datetime statistics.
    #[arg(long = "span")]
    pub span: bool,

    /// Save the requested variables as a selection file.
    #[arg(long = "save-selection", value_name = "JSON")]
    pub save_selection: Option<PathBuf>,

    #[command(flatten)]
    pub filters: FilterOptions,
}

#[derive(Args)]
pub struct KineticsArgs {
    /// Iterated time reference.
    #[arg(long = "time", value_name = "ID", default_value = "TIEMPO IT{N}")]
    pub time: String,

    /// Iterated measured variable.
    #[arg(long = "value", value_name = "ID")]
    pub value: String,

    /// Only these patients.
    #[arg(long = "patient", value_name = "ID")]
    pub patients: Vec<String>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: SeriesFormatArg,

    #[command(flatten)]
    pub filters: FilterOptions,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Print the kept patient ids.
    #[arg(long = "list")]
    pub list: bool,

    /// Export the kept patients to a CSV file.
    #[arg(long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Variables to export (repeatable); iterated variables export every
    /// iteration. Defaults to every column.
    #[arg(long = "columns", value_name = "ID", requires = "output")]
    pub columns: Vec<String>,

    #[command(flatten)]
    pub filters: FilterOptions,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Csv,
    Markdown,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SeriesFormatArg {
    Table,
    Csv,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PercentageBaseArg {
    NonMissing,
    Total,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
