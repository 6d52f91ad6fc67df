//! CLI argument definitions for the dashboard ETL.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

use bhd_model::OutputFormat;

#[derive(Parser)]
#[command(
    name = "bhd-etl",
    version,
    about = "Behavioral health dashboard ETL for Calaveras County",
    long_about = "Load public behavioral health datasets, clean and validate them,\n\
                  keep Calaveras County and statewide comparison rows, and publish\n\
                  CSV, Parquet, SQLite and XLSX outputs for the dashboard."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

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
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline and publish outputs.
    Run(RunArgs),

    /// List every registered dataset source.
    Sources(SourcesArgs),

    /// Show the schema, filter and cleaning rules of one dataset.
    Schema(SchemaArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding downloaded source files.
    #[arg(long = "downloads-dir", value_name = "DIR")]
    pub downloads_dir: Option<PathBuf>,

    /// Directory receiving the published outputs.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format to write (repeatable; default: all).
    #[arg(long = "format", value_name = "FORMAT")]
    pub formats: Vec<OutputFormat>,

    /// Process only this dataset (repeatable).
    #[arg(long = "dataset", value_name = "ID")]
    pub datasets: Vec<String>,

    /// Also write a Markdown data quality report.
    #[arg(long = "quality-report", value_name = "PATH")]
    pub quality_report: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Parser)]
pub struct SourcesArgs {
    /// TOML configuration file whose locator overrides should be shown.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// Dataset identifier.
    #[arg(value_name = "ID")]
    pub dataset_id: String,
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
