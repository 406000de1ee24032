//! CLI argument definitions for the case/flight pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use cfv_dashboard::CaseMerge;
use cfv_model::{CountryAliases, Direction, Granularity, PeriodSelector, SelectedStat, YearMonth};

use cfv_cli::pipeline::{
    DEFAULT_COVID_FOLDER, DEFAULT_DATA_PATH, DEFAULT_FLIGHT_FOLDER, DEFAULT_SAVE_FOLDER,
};

#[derive(Parser)]
#[command(
    name = "cfv",
    version,
    about = "COVID cases vs flight volume - aggregate raw data and render a dashboard",
    long_about = "Aggregate daily COVID-19 case reports and monthly flight lists to\n\
                  country-month tables, then compare case trends with cross-border\n\
                  flight volume in an HTML dashboard."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Aggregate case reports and flight lists for a period and export CSVs.
    Process(ProcessArgs),

    /// Render the HTML dashboard from processed CSVs.
    Dashboard(DashboardArgs),

    /// List the selectable case statistics.
    Stats,
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Period to process: YYYYMM for a month, YYYY for a year, * for all.
    #[arg(long = "year-month", value_name = "PERIOD")]
    pub period: PeriodSelector,

    /// Country_Region value to export separately (repeatable).
    #[arg(long = "country", value_name = "NAME")]
    pub countries: Vec<String>,

    /// Root folder holding the input folders and reference tables.
    #[arg(long = "data-path", value_name = "DIR", default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Daily case report folder, relative to the data path.
    #[arg(long = "covid-folder", value_name = "DIR", default_value = DEFAULT_COVID_FOLDER)]
    pub covid_folder: PathBuf,

    /// Flight list folder, relative to the data path.
    #[arg(long = "flight-folder", value_name = "DIR", default_value = DEFAULT_FLIGHT_FOLDER)]
    pub flight_folder: PathBuf,

    /// Output folder, relative to the data path.
    #[arg(long = "save-folder", value_name = "DIR", default_value = DEFAULT_SAVE_FOLDER)]
    pub save_folder: PathBuf,

    /// Itinerary end the flight counts are keyed on.
    #[arg(long = "direction", value_enum, default_value = "destination")]
    pub direction: DirectionArg,

    /// Time bucket for flight counts.
    #[arg(long = "granularity", value_enum, default_value = "year-month")]
    pub granularity: GranularityArg,

    /// Earliest plausible report year.
    #[arg(long = "min-year", default_value_t = 2020)]
    pub min_year: i32,

    /// Latest plausible report year.
    #[arg(long = "max-year", default_value_t = 2024)]
    pub max_year: i32,

    /// Map a case-report country name to its reference-table name
    /// (FROM=TO, repeatable). `US=United States` is always present.
    #[arg(long = "alias", value_name = "FROM=TO", value_parser = parse_alias)]
    pub aliases: Vec<(String, String)>,

    /// Aggregate and report without writing files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct DashboardArgs {
    /// Local folder holding processed CSVs.
    #[arg(
        long = "data-path",
        value_name = "DIR",
        default_value = "data/processed_data",
        conflicts_with = "object_store"
    )]
    pub data_path: PathBuf,

    /// Read processed CSVs from the bucket named by PROJECT_ID and BUCKET_NAME.
    #[arg(long = "object-store")]
    pub object_store: bool,

    /// Focus country token used in processed file names.
    #[arg(long = "country", value_name = "NAME", default_value = cfv_dashboard::DEFAULT_FOCUS)]
    pub country: String,

    /// Statistic selected when the page opens.
    #[arg(long = "stat", value_name = "STAT", default_value = "Confirmed_monthly_new")]
    pub stat: SelectedStat,

    /// First month of the range (YYYY-MM).
    #[arg(long = "start", value_name = "YYYY-MM")]
    pub start: Option<YearMonth>,

    /// Last month of the range (YYYY-MM).
    #[arg(long = "end", value_name = "YYYY-MM")]
    pub end: Option<YearMonth>,

    /// How duplicate case rows from overlapping files are combined. `sum`
    /// double-counts months exported by overlapping runs; `max` does not.
    #[arg(long = "case-merge", value_enum, default_value = "sum")]
    pub case_merge: CaseMergeArg,

    /// Map the focus name to its flight-table country name (FROM=TO,
    /// repeatable). `US=United States` is always present.
    #[arg(long = "alias", value_name = "FROM=TO", value_parser = parse_alias)]
    pub aliases: Vec<(String, String)>,

    /// HTML file to write.
    #[arg(long = "output", value_name = "PATH", default_value = "dashboard.html")]
    pub output: PathBuf,
}

fn parse_alias(raw: &str) -> Result<(String, String), String> {
    CountryAliases::parse_pair(raw).map_err(|error| error.to_string())
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    Origin,
    Destination,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Origin => Direction::Origin,
            DirectionArg::Destination => Direction::Destination,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GranularityArg {
    Day,
    YearMonth,
}

impl From<GranularityArg> for Granularity {
    fn from(value: GranularityArg) -> Self {
        match value {
            GranularityArg::Day => Granularity::Day,
            GranularityArg::YearMonth => Granularity::YearMonth,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CaseMergeArg {
    Sum,
    Max,
}

impl From<CaseMergeArg> for CaseMerge {
    fn from(value: CaseMergeArg) -> Self {
        match value {
            CaseMergeArg::Sum => CaseMerge::Sum,
            CaseMergeArg::Max => CaseMerge::Max,
        }
    }
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
