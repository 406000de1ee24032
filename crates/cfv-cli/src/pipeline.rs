//! Pipeline run for one period selection.
//!
//! The pipeline follows these stages in order:
//! 1. **Context**: Load the airport and country reference tables
//! 2. **Cases**: Load daily reports, clean dates, aggregate per country-month
//! 3. **Flights**: Load flight lists, map airports to countries, count itineraries
//! 4. **Export**: Write the `all` tables and, with a country filter, the
//!    filtered ones
//!
//! A failing case or flight stage is recorded and the run continues with the
//! other source. Only the reference tables and the export are fatal.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use cfv_ingest::{ReferenceTables, load_case_reports, load_flight_lists, load_reference_tables};
use cfv_model::schema::case;
use cfv_model::scope::ALL_SCOPE;
use cfv_model::{
    CountryAliases, CountryFilter, DateWindow, Direction, Granularity, PeriodSelector,
};
use cfv_output::{DataKind, ExportedFile, export_frame};
use cfv_transform::{FlightOptions, aggregate_cases, aggregate_flights, filter_values, map_flights};

use crate::types::{ProcessResult, StageOutput, StageSummary};

pub const DEFAULT_DATA_PATH: &str = "data";
pub const DEFAULT_COVID_FOLDER: &str = "csse_covid_19_daily_reports";
pub const DEFAULT_FLIGHT_FOLDER: &str = "flight_volume_raw";
pub const DEFAULT_SAVE_FOLDER: &str = "processed_data";

/// Everything a pipeline run is parameterised by.
///
/// Folder paths are resolved against `data_path` unless absolute.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    pub covid_folder: PathBuf,
    pub flight_folder: PathBuf,
    pub save_folder: PathBuf,
    pub period: PeriodSelector,
    pub countries: CountryFilter,
    pub aliases: CountryAliases,
    pub window: DateWindow,
    pub direction: Direction,
    pub granularity: Granularity,
    /// Aggregate and report without writing files.
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            covid_folder: PathBuf::from(DEFAULT_COVID_FOLDER),
            flight_folder: PathBuf::from(DEFAULT_FLIGHT_FOLDER),
            save_folder: PathBuf::from(DEFAULT_SAVE_FOLDER),
            period: PeriodSelector::All,
            countries: CountryFilter::default(),
            aliases: CountryAliases::default(),
            window: DateWindow::default(),
            direction: Direction::default(),
            granularity: Granularity::default(),
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    pub fn covid_dir(&self) -> PathBuf {
        self.data_path.join(&self.covid_folder)
    }

    pub fn flight_dir(&self) -> PathBuf {
        self.data_path.join(&self.flight_folder)
    }

    pub fn save_dir(&self) -> PathBuf {
        self.data_path.join(&self.save_folder)
    }

    /// Country filter for flight tables, in reference-table names.
    pub fn flight_countries(&self) -> CountryFilter {
        self.countries.translated(&self.aliases)
    }

    /// `*` in the country list selects every country, which the `all`
    /// export already covers.
    fn wants_filtered(&self) -> bool {
        !self.countries.is_empty() && !self.countries.countries().iter().any(|c| c == "*")
    }
}

/// Configuration plus the reference tables loaded for the run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub reference: ReferenceTables,
}

impl PipelineContext {
    /// Load the reference tables from `config.data_path`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let reference = load_reference_tables(&config.data_path).with_context(|| {
            format!(
                "load reference tables from {}",
                config.data_path.display()
            )
        })?;
        Ok(Self::with_reference(config, reference))
    }

    pub fn with_reference(config: PipelineConfig, reference: ReferenceTables) -> Self {
        Self { config, reference }
    }
}

// ============================================================================
// Stage 2: Cases
// ============================================================================

/// Aggregate the selected case reports for every country and, when a filter
/// is set, for the requested countries.
pub fn process_cases(ctx: &PipelineContext) -> Result<(StageOutput, usize)> {
    let config = &ctx.config;
    let dir = config.covid_dir();
    let batch = load_case_reports(&dir, config.period)
        .with_context(|| format!("load case reports from {}", dir.display()))?;

    let mut output = StageOutput::empty("cases");
    output.summary.files = batch.loaded.len();
    output.summary.skipped_files = batch.skipped.len();
    output.skipped = batch.skipped;

    let Some(raw) = batch.frame else {
        warn!(period = %config.period, dir = %dir.display(), "no case reports for period");
        return Ok((output, 0));
    };

    let summary = aggregate_cases(&raw, config.window, None).context("aggregate cases")?;
    output.summary.input_rows = summary.dates.input_rows;
    output.summary.dropped_rows = summary.dates.dropped_rows();
    output.summary.output_rows = summary.monthly.height();

    if config.wants_filtered() {
        let filtered = filter_values(
            &summary.monthly,
            case::COUNTRY_REGION,
            config.countries.countries(),
        )
        .context("filter case summary")?;
        if filtered.height() == 0 {
            warn!(countries = ?config.countries.countries(), "country filter matched no case rows");
        }
        output.filtered = Some(filtered);
    }
    let decreases = summary.decreases.len();
    output.all = Some(summary.monthly);
    Ok((output, decreases))
}

// ============================================================================
// Stage 3: Flights
// ============================================================================

/// Map and count the selected flight lists.
pub fn process_flights(ctx: &PipelineContext) -> Result<StageOutput> {
    let config = &ctx.config;
    let dir = config.flight_dir();
    let batch = load_flight_lists(&dir, config.period)
        .with_context(|| format!("load flight lists from {}", dir.display()))?;

    let mut output = StageOutput::empty("flights");
    output.summary.files = batch.loaded.len();
    output.summary.skipped_files = batch.skipped.len();
    output.skipped = batch.skipped;

    let Some(raw) = batch.frame else {
        warn!(period = %config.period, dir = %dir.display(), "no flight lists for period");
        return Ok(output);
    };

    let mapped = map_flights(&raw, &ctx.reference).context("map flights")?;
    let options = FlightOptions {
        direction: config.direction,
        granularity: config.granularity,
        countries: None,
    };
    let all = aggregate_flights(&mapped.frame, &options).context("aggregate flights")?;
    output.summary.input_rows = mapped.input_rows;
    output.summary.dropped_rows = mapped.dropped_rows();
    output.summary.output_rows = all.height();

    if config.wants_filtered() {
        let countries = config.flight_countries();
        let filtered = filter_values(
            &all,
            config.direction.country_column(),
            countries.countries(),
        )
        .context("filter flight summary")?;
        if filtered.height() == 0 {
            warn!(
                countries = ?countries.countries(),
                direction = %config.direction,
                "country filter matched no flight rows"
            );
        }
        output.filtered = Some(filtered);
    }
    output.all = Some(all);
    Ok(output)
}

// ============================================================================
// Stage 4: Export
// ============================================================================

/// Write every table a stage produced. Returns the written files.
pub fn export_stage(
    config: &PipelineConfig,
    kind: DataKind,
    stage: &StageOutput,
) -> Result<Vec<ExportedFile>> {
    let save_dir = config.save_dir();
    let mut written = Vec::new();
    if let Some(all) = &stage.all {
        written.push(
            export_frame(all, &save_dir, kind, config.period, ALL_SCOPE)
                .with_context(|| format!("export {} table", kind.prefix()))?,
        );
    }
    if let Some(filtered) = &stage.filtered {
        written.push(
            export_frame(
                filtered,
                &save_dir,
                kind,
                config.period,
                &config.countries.scope_token(),
            )
            .with_context(|| format!("export filtered {} table", kind.prefix()))?,
        );
    }
    Ok(written)
}

// ============================================================================
// Orchestration
// ============================================================================

fn recover<T>(stage: &'static str, result: Result<T>, errors: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            let message = format!("{error:#}");
            warn!(stage, error = %message, "stage failed; continuing without it");
            errors.push(format!("{stage}: {message}"));
            None
        }
    }
}

/// Run every stage for the configured period.
pub fn run_pipeline(ctx: &PipelineContext) -> Result<ProcessResult> {
    let config = &ctx.config;
    let scope = config.countries.scope_token();
    let run_span = info_span!("pipeline", period = %config.period, scope = %scope);
    let _run_guard = run_span.enter();
    let mut errors = Vec::new();

    let cases_start = Instant::now();
    let (cases, decreases) = recover(
        "cases",
        info_span!("cases").in_scope(|| process_cases(ctx)),
        &mut errors,
    )
    .unwrap_or_else(|| (StageOutput::empty("cases"), 0));
    info!(
        rows = cases.summary.output_rows,
        duration_ms = cases_start.elapsed().as_millis(),
        "case stage complete"
    );

    let flights_start = Instant::now();
    let flights = recover(
        "flights",
        info_span!("flights").in_scope(|| process_flights(ctx)),
        &mut errors,
    )
    .unwrap_or_else(|| StageOutput::empty("flights"));
    info!(
        rows = flights.summary.output_rows,
        duration_ms = flights_start.elapsed().as_millis(),
        "flight stage complete"
    );

    let mut exports = Vec::new();
    if config.dry_run {
        info!("dry run; skipping export");
    } else {
        let export_span = info_span!("export", save_dir = %config.save_dir().display());
        let _export_guard = export_span.enter();
        exports.extend(export_stage(config, DataKind::Covid, &cases)?);
        exports.extend(export_stage(config, DataKind::Flight, &flights)?);
        info!(files = exports.len(), "export complete");
    }

    let mut skipped = cases.skipped;
    skipped.extend(flights.skipped);
    Ok(ProcessResult {
        period: config.period,
        scope,
        save_dir: config.save_dir(),
        stages: vec![cases.summary, flights.summary],
        exports,
        skipped,
        errors,
        decreases,
        dry_run: config.dry_run,
    })
}
