use anyhow::{Context, Result};
use tracing::info_span;

use cfv_cli::pipeline::{PipelineConfig, PipelineContext, run_pipeline};
use cfv_cli::types::ProcessResult;
use cfv_dashboard::{DashboardConfig, DashboardView, DataSource, build_dashboard};
use cfv_model::{CountryAliases, CountryFilter, DateWindow};

use crate::cli::{DashboardArgs, ProcessArgs};

fn aliases_from(pairs: &[(String, String)]) -> CountryAliases {
    let mut aliases = CountryAliases::default();
    for (from, to) in pairs {
        aliases.insert(from.clone(), to.clone());
    }
    aliases
}

pub fn pipeline_config(args: &ProcessArgs) -> Result<PipelineConfig> {
    let aliases = aliases_from(&args.aliases);
    let window = DateWindow::new(args.min_year, args.max_year).context("date window")?;
    Ok(PipelineConfig {
        data_path: args.data_path.clone(),
        covid_folder: args.covid_folder.clone(),
        flight_folder: args.flight_folder.clone(),
        save_folder: args.save_folder.clone(),
        period: args.period,
        countries: CountryFilter::new(args.countries.iter().map(String::as_str)),
        aliases,
        window,
        direction: args.direction.into(),
        granularity: args.granularity.into(),
        dry_run: args.dry_run,
    })
}

/// Loads the reference tables first; failing that is the one fatal input
/// error of a run.
pub fn run_process(args: &ProcessArgs) -> Result<ProcessResult> {
    let config = pipeline_config(args)?;
    let context = info_span!("context", data_path = %config.data_path.display())
        .in_scope(|| PipelineContext::new(config))?;
    run_pipeline(&context)
}

pub fn dashboard_config(args: &DashboardArgs) -> DashboardConfig {
    let source = if args.object_store {
        DataSource::ObjectStore
    } else {
        DataSource::Local(args.data_path.clone())
    };
    DashboardConfig {
        source,
        focus: args.country.clone(),
        stat: args.stat,
        start: args.start,
        end: args.end,
        case_merge: args.case_merge.into(),
        aliases: aliases_from(&args.aliases),
        output: args.output.clone(),
    }
}

pub fn run_dashboard(args: &DashboardArgs) -> Result<DashboardView> {
    let config = dashboard_config(args);
    let span = info_span!("dashboard", focus = %config.focus);
    let _guard = span.enter();
    build_dashboard(&config).context("build dashboard")
}
