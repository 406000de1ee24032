//! End-to-end: processed files on disk through to the rendered page.

use std::fs;
use std::path::Path;

use cfv_dashboard::{
    CaseMerge, DashboardConfig, DashboardError, DataSource, LocalSource, build_dashboard,
    build_view, load_dashboard_data, render_html,
};
use cfv_model::{CaseStat, SelectedStat, StatKind, YearMonth};
use tempfile::TempDir;

const CASE_HEADER: &str = "year_month,Country_Region,Confirmed_cumulative,Deaths_cumulative,Recovered_cumulative,Active_cumulative,Confirmed_monthly_new\n";
const FLIGHT_HEADER: &str = "year_month,origin_country,origin_country_code,destination_country,destination_country_code,flight_count\n";

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn ym(raw: &str) -> YearMonth {
    raw.parse().unwrap()
}

fn processed_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "covid_202006_all.csv",
        &format!("{CASE_HEADER}2020-06,US,100,1,0,99,\n2020-06,Italy,50,2,10,38,\n"),
    );
    write(
        dir.path(),
        "covid_202007_all.csv",
        &format!("{CASE_HEADER}2020-07,US,300,3,0,297,\n2020-07,Italy,80,4,20,56,\n"),
    );
    write(
        dir.path(),
        "covid_202006_US.csv",
        &format!("{CASE_HEADER}2020-06,US,100,1,0,99,\n"),
    );
    write(
        dir.path(),
        "covid_202007_US.csv",
        // Stale monthly_new is ignored and recomputed after merging.
        &format!("{CASE_HEADER}2020-07,US,300,3,0,297,999\n"),
    );
    write(
        dir.path(),
        "flight_2020_US.csv",
        &format!(
            "{FLIGHT_HEADER}2020-06,Germany,DE,United States,US,4\n\
             2020-07,Germany,DE,United States,US,6\n\
             2020-07,France,FR,United States,US,2\n"
        ),
    );
    dir
}

#[test]
fn files_merge_into_one_row_per_month() {
    let dir = processed_dir();
    let source = LocalSource::new(dir.path().to_path_buf());
    let data = load_dashboard_data(&source, "US", CaseMerge::Sum).unwrap();

    assert_eq!(data.cases_focus.height(), 2);
    assert_eq!(data.cases_all.as_ref().unwrap().height(), 4);

    let view = build_view(&data, SelectedStat::default(), None, None).unwrap();
    assert_eq!(view.range.start, ym("2020-06"));
    assert_eq!(view.range.end, ym("2020-07"));
    assert_eq!(view.series.months, vec!["2020-06", "2020-07"]);
    assert_eq!(
        view.series.values(SelectedStat::default()).unwrap(),
        &[None, Some(200.0)]
    );
    assert_eq!(view.series.flights, vec![Some(4.0), Some(8.0)]);
    assert_eq!(
        view.choropleth.flights_by_origin,
        vec![("France".to_string(), 2.0), ("Germany".to_string(), 10.0)]
    );
}

#[test]
fn missing_focus_files_is_an_error() {
    let dir = processed_dir();
    let source = LocalSource::new(dir.path().to_path_buf());
    let err = load_dashboard_data(&source, "Italy", CaseMerge::Sum).unwrap_err();
    assert!(matches!(err, DashboardError::NoFiles { ref pattern, .. } if pattern == "covid_*_Italy.csv"));
}

#[test]
fn flights_are_optional() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "covid_202006_US.csv",
        &format!("{CASE_HEADER}2020-06,US,100,1,0,99,\n"),
    );
    let source = LocalSource::new(dir.path().to_path_buf());
    let data = load_dashboard_data(&source, "US", CaseMerge::Max).unwrap();
    assert!(data.flights_focus.is_none());
    assert!(data.cases_all.is_none());

    let view = build_view(&data, SelectedStat::default(), None, None).unwrap();
    assert_eq!(view.series.flights, vec![None]);
    assert!(view.correlations.iter().all(|(_, r)| r.is_none()));
    let html = render_html(&view).unwrap();
    assert!(html.contains("r = n/a"));
}

#[test]
fn dashboard_page_is_written() {
    let dir = processed_dir();
    let output = dir.path().join("out").join("dashboard.html");
    let config = DashboardConfig {
        source: DataSource::Local(dir.path().to_path_buf()),
        output: output.clone(),
        ..DashboardConfig::default()
    };
    let view = build_dashboard(&config).unwrap();
    assert_eq!(view.focus, "US");

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("plotly"));
    assert!(html.contains("Confirmed Monthly New"));
}

#[test]
fn multi_country_exports_keep_only_focus_rows() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "covid_202007_Italy__US.csv",
        &format!("{CASE_HEADER}2020-07,Italy,1000,0,0,1000,\n2020-07,US,300,0,0,300,\n"),
    );
    write(
        dir.path(),
        "flight_202007_Italy__US.csv",
        &format!(
            "{FLIGHT_HEADER}2020-07,Germany,DE,Italy,IT,500\n\
             2020-07,France,FR,United States,US,6\n"
        ),
    );
    let source = LocalSource::new(dir.path().to_path_buf());
    let data = load_dashboard_data(&source, "US", CaseMerge::Sum).unwrap();

    let view = build_view(&data, SelectedStat::default(), None, None).unwrap();
    assert_eq!(view.series.months, vec!["2020-07"]);
    let cumulative = SelectedStat::new(CaseStat::Confirmed, StatKind::Cumulative);
    assert_eq!(view.series.values(cumulative).unwrap(), &[Some(300.0)]);
    assert_eq!(view.series.flights, vec![Some(6.0)]);
    assert_eq!(
        view.choropleth.flights_by_origin,
        vec![("France".to_string(), 6.0)]
    );
}

#[test]
fn overlapping_runs_double_count_under_sum_only() {
    let dir = TempDir::new().unwrap();
    for name in ["covid_2021_US.csv", "covid_202101_US.csv"] {
        write(
            dir.path(),
            name,
            &format!("{CASE_HEADER}2021-01,US,500,5,0,495,\n"),
        );
    }
    let source = LocalSource::new(dir.path().to_path_buf());
    let cumulative = SelectedStat::new(CaseStat::Confirmed, StatKind::Cumulative);

    let summed = load_dashboard_data(&source, "US", CaseMerge::Sum).unwrap();
    let view = build_view(&summed, cumulative, None, None).unwrap();
    assert_eq!(view.series.values(cumulative).unwrap(), &[Some(1000.0)]);

    let maxed = load_dashboard_data(&source, "US", CaseMerge::Max).unwrap();
    let view = build_view(&maxed, cumulative, None, None).unwrap();
    assert_eq!(view.series.values(cumulative).unwrap(), &[Some(500.0)]);
}
