//! Integration tests for a full pipeline run over a small data folder.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use cfv_cli::pipeline::{PipelineConfig, PipelineContext, run_pipeline};
use cfv_model::CountryFilter;

const CASE_HEADER: &str = "FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,\
                           Confirmed,Deaths,Recovered,Active,Combined_Key,Incident_Rate,\
                           Case_Fatality_Ratio";

fn case_row(country: &str, stamp: &str, confirmed: i64) -> String {
    format!(",,,{country},{stamp},0,0,{confirmed},0,0,{confirmed},{country},,")
}

fn write_reports(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    let days = [
        ("03-01-2021.csv", "2021-03-01 04:00:00", 100, 10),
        ("03-02-2021.csv", "2021-03-02 04:00:00", 140, 12),
        ("03-03-2021.csv", "2682-01-01 04:00:00", 190, 15),
    ];
    for (name, stamp, us, italy) in days {
        let body = format!(
            "{CASE_HEADER}\n{}\n{}\n",
            case_row("US", stamp, us),
            case_row("Italy", stamp, italy)
        );
        fs::write(dir.join(name), body).unwrap();
    }
}

fn write_flights(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    let body = "callsign,origin,destination,day\n\
                DLH400,EDDF,KJFK,2021-03-01 00:00:00+00:00\n\
                AFR006,LFPG,KJFK,2021-03-02 00:00:00+00:00\n\
                DAL1,KATL,KJFK,2021-03-02 00:00:00+00:00\n\
                AZA608,LIRF,EDDF,2021-03-03 00:00:00+00:00\n\
                XXX1,ZZZZ,KJFK,2021-03-04 00:00:00+00:00\n";
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.as_bytes()).unwrap();
    fs::write(
        dir.join("flightlist_20210301_20210331.csv.gz"),
        encoder.finish().unwrap(),
    )
    .unwrap();
}

fn write_reference(root: &Path) {
    fs::write(
        root.join("airports.csv"),
        "icao,name,country\nEDDF,Frankfurt,DE\nLFPG,Paris,FR\nKJFK,New York,US\nKATL,Atlanta,US\nLIRF,Rome,IT\n",
    )
    .unwrap();
    fs::write(
        root.join("countries.csv"),
        "English short name lower case,Alpha-2 code\nGermany,DE\nFrance,FR\nUnited States,US\nItaly,IT\n",
    )
    .unwrap();
}

fn data_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_reference(dir.path());
    write_reports(&dir.path().join("csse_covid_19_daily_reports"));
    write_flights(&dir.path().join("flight_volume_raw"));
    dir
}

fn config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        data_path: root.to_path_buf(),
        period: "202103".parse().unwrap(),
        countries: CountryFilter::new(["US"]),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_run_exports_all_and_filtered_tables() {
    let root = data_root();
    let context = PipelineContext::new(config(root.path())).unwrap();
    let result = run_pipeline(&context).unwrap();

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.scope, "US");
    let mut names: Vec<String> = result
        .exports
        .iter()
        .map(|file| file.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "covid_202103_US.csv",
            "covid_202103_all.csv",
            "flight_202103_US.csv",
            "flight_202103_all.csv",
        ]
    );

    let save_dir = root.path().join("processed_data");
    let us_cases = fs::read_to_string(save_dir.join("covid_202103_US.csv")).unwrap();
    assert_eq!(us_cases.lines().count(), 2);
    assert!(us_cases.lines().nth(1).unwrap().starts_with("2021-03,US,140,"));

    let us_flights = fs::read_to_string(save_dir.join("flight_202103_US.csv")).unwrap();
    // Frankfurt and Paris into New York; Atlanta is domestic.
    assert_eq!(us_flights.lines().count(), 3);
    assert!(us_flights.lines().all(|line| !line.contains(",US,United States,US,")));
}

#[test]
fn test_stage_summaries_count_dropped_rows() {
    let root = data_root();
    let context = PipelineContext::new(config(root.path())).unwrap();
    let result = run_pipeline(&context).unwrap();

    let cases = &result.stages[0];
    assert_eq!(cases.stage, "cases");
    assert_eq!(cases.files, 3);
    assert_eq!(cases.input_rows, 6);
    // Both rows stamped 2682 are outside the date window.
    assert_eq!(cases.dropped_rows, 2);
    assert_eq!(cases.output_rows, 2);

    let flights = &result.stages[1];
    assert_eq!(flights.input_rows, 5);
    assert_eq!(flights.dropped_rows, 1);
}

#[test]
fn test_dry_run_writes_nothing() {
    let root = data_root();
    let mut config = config(root.path());
    config.dry_run = true;
    let result = run_pipeline(&PipelineContext::new(config).unwrap()).unwrap();
    assert!(result.exports.is_empty());
    assert!(!root.path().join("processed_data").exists());
}

#[test]
fn test_missing_flight_folder_is_not_fatal() {
    let root = data_root();
    fs::remove_dir_all(root.path().join("flight_volume_raw")).unwrap();
    let result = run_pipeline(&PipelineContext::new(config(root.path())).unwrap()).unwrap();
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("flights:"));
    assert_eq!(result.exports.len(), 2);
}

#[test]
fn test_missing_reference_tables_is_fatal() {
    let root = data_root();
    fs::remove_file(root.path().join("countries.csv")).unwrap();
    assert!(PipelineContext::new(config(root.path())).is_err());
}
