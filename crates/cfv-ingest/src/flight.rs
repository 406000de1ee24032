//! Monthly flight list loading.
//!
//! Flight lists are large and mostly irrelevant to the pipeline; only the
//! `day`, `origin` and `destination` columns are kept. Every column is read
//! as a string so malformed timestamps survive until the mapper parses them.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Instant;

use flate2::read::GzDecoder;
use polars::prelude::*;
use tracing::{debug, info, warn};

use cfv_model::PeriodSelector;
use cfv_model::schema::flight;

use crate::LoadedBatch;
use crate::discovery::discover_flight_files;
use crate::error::{IngestError, Result};

/// Columns kept from each flight list, in output order.
const KEPT_COLUMNS: [&str; 3] = [flight::DAY, flight::ORIGIN, flight::DESTINATION];

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

fn projected_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_columns(Some(
            KEPT_COLUMNS.into_iter().map(PlSmallStr::from_static).collect(),
        ))
}

/// Fail with `MissingColumn` before parsing when a kept column is absent.
fn check_header<R: Read>(source: R, path: &Path) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers().map_err(|e| IngestError::csv(path, e))?;
    for column in KEPT_COLUMNS {
        if !headers.iter().any(|header| header.trim() == column) {
            return Err(IngestError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn read_projected(path: &Path) -> Result<DataFrame> {
    if is_gzip(path) {
        let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
        let mut bytes = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .map_err(|e| IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        check_header(bytes.as_slice(), path)?;
        // The decompressed buffer is dropped once the three columns are parsed.
        projected_options()
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| IngestError::csv(path, e))
    } else {
        let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
        check_header(file, path)?;
        projected_options()
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| IngestError::csv(path, e))?
            .finish()
            .map_err(|e| IngestError::csv(path, e))
    }
}

/// Read one flight list (plain or gzip-compressed) keeping `day`, `origin`
/// and `destination` as string columns. Other columns are never parsed.
pub fn read_flight_list(path: &Path) -> Result<DataFrame> {
    let df = read_projected(path)?;
    Ok(df.select(KEPT_COLUMNS)?)
}

/// Load every flight list whose start date falls in the selected period.
///
/// Unreadable files are skipped with a warning.
pub fn load_flight_lists(dir: &Path, selector: PeriodSelector) -> Result<LoadedBatch> {
    let start = Instant::now();
    let files = discover_flight_files(dir, selector)?;
    debug!(
        dir = %dir.display(),
        period = %selector,
        file_count = files.len(),
        "discovered flight lists"
    );

    let mut batch = LoadedBatch::default();
    for file in files {
        match read_flight_list(&file.path) {
            Ok(df) => {
                debug!(path = %file.path.display(), rows = df.height(), "read flight list");
                batch.push(file.path, df)?;
            }
            Err(error) => {
                warn!(path = %file.path.display(), %error, "skipping flight list");
                batch.skip(file.path, error.to_string());
            }
        }
    }

    info!(
        period = %selector,
        loaded = batch.loaded.len(),
        skipped = batch.skipped.len(),
        rows = batch.row_count(),
        duration_ms = start.elapsed().as_millis(),
        "flight lists loaded"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    const CONTENT: &str = "callsign,number,icao24,registration,typecode,origin,destination,\
                           firstseen,lastseen,day,latitude_1,longitude_1\n\
                           DLH400,LH400,3c4b26,D-ABYD,B748,EDDF,KJFK,\
                           2021-01-01 10:00:00+00:00,2021-01-01 18:00:00+00:00,\
                           2021-01-01 00:00:00+00:00,50.0,8.5\n";

    #[test]
    fn test_reads_plain_and_keeps_three_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flightlist_20210101_20210131.csv");
        std::fs::write(&path, CONTENT).unwrap();

        let df = read_flight_list(&path).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["day", "origin", "destination"]);
        assert_eq!(df.column("day").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_reads_gzip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flightlist_20210101_20210131.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(CONTENT.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let df = read_flight_list(&path).unwrap();
        assert_eq!(df.height(), 1);
        let origin = df.column("origin").unwrap().str().unwrap();
        assert_eq!(origin.get(0), Some("EDDF"));
    }

    #[test]
    fn test_gzip_projection_keeps_column_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flightlist_20210201_20210228.csv.gz");
        // Kept columns appear in a different order than in the output.
        let body = "destination,extra,day,origin\nKJFK,x,2021-02-01 00:00:00+00:00,EDDF\n";
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let df = read_flight_list(&path).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["day", "origin", "destination"]);
        assert_eq!(df.column("destination").unwrap().str().unwrap().get(0), Some("KJFK"));
    }

    #[test]
    fn test_missing_column_in_gzip_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flightlist_20210101_20210131.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"callsign,origin,day\nDLH400,EDDF,2021-01-01\n").unwrap();
        encoder.finish().unwrap();

        let result = read_flight_list(&path);
        assert!(matches!(
            result,
            Err(IngestError::MissingColumn { ref column, .. }) if column == "destination"
        ));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flightlist_20210101_20210131.csv");
        std::fs::write(&path, "callsign,origin\nDLH400,EDDF\n").unwrap();

        let result = read_flight_list(&path);
        assert!(matches!(result, Err(IngestError::MissingColumn { .. })));
    }
}
