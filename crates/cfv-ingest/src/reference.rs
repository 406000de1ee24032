//! Airport and country reference tables.
//!
//! Both tables are small and are required for a run. Only the columns the
//! mapper needs are deserialized; any other columns are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use cfv_model::schema::reference;

use crate::error::{IngestError, Result};

#[derive(Debug, Deserialize)]
struct AirportRow {
    #[serde(rename = "icao")]
    icao: Option<String>,
    #[serde(rename = "country")]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountryRow {
    #[serde(rename = "English short name lower case")]
    name: Option<String>,
    #[serde(rename = "Alpha-2 code")]
    alpha2: Option<String>,
}

/// Lookups from airport ICAO code to ISO alpha-2 code, and from alpha-2
/// code to the English country name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    airport_country: HashMap<String, String>,
    country_names: HashMap<String, String>,
}

impl ReferenceTables {
    pub fn new(
        airport_country: HashMap<String, String>,
        country_names: HashMap<String, String>,
    ) -> Self {
        Self {
            airport_country,
            country_names,
        }
    }

    /// Alpha-2 country code of an airport.
    pub fn airport_country(&self, icao: &str) -> Option<&str> {
        self.airport_country.get(icao.trim()).map(String::as_str)
    }

    /// English short name for an alpha-2 code.
    pub fn country_name(&self, alpha2: &str) -> Option<&str> {
        self.country_names.get(alpha2.trim()).map(String::as_str)
    }

    pub fn airport_count(&self) -> usize {
        self.airport_country.len()
    }

    pub fn country_count(&self) -> usize {
        self.country_names.len()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| IngestError::csv(path, e))
}

fn load_airports(path: &Path) -> Result<HashMap<String, String>> {
    let rows: Vec<AirportRow> = read_rows(path)?;
    let total = rows.len();
    let table: HashMap<String, String> = rows
        .into_iter()
        .filter_map(|row| Some((non_blank(row.icao)?, non_blank(row.country)?)))
        .collect();
    debug!(
        path = %path.display(),
        rows = total,
        usable = table.len(),
        "loaded airport table"
    );
    Ok(table)
}

fn load_countries(path: &Path) -> Result<HashMap<String, String>> {
    let rows: Vec<CountryRow> = read_rows(path)?;
    let total = rows.len();
    let table: HashMap<String, String> = rows
        .into_iter()
        .filter_map(|row| Some((non_blank(row.alpha2)?, non_blank(row.name)?)))
        .collect();
    debug!(
        path = %path.display(),
        rows = total,
        usable = table.len(),
        "loaded country table"
    );
    Ok(table)
}

/// Load `airports.csv` and `countries.csv` from the data root.
pub fn load_reference_tables(data_root: &Path) -> Result<ReferenceTables> {
    let airports = load_airports(&data_root.join(reference::AIRPORTS_FILE))?;
    let countries = load_countries(&data_root.join(reference::COUNTRIES_FILE))?;
    info!(
        airports = airports.len(),
        countries = countries.len(),
        "reference tables loaded"
    );
    Ok(ReferenceTables::new(airports, countries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tables(dir: &Path) {
        std::fs::write(
            dir.join("airports.csv"),
            "id,ident,type,name,icao,country\n\
             1,KJFK,large_airport,John F Kennedy,KJFK,US\n\
             2,EDDF,large_airport,Frankfurt,EDDF,DE\n\
             3,XXXX,closed,Nowhere,,ZZ\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("countries.csv"),
            "English short name lower case,Alpha-2 code,Alpha-3 code,Numeric code\n\
             United States,US,USA,840\n\
             Germany,DE,DEU,276\n",
        )
        .unwrap();
    }

    #[test]
    fn test_lookups() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());

        let tables = load_reference_tables(dir.path()).unwrap();
        assert_eq!(tables.airport_count(), 2);
        assert_eq!(tables.airport_country("KJFK"), Some("US"));
        assert_eq!(tables.country_name("DE"), Some("Germany"));
        assert_eq!(tables.airport_country("XXXX"), None);
        assert_eq!(tables.country_name("ZZ"), None);
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = load_reference_tables(dir.path());
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}
