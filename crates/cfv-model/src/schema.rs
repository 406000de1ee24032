//! Column-name constants for every table the pipeline reads or writes.
//! Single source of truth for loaders, aggregators, exporter and dashboard.

// ── Daily case report columns ───────────────────────────────────────────────
pub mod case {
    pub const FIPS: &str = "FIPS";
    pub const ADMIN2: &str = "Admin2";
    pub const PROVINCE_STATE: &str = "Province_State";
    pub const COUNTRY_REGION: &str = "Country_Region";
    pub const LAST_UPDATE: &str = "Last_Update";
    pub const LAT: &str = "Lat";
    pub const LONG: &str = "Long_";
    pub const CONFIRMED: &str = "Confirmed";
    pub const DEATHS: &str = "Deaths";
    pub const RECOVERED: &str = "Recovered";
    pub const ACTIVE: &str = "Active";
    pub const COMBINED_KEY: &str = "Combined_Key";
    pub const INCIDENT_RATE: &str = "Incident_Rate";
    pub const CASE_FATALITY_RATIO: &str = "Case_Fatality_Ratio";

    /// The fixed 14-column layout of a daily report, in file order.
    pub const DAILY_COLUMNS: [&str; 14] = [
        FIPS,
        ADMIN2,
        PROVINCE_STATE,
        COUNTRY_REGION,
        LAST_UPDATE,
        LAT,
        LONG,
        CONFIRMED,
        DEATHS,
        RECOVERED,
        ACTIVE,
        COMBINED_KEY,
        INCIDENT_RATE,
        CASE_FATALITY_RATIO,
    ];
}

// ── Derived time columns ────────────────────────────────────────────────────
pub mod time {
    pub const DATE: &str = "date";
    pub const YEAR_MONTH: &str = "year_month";
    pub const DAY: &str = "day";
}

// ── Column suffixes for derived case statistics ─────────────────────────────
pub mod suffix {
    pub const CUMULATIVE: &str = "_cumulative";
    pub const DAILY_NEW: &str = "_daily_new";
    pub const MONTHLY_NEW: &str = "_monthly_new";
}

// ── Raw flight list columns ─────────────────────────────────────────────────
pub mod flight {
    pub const DAY: &str = "day";
    pub const ORIGIN: &str = "origin";
    pub const DESTINATION: &str = "destination";

    pub const ORIGIN_COUNTRY: &str = "origin_country";
    pub const ORIGIN_COUNTRY_CODE: &str = "origin_country_code";
    pub const ORIGIN_ICAO: &str = "origin_icao";
    pub const DESTINATION_COUNTRY: &str = "destination_country";
    pub const DESTINATION_COUNTRY_CODE: &str = "destination_country_code";
    pub const DESTINATION_ICAO: &str = "destination_icao";

    pub const FLIGHT_COUNT: &str = "flight_count";
}

// ── Reference tables ────────────────────────────────────────────────────────
pub mod reference {
    pub const AIRPORTS_FILE: &str = "airports.csv";
    pub const COUNTRIES_FILE: &str = "countries.csv";
}
