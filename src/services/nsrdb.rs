//! NREL NSRDB GOES aggregated v4 client.
//!
//! Downloads one year of hourly irradiance and weather for a point.
//! See: https://developer.nrel.gov/docs/solar/nsrdb/nsrdb-GOES-aggregated-v4-0-0-download/

use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::config::NsrdbConfig;
use crate::errors::AppError;

/// Attributes requested from the archive.
const NSRDB_ATTRIBUTES: &str = "ghi,dhi,dni,air_temperature,wind_speed";

/// Number of metadata rows preceding the column header in NSRDB CSV downloads.
const NSRDB_METADATA_ROWS: usize = 2;

/// One hour of source weather.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyWeatherRecord {
    pub timestamp: DateTime<Utc>,
    /// Global horizontal irradiance, W/m²
    pub ghi: f64,
    /// Diffuse horizontal irradiance, W/m²
    pub dhi: f64,
    /// Direct normal irradiance, W/m²
    pub dni: f64,
    /// Air temperature, °C
    pub air_temperature: f64,
    /// Wind speed, m/s
    pub wind_speed: f64,
}

#[derive(Debug, Deserialize)]
struct NsrdbRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: u32,
    #[serde(rename = "Day")]
    day: u32,
    #[serde(rename = "Hour")]
    hour: u32,
    #[serde(rename = "Minute")]
    minute: u32,
    #[serde(rename = "GHI")]
    ghi: f64,
    #[serde(rename = "DHI")]
    dhi: f64,
    #[serde(rename = "DNI")]
    dni: f64,
    #[serde(rename = "Temperature")]
    temperature: f64,
    #[serde(rename = "Wind Speed")]
    wind_speed: f64,
}

/// Client for the NSRDB download API.
#[derive(Debug, Clone)]
pub struct NsrdbClient {
    client: reqwest::Client,
    config: NsrdbConfig,
}

impl NsrdbClient {
    pub fn new(client: reqwest::Client, config: NsrdbConfig) -> Self {
        Self { client, config }
    }

    /// Fetch hourly records for one calendar year at a point.
    ///
    /// Leap-day rows are excluded upstream (`leap_day=false`). Any non-2xx
    /// status or unparseable body is an `UpstreamServiceError`.
    pub async fn fetch_year(
        &self,
        lat: f64,
        lon: f64,
        year: i32,
    ) -> Result<Vec<HourlyWeatherRecord>, AppError> {
        let wkt = format!("POINT({:.4} {:.4})", lon, lat);
        let year_str = year.to_string();

        let response = self
            .client
            .get(&self.config.url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("wkt", wkt.as_str()),
                ("names", year_str.as_str()),
                ("leap_day", "false"),
                ("interval", "60"),
                ("utc", "true"),
                ("full_name", self.config.full_name.as_str()),
                ("email", self.config.email.as_str()),
                ("affiliation", self.config.affiliation.as_str()),
                ("reason", self.config.reason.as_str()),
                ("attributes", NSRDB_ATTRIBUTES),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamServiceError(format!(
                "NSRDB returned HTTP {} for {}: {}",
                status,
                year,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response.text().await?;
        let records = parse_download(&body)?;
        tracing::info!(
            "NSRDB: {} hourly records for ({:.4}, {:.4}) in {}",
            records.len(),
            lat,
            lon,
            year
        );

        Ok(records)
    }
}

/// Parse an NSRDB CSV download.
///
/// The body is spooled through a temporary file that is removed when this
/// function returns, on success or failure.
pub fn parse_download(body: &str) -> Result<Vec<HourlyWeatherRecord>, AppError> {
    let mut spool = tempfile::Builder::new()
        .prefix("nsrdb-")
        .suffix(".csv")
        .tempfile()?;
    spool.write_all(body.as_bytes())?;
    spool.as_file_mut().seek(SeekFrom::Start(0))?;

    let mut reader = BufReader::new(spool.as_file());
    let mut skipped = String::new();
    for _ in 0..NSRDB_METADATA_ROWS {
        skipped.clear();
        if reader.read_line(&mut skipped)? == 0 {
            return Err(malformed("missing metadata header rows"));
        }
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in csv_reader.deserialize::<NsrdbRow>() {
        let row = row.map_err(|e| malformed(&e.to_string()))?;
        let timestamp = Utc
            .with_ymd_and_hms(row.year, row.month, row.day, row.hour, row.minute, 0)
            .single()
            .ok_or_else(|| {
                malformed(&format!(
                    "invalid timestamp {}-{}-{} {}:{}",
                    row.year, row.month, row.day, row.hour, row.minute
                ))
            })?;

        records.push(HourlyWeatherRecord {
            timestamp,
            ghi: row.ghi,
            dhi: row.dhi,
            dni: row.dni,
            air_temperature: row.temperature,
            wind_speed: row.wind_speed,
        });
    }

    if records.is_empty() {
        return Err(malformed("no data rows"));
    }

    Ok(records)
}

fn malformed(detail: &str) -> AppError {
    AppError::UpstreamServiceError(format!("NSRDB CSV parse error: {}", detail))
}
