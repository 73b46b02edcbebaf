//! Typical meteorological year synthesis.
//!
//! Fetches several real years of NSRDB hourly data for a location, averages
//! every (month, day, hour) bucket across years and rebases the result onto a
//! single non-leap representative year. The result is persisted as a CSV
//! artifact keyed by postal code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::helpers::{is_leap_year, HOURS_PER_YEAR};
use crate::services::location::Location;
use crate::services::nsrdb::{HourlyWeatherRecord, NsrdbClient};

/// One averaged hour of the representative year.
#[derive(Debug, Clone, PartialEq)]
pub struct TypicalHour {
    pub timestamp: DateTime<Utc>,
    pub ghi: f64,
    pub dhi: f64,
    pub dni: f64,
    pub temp_air: f64,
    pub wind_speed: f64,
    /// Number of source years that contributed to this hour.
    /// `None` when loaded from an artifact that predates the `samples` column.
    pub samples: Option<usize>,
}

/// Averaged weather year, sorted chronologically, one entry per hour present.
#[derive(Debug, Clone, PartialEq)]
pub struct TypicalYearSeries {
    hours: Vec<TypicalHour>,
}

impl TypicalYearSeries {
    pub fn hours(&self) -> &[TypicalHour] {
        &self.hours
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    /// Hours that had fewer contributing years than `expected`.
    pub fn degraded_hours(&self, expected: usize) -> usize {
        self.hours
            .iter()
            .filter(|h| h.samples.is_some_and(|s| s < expected))
            .count()
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    ghi: f64,
    dhi: f64,
    dni: f64,
    temp_air: f64,
    wind_speed: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, record: &HourlyWeatherRecord) {
        self.ghi += record.ghi;
        self.dhi += record.dhi;
        self.dni += record.dni;
        self.temp_air += record.air_temperature;
        self.wind_speed += record.wind_speed;
        self.count += 1;
    }
}

/// Average records by (month, day, hour) and rebase onto `representative_year`.
///
/// Source year and minute are ignored when grouping. A February 29 bucket
/// cannot exist in a non-leap year and is dropped. Fails with `NoData` when
/// nothing is left.
pub fn average_years<'a, I>(records: I, representative_year: i32) -> Result<TypicalYearSeries, AppError>
where
    I: IntoIterator<Item = &'a HourlyWeatherRecord>,
{
    let mut buckets: BTreeMap<(u32, u32, u32), Accumulator> = BTreeMap::new();
    for record in records {
        let ts = record.timestamp;
        buckets
            .entry((ts.month(), ts.day(), ts.hour()))
            .or_default()
            .add(record);
    }

    let mut hours = Vec::with_capacity(buckets.len().min(HOURS_PER_YEAR));
    for ((month, day, hour), acc) in buckets {
        let Some(timestamp) = Utc
            .with_ymd_and_hms(representative_year, month, day, hour, 0, 0)
            .single()
        else {
            tracing::warn!(
                "Dropping {} source rows at {:02}-{:02} {:02}:00, not a date in {}",
                acc.count,
                month,
                day,
                hour,
                representative_year
            );
            continue;
        };

        let n = acc.count as f64;
        hours.push(TypicalHour {
            timestamp,
            ghi: acc.ghi / n,
            dhi: acc.dhi / n,
            dni: acc.dni / n,
            temp_air: acc.temp_air / n,
            wind_speed: acc.wind_speed / n,
            samples: Some(acc.count),
        });
    }

    if hours.is_empty() {
        return Err(AppError::NoData("no hourly records to average".to_string()));
    }

    Ok(TypicalYearSeries { hours })
}

// --- Artifact I/O ---

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactRow {
    timestamp: String,
    ghi: f64,
    dhi: f64,
    dni: f64,
    temp_air: f64,
    wind_speed: f64,
    /// Empty in artifacts written before the column existed.
    #[serde(default)]
    samples: Option<usize>,
}

/// Write the series as CSV, atomically replacing any previous file at `path`.
pub fn write_typical_year(path: &Path, series: &TypicalYearSeries) -> Result<(), AppError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let staging = tempfile::Builder::new()
        .prefix(".tmy-")
        .suffix(".csv.part")
        .tempfile_in(dir)?;

    {
        let mut writer = csv::Writer::from_writer(staging.as_file());
        for hour in &series.hours {
            writer.serialize(ArtifactRow {
                timestamp: hour.timestamp.to_rfc3339(),
                ghi: hour.ghi,
                dhi: hour.dhi,
                dni: hour.dni,
                temp_air: hour.temp_air,
                wind_speed: hour.wind_speed,
                samples: hour.samples,
            })?;
        }
        writer.flush()?;
    }

    staging.persist(path).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

/// Read a series previously written by [`write_typical_year`].
pub fn read_typical_year(path: &Path) -> Result<TypicalYearSeries, AppError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut hours = Vec::with_capacity(HOURS_PER_YEAR);

    for row in reader.deserialize::<ArtifactRow>() {
        let row = row?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| {
                AppError::InternalError(format!(
                    "bad timestamp '{}' in {}: {}",
                    row.timestamp,
                    path.display(),
                    e
                ))
            })?
            .with_timezone(&Utc);

        hours.push(TypicalHour {
            timestamp,
            ghi: row.ghi,
            dhi: row.dhi,
            dni: row.dni,
            temp_air: row.temp_air,
            wind_speed: row.wind_speed,
            samples: row.samples,
        });
    }

    if hours.is_empty() {
        return Err(AppError::NoData(format!("{} has no rows", path.display())));
    }

    Ok(TypicalYearSeries { hours })
}

// --- Synthesizer ---

/// Builds and caches typical years per postal code.
#[derive(Debug, Clone)]
pub struct TypicalYearSynthesizer {
    fetcher: NsrdbClient,
    years: Vec<i32>,
    representative_year: i32,
    request_delay: Duration,
    data_dir: PathBuf,
    reuse_cached: bool,
}

impl TypicalYearSynthesizer {
    pub fn new(
        fetcher: NsrdbClient,
        years: Vec<i32>,
        representative_year: i32,
        request_delay: Duration,
        data_dir: PathBuf,
        reuse_cached: bool,
    ) -> Result<Self, AppError> {
        if is_leap_year(representative_year) {
            return Err(AppError::InvalidConfiguration(format!(
                "representative year {} is a leap year",
                representative_year
            )));
        }
        if years.is_empty() {
            return Err(AppError::InvalidConfiguration(
                "at least one source year is required".to_string(),
            ));
        }

        Ok(Self {
            fetcher,
            years,
            representative_year,
            request_delay,
            data_dir,
            reuse_cached,
        })
    }

    /// Number of source years averaged into each hour.
    pub fn source_years(&self) -> usize {
        self.years.len()
    }

    /// A cached series is only served when it is a complete year on the
    /// configured representative year, with every hour averaged over all
    /// configured source years.
    fn is_reusable(&self, series: &TypicalYearSeries) -> bool {
        let years = Some(self.years.len());
        series.len() == HOURS_PER_YEAR
            && series.hours().iter().all(|h| {
                h.timestamp.year() == self.representative_year && h.samples == years
            })
    }

    /// Artifact location for a postal code.
    pub fn artifact_path(&self, postal_code: &str) -> PathBuf {
        self.data_dir.join(format!("nrel_tmy_{}.csv", postal_code))
    }

    /// Fetch all configured years, average them and persist the artifact.
    /// Returns the artifact path.
    pub async fn synthesize(&self, location: &Location) -> Result<PathBuf, AppError> {
        let (path, _) = self.build(location).await?;
        Ok(path)
    }

    /// Return the cached artifact for the location if reuse is enabled and it
    /// holds a complete year for the current configuration, otherwise
    /// synthesize a fresh one.
    pub async fn load_or_synthesize(
        &self,
        location: &Location,
    ) -> Result<TypicalYearSeries, AppError> {
        let path = self.artifact_path(&location.postal_code);
        if self.reuse_cached && path.exists() {
            match read_typical_year(&path) {
                Ok(series) if self.is_reusable(&series) => {
                    tracing::info!("Using cached typical year {}", path.display());
                    return Ok(series);
                }
                Ok(series) => {
                    tracing::warn!(
                        "Cached typical year {} is incomplete or stale ({} hours, {} degraded), rebuilding",
                        path.display(),
                        series.len(),
                        series.degraded_hours(self.years.len())
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Cached typical year {} unreadable, rebuilding: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        let (_, series) = self.build(location).await?;
        Ok(series)
    }

    async fn build(&self, location: &Location) -> Result<(PathBuf, TypicalYearSeries), AppError> {
        let mut combined: Vec<HourlyWeatherRecord> =
            Vec::with_capacity(self.years.len() * HOURS_PER_YEAR);

        for (i, &year) in self.years.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            tracing::info!(
                "Requesting NSRDB data for ZIP {} (year {})",
                location.postal_code,
                year
            );
            let records = self
                .fetcher
                .fetch_year(location.latitude, location.longitude, year)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Typical year for ZIP {} aborted at {}: {}",
                        location.postal_code,
                        year,
                        e
                    );
                    AppError::NoData(format!(
                        "weather for ZIP {} in {} unavailable: {}",
                        location.postal_code, year, e
                    ))
                })?;
            combined.extend(records);
        }

        let series = average_years(&combined, self.representative_year)?;

        let degraded = series.degraded_hours(self.years.len());
        if degraded > 0 {
            tracing::warn!(
                "{} of {} hours averaged over fewer than {} years",
                degraded,
                series.len(),
                self.years.len()
            );
        }

        let path = self.artifact_path(&location.postal_code);
        write_typical_year(&path, &series)?;
        tracing::info!(
            "Typical year with {} hourly records written to {}",
            series.len(),
            path.display()
        );

        Ok((path, series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NsrdbConfig;
    use chrono::NaiveDate;
    use std::collections::HashSet;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(y: i32, m: u32, d: u32, h: u32, value: f64) -> HourlyWeatherRecord {
        HourlyWeatherRecord {
            timestamp: Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap(),
            ghi: value,
            dhi: value / 2.0,
            dni: value * 2.0,
            air_temperature: value / 10.0,
            wind_speed: 1.0,
        }
    }

    /// Every hour of `year` except February 29.
    fn full_year(year: i32, value: impl Fn(u32, u32, u32) -> f64) -> Vec<HourlyWeatherRecord> {
        let mut date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
        let mut out = Vec::new();
        while date.year() == year {
            if !(date.month() == 2 && date.day() == 29) {
                for h in 0..24 {
                    out.push(record(year, date.month(), date.day(), h, value(date.month(), date.day(), h)));
                }
            }
            date = date.succ_opt().unwrap();
        }
        out
    }

    fn to_nsrdb_csv(records: &[HourlyWeatherRecord]) -> String {
        let mut body = String::from(
            "Source,Location ID,Latitude,Longitude\nNSRDB,1,43.52,-114.32\n\
             Year,Month,Day,Hour,Minute,GHI,DHI,DNI,Temperature,Wind Speed\n",
        );
        for r in records {
            let ts = r.timestamp;
            body.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                ts.year(),
                ts.month(),
                ts.day(),
                ts.hour(),
                ts.minute(),
                r.ghi,
                r.dhi,
                r.dni,
                r.air_temperature,
                r.wind_speed
            ));
        }
        body
    }

    fn hailey() -> Location {
        Location {
            postal_code: "83333".to_string(),
            latitude: 43.5196,
            longitude: -114.3153,
            elevation_m: Some(1624.0),
            timezone: "America/Boise".to_string(),
        }
    }

    fn synthesizer(server: &MockServer, dir: &Path, reuse: bool) -> TypicalYearSynthesizer {
        let fetcher = NsrdbClient::new(
            reqwest::Client::new(),
            NsrdbConfig {
                url: server.uri(),
                api_key: "k".to_string(),
                full_name: "t".to_string(),
                email: "t@example.com".to_string(),
                affiliation: "t".to_string(),
                reason: "t".to_string(),
            },
        );
        TypicalYearSynthesizer::new(
            fetcher,
            vec![2023, 2024],
            2023,
            Duration::ZERO,
            dir.to_path_buf(),
            reuse,
        )
        .unwrap()
    }

    async fn mount_year(server: &MockServer, year: i32, records: &[HourlyWeatherRecord]) {
        Mock::given(method("GET"))
            .and(query_param("names", year.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(to_nsrdb_csv(records)))
            .mount(server)
            .await;
    }

    #[test]
    fn test_average_two_values() {
        let records = vec![record(2023, 6, 21, 12, 100.0), record(2024, 6, 21, 12, 200.0)];
        let series = average_years(&records, 2023).unwrap();

        assert_eq!(series.len(), 1);
        let hour = &series.hours()[0];
        assert_eq!(hour.timestamp, Utc.with_ymd_and_hms(2023, 6, 21, 12, 0, 0).unwrap());
        assert_eq!(hour.ghi, 150.0);
        assert_eq!(hour.dhi, 75.0);
        assert_eq!(hour.dni, 300.0);
        assert_eq!(hour.temp_air, 15.0);
        assert_eq!(hour.samples, Some(2));
    }

    #[test]
    fn test_average_is_mean_of_n_years() {
        let records = vec![
            record(2021, 3, 1, 9, 10.0),
            record(2022, 3, 1, 9, 20.0),
            record(2023, 3, 1, 9, 33.0),
        ];
        let series = average_years(&records, 2023).unwrap();
        assert!((series.hours()[0].ghi - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_coverage_degrades_to_single_value() {
        let records = vec![
            record(2023, 1, 1, 0, 10.0),
            record(2024, 1, 1, 0, 30.0),
            record(2023, 1, 1, 1, 50.0),
        ];
        let series = average_years(&records, 2023).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.hours()[1].ghi, 50.0);
        assert_eq!(series.hours()[1].samples, Some(1));
        assert_eq!(series.degraded_hours(2), 1);
    }

    #[test]
    fn test_leap_day_is_dropped() {
        let records = vec![record(2024, 2, 29, 12, 10.0), record(2024, 3, 1, 12, 20.0)];
        let series = average_years(&records, 2023).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.hours()[0].timestamp.month(), 3);
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let err = average_years(&Vec::<HourlyWeatherRecord>::new(), 2023).unwrap_err();
        assert!(matches!(err, AppError::NoData(_)));
    }

    #[test]
    fn test_full_years_yield_8760_unique_hours() {
        let mut records = full_year(2023, |m, _, _| m as f64);
        records.extend(full_year(2024, |m, _, _| m as f64 + 2.0));

        let series = average_years(&records, 2023).unwrap();

        assert_eq!(series.len(), HOURS_PER_YEAR);
        let keys: HashSet<_> = series
            .hours()
            .iter()
            .map(|h| (h.timestamp.month(), h.timestamp.day(), h.timestamp.hour()))
            .collect();
        assert_eq!(keys.len(), HOURS_PER_YEAR);
        assert!(series.hours().windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(series.hours().iter().all(|h| h.samples == Some(2)));
        assert_eq!(series.hours()[0].ghi, 2.0);
        assert_eq!(series.degraded_hours(2), 0);
    }

    #[test]
    fn test_leap_representative_year_rejected() {
        let fetcher = NsrdbClient::new(
            reqwest::Client::new(),
            NsrdbConfig {
                url: "http://unused".to_string(),
                api_key: String::new(),
                full_name: String::new(),
                email: String::new(),
                affiliation: String::new(),
                reason: String::new(),
            },
        );
        let err = TypicalYearSynthesizer::new(
            fetcher,
            vec![2023],
            2024,
            Duration::ZERO,
            PathBuf::from("."),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_artifact_roundtrip_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nrel_tmy_83333.csv");
        let series = average_years(&[record(2023, 6, 21, 12, 100.0)], 2023).unwrap();

        write_typical_year(&path, &series).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,ghi,dhi,dni,temp_air,wind_speed,samples")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("2023-06-21T12:00:00+00:00,100"));
        assert!(row.ends_with(",1"));

        let back = read_typical_year(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.hours()[0].ghi, 100.0);
        assert_eq!(back.hours()[0].samples, Some(1));
    }

    #[test]
    fn test_artifact_without_samples_column_still_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nrel_tmy_83333.csv");
        std::fs::write(
            &path,
            "timestamp,ghi,dhi,dni,temp_air,wind_speed\n2023-06-21T12:00:00+00:00,100,50,200,10,1\n",
        )
        .unwrap();

        let series = read_typical_year(&path).unwrap();
        assert_eq!(series.hours()[0].ghi, 100.0);
        assert_eq!(series.hours()[0].samples, None);
    }

    #[tokio::test]
    async fn test_synthesize_june_21_noon_is_mean() {
        let server = MockServer::start().await;
        mount_year(&server, 2023, &[record(2023, 6, 21, 12, 100.0)]).await;
        mount_year(&server, 2024, &[record(2024, 6, 21, 12, 200.0)]).await;
        let dir = tempfile::tempdir().unwrap();

        let path = synthesizer(&server, dir.path(), false)
            .synthesize(&hailey())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("nrel_tmy_83333.csv"));
        let series = read_typical_year(&path).unwrap();
        let noon = series
            .hours()
            .iter()
            .find(|h| h.timestamp == Utc.with_ymd_and_hms(2023, 6, 21, 12, 0, 0).unwrap())
            .unwrap();
        assert_eq!(noon.ghi, 150.0);
    }

    #[tokio::test]
    async fn test_synthesize_full_years() {
        let server = MockServer::start().await;
        mount_year(&server, 2023, &full_year(2023, |_, d, h| (d * h) as f64)).await;
        mount_year(&server, 2024, &full_year(2024, |_, d, h| (d + h) as f64)).await;
        let dir = tempfile::tempdir().unwrap();

        let path = synthesizer(&server, dir.path(), false)
            .synthesize(&hailey())
            .await
            .unwrap();

        assert_eq!(read_typical_year(&path).unwrap().len(), HOURS_PER_YEAR);
    }

    #[tokio::test]
    async fn test_synthesize_is_byte_identical() {
        let server = MockServer::start().await;
        mount_year(&server, 2023, &full_year(2023, |m, d, h| (m + d) as f64 * 1.1 + h as f64)).await;
        mount_year(&server, 2024, &full_year(2024, |m, d, h| (m * d) as f64 / 3.0 + h as f64)).await;
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, dir.path(), false);

        let path = synth.synthesize(&hailey()).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        let path = synth.synthesize(&hailey()).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_one_failed_year_aborts_without_output() {
        let server = MockServer::start().await;
        mount_year(&server, 2023, &[record(2023, 6, 21, 12, 100.0)]).await;
        Mock::given(method("GET"))
            .and(query_param("names", "2024"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, dir.path(), false);

        let err = synth.synthesize(&hailey()).await.unwrap_err();

        assert!(matches!(err, AppError::NoData(_)), "got {:?}", err);
        assert!(!synth.artifact_path("83333").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cached_artifact_skips_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, dir.path(), true);
        let mut records = full_year(2023, |_, _, _| 40.0);
        records.extend(full_year(2024, |_, _, _| 44.0));
        let cached = average_years(&records, 2023).unwrap();
        write_typical_year(&synth.artifact_path("83333"), &cached).unwrap();

        let series = synth.load_or_synthesize(&hailey()).await.unwrap();

        assert_eq!(series.len(), HOURS_PER_YEAR);
        assert_eq!(series.hours()[0].ghi, 42.0);
        assert_eq!(series.degraded_hours(synth.source_years()), 0);
    }

    #[tokio::test]
    async fn test_incomplete_cached_artifact_is_rebuilt() {
        let server = MockServer::start().await;
        mount_year(&server, 2023, &[record(2023, 6, 21, 12, 100.0)]).await;
        mount_year(&server, 2024, &[record(2024, 6, 21, 12, 200.0)]).await;
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, dir.path(), true);
        let partial = average_years(&[record(2023, 6, 21, 12, 42.0)], 2023).unwrap();
        write_typical_year(&synth.artifact_path("83333"), &partial).unwrap();

        let series = synth.load_or_synthesize(&hailey()).await.unwrap();

        assert_eq!(series.hours()[0].ghi, 150.0);
        assert_eq!(series.hours()[0].samples, Some(2));
    }

    #[tokio::test]
    async fn test_cached_artifact_for_other_year_is_rebuilt() {
        let server = MockServer::start().await;
        mount_year(&server, 2023, &[record(2023, 6, 21, 12, 100.0)]).await;
        mount_year(&server, 2024, &[record(2024, 6, 21, 12, 200.0)]).await;
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, dir.path(), true);
        let mut records = full_year(2021, |_, _, _| 7.0);
        records.extend(full_year(2022, |_, _, _| 7.0));
        let stale = average_years(&records, 2021).unwrap();
        assert_eq!(stale.len(), HOURS_PER_YEAR);
        write_typical_year(&synth.artifact_path("83333"), &stale).unwrap();

        let series = synth.load_or_synthesize(&hailey()).await.unwrap();

        assert_eq!(series.hours()[0].timestamp.year(), 2023);
        assert_eq!(series.hours()[0].ghi, 150.0);
    }

    #[tokio::test]
    async fn test_cache_disabled_refetches() {
        let server = MockServer::start().await;
        mount_year(&server, 2023, &[record(2023, 6, 21, 12, 100.0)]).await;
        mount_year(&server, 2024, &[record(2024, 6, 21, 12, 200.0)]).await;
        let dir = tempfile::tempdir().unwrap();
        let synth = synthesizer(&server, dir.path(), false);
        let stale = average_years(&[record(2023, 6, 21, 12, 42.0)], 2023).unwrap();
        write_typical_year(&synth.artifact_path("83333"), &stale).unwrap();

        let series = synth.load_or_synthesize(&hailey()).await.unwrap();

        assert_eq!(series.hours()[0].ghi, 150.0);
    }
}
