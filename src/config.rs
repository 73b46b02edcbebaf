use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_NSRDB_URL: &str =
    "https://developer.nrel.gov/api/nsrdb/v2/solar/nsrdb-GOES-aggregated-v4-0-0-download.csv";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_ELEVATION_URL: &str = "https://api.open-meteo.com";
const DEFAULT_SIMULATION_URL: &str = "http://localhost:8000";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Directory holding the ZIP reference table and synthesized TMY files.
    pub data_dir: PathBuf,
    /// CSV file mapping ZIP codes to coordinates.
    pub zip_table: PathBuf,
    pub nsrdb: NsrdbConfig,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocoder_country: String,
    pub elevation_url: String,
    pub simulation_url: String,
    /// Source years averaged into the typical year.
    pub weather_years: Vec<i32>,
    /// Non-leap calendar year the averaged hours are rebased onto.
    pub representative_year: i32,
    /// Pause between consecutive NSRDB year requests.
    pub request_delay: Duration,
    /// Timeout applied to every outbound HTTP request.
    pub http_timeout: Duration,
    /// Serve an existing TMY artifact for a ZIP code instead of refetching.
    pub reuse_cached_tmy: bool,
}

/// Credentials and identification required by the NSRDB download terms.
#[derive(Debug, Clone)]
pub struct NsrdbConfig {
    pub url: String,
    pub api_key: String,
    pub full_name: String,
    pub email: String,
    pub affiliation: String,
    pub reason: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(env_or("DATA_DIR", "./data"));
        let zip_table = std::env::var("ZIP_TABLE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("uszips.csv"));

        Self {
            port: env_or("PORT", "8080")
                .parse()
                .expect("PORT must be a valid u16"),
            zip_table,
            data_dir,
            nsrdb: NsrdbConfig {
                url: env_or("NSRDB_URL", DEFAULT_NSRDB_URL),
                api_key: std::env::var("NREL_API_KEY").expect("NREL_API_KEY must be set"),
                full_name: env_or("NREL_FULL_NAME", "Solar TMY API"),
                email: env_or("NREL_EMAIL", ""),
                affiliation: env_or("NREL_AFFILIATION", "Portfolio Project"),
                reason: env_or("NREL_REASON", "Educational / portfolio project"),
            },
            geocoder_url: env_or("GEOCODER_URL", DEFAULT_GEOCODER_URL),
            geocoder_user_agent: env_or("GEOCODER_USER_AGENT", "solar_forecaster"),
            geocoder_country: env_or("GEOCODER_COUNTRY", "USA"),
            elevation_url: env_or("ELEVATION_URL", DEFAULT_ELEVATION_URL),
            simulation_url: env_or("SIMULATION_URL", DEFAULT_SIMULATION_URL),
            weather_years: parse_years(&env_or("WEATHER_YEARS", "2023,2024"))
                .expect("WEATHER_YEARS must be a comma-separated list of years"),
            representative_year: env_or("REPRESENTATIVE_YEAR", "2023")
                .parse()
                .expect("REPRESENTATIVE_YEAR must be a valid year"),
            request_delay: Duration::from_millis(
                env_or("REQUEST_DELAY_MS", "1000")
                    .parse()
                    .expect("REQUEST_DELAY_MS must be a valid u64"),
            ),
            http_timeout: Duration::from_secs(
                env_or("HTTP_TIMEOUT_SECS", "30")
                    .parse()
                    .expect("HTTP_TIMEOUT_SECS must be a valid u64"),
            ),
            reuse_cached_tmy: env_or("REUSE_CACHED_TMY", "true")
                .parse()
                .expect("REUSE_CACHED_TMY must be true or false"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse "2023, 2024" into `[2023, 2024]`. An empty list is rejected.
fn parse_years(raw: &str) -> Option<Vec<i32>> {
    let years = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect::<Option<Vec<i32>>>()?;

    if years.is_empty() {
        None
    } else {
        Some(years)
    }
}
