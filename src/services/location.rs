//! Postal code → coordinates, elevation and timezone.
//!
//! Lookups go to the local ZIP reference table first and fall back to the
//! Nominatim geocoder. Elevation comes from the Open-Meteo elevation API and
//! is optional; the timezone is computed offline from boundary polygons.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use reqwest::header::{HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tzf_rs::DefaultFinder;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::helpers::{normalize_postal_code, validate_postal_code};

/// A resolved installation site.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Location {
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level. `None` when the elevation service was unavailable.
    pub elevation_m: Option<f64>,
    /// IANA timezone name (e.g. "America/Boise")
    pub timezone: String,
}

// --- Local reference table ---

#[derive(Debug, Deserialize)]
struct ZipRow {
    zip: String,
    lat: f64,
    lng: f64,
}

/// In-memory ZIP code table, loaded once from a `zip,lat,lng,...` CSV.
#[derive(Debug, Clone, Default)]
pub struct ZipTable {
    entries: HashMap<String, (f64, f64)>,
}

impl ZipTable {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut entries = HashMap::new();
        for row in csv_reader.deserialize::<ZipRow>() {
            let row = row?;
            entries.insert(normalize_postal_code(&row.zip), (row.lat, row.lng));
        }
        Ok(Self { entries })
    }

    /// Exact match on the normalised code.
    pub fn lookup(&self, postal_code: &str) -> Option<(f64, f64)> {
        self.entries.get(&normalize_postal_code(postal_code)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// --- Remote service payloads ---

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    elevation: Vec<f64>,
}

/// Endpoints and identification for the network collaborators.
#[derive(Debug, Clone)]
pub struct ResolverEndpoints {
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    /// Appended to free-text geocoder queries ("83333,USA").
    pub country: String,
    pub elevation_url: String,
}

/// Resolves postal codes to [`Location`]s.
#[derive(Clone)]
pub struct LocationResolver {
    table: Arc<ZipTable>,
    client: reqwest::Client,
    endpoints: ResolverEndpoints,
    tz_finder: Arc<DefaultFinder>,
}

impl LocationResolver {
    pub fn new(table: ZipTable, client: reqwest::Client, endpoints: ResolverEndpoints) -> Self {
        Self {
            table: Arc::new(table),
            client,
            endpoints,
            tz_finder: Arc::new(DefaultFinder::new()),
        }
    }

    /// Resolve a postal code.
    ///
    /// Fails with `InvalidConfiguration` for empty codes or codes with
    /// characters other than letters, digits and `-`, before any lookup.
    /// Fails with `LocationNotFound` when neither the table nor the geocoder
    /// know the code, and `UpstreamServiceError` when the geocoder itself
    /// fails. Elevation failures are tolerated.
    pub async fn resolve(&self, postal_code: &str) -> Result<Location, AppError> {
        let code = validate_postal_code(postal_code)?;

        let (latitude, longitude) = match self.table.lookup(&code) {
            Some(coords) => {
                tracing::debug!("ZIP {} found in reference table", code);
                coords
            }
            None => {
                tracing::info!("ZIP {} not in reference table, querying geocoder", code);
                self.geocode(&code).await?
            }
        };

        let elevation_m = match self.fetch_elevation(latitude, longitude).await {
            Ok(elevation) => Some(elevation),
            Err(e) => {
                tracing::warn!(
                    "Elevation lookup failed for ({:.4}, {:.4}), continuing without it: {}",
                    latitude,
                    longitude,
                    e
                );
                None
            }
        };

        let timezone = self.timezone_at(latitude, longitude);

        Ok(Location {
            postal_code: code,
            latitude,
            longitude,
            elevation_m,
            timezone,
        })
    }

    async fn geocode(&self, code: &str) -> Result<(f64, f64), AppError> {
        let url = format!("{}/search", self.endpoints.geocoder_url.trim_end_matches('/'));
        let query = format!("{},{}", code, self.endpoints.country);
        let user_agent = HeaderValue::from_str(&self.endpoints.geocoder_user_agent)
            .map_err(|e| AppError::InternalError(format!("Invalid User-Agent: {}", e)))?;

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, user_agent)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamServiceError(format!(
                "geocoder returned HTTP {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            AppError::UpstreamServiceError(format!("geocoder JSON parse error: {}", e))
        })?;

        let place = places.into_iter().next().ok_or_else(|| {
            AppError::LocationNotFound(format!("no location data for ZIP {}", code))
        })?;

        let lat = place.lat.parse::<f64>().map_err(|e| {
            AppError::UpstreamServiceError(format!("geocoder returned bad latitude: {}", e))
        })?;
        let lon = place.lon.parse::<f64>().map_err(|e| {
            AppError::UpstreamServiceError(format!("geocoder returned bad longitude: {}", e))
        })?;

        Ok((lat, lon))
    }

    async fn fetch_elevation(&self, lat: f64, lon: f64) -> Result<f64, AppError> {
        let url = format!(
            "{}/v1/elevation",
            self.endpoints.elevation_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .query(&[("latitude", lat), ("longitude", lon)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamServiceError(format!(
                "elevation service returned HTTP {}",
                response.status()
            )));
        }

        let body: ElevationResponse = response.json().await.map_err(|e| {
            AppError::UpstreamServiceError(format!("elevation JSON parse error: {}", e))
        })?;

        body.elevation.first().copied().ok_or_else(|| {
            AppError::UpstreamServiceError("elevation service returned no values".to_string())
        })
    }

    fn timezone_at(&self, lat: f64, lon: f64) -> String {
        let name = self.tz_finder.get_tz_name(lon, lat);
        if name.is_empty() {
            "UTC".to_string()
        } else {
            name.to_string()
        }
    }
}
