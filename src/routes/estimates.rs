//! Production estimate endpoint.
//!
//! GET /api/v1/estimate?postal_code=83333&capacity_kw=7.5&tracking_mode=fixed&...

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::{AppError, ErrorResponse};
use crate::services::location::LocationResolver;
use crate::services::report::{production_report, ProductionReport};
use crate::services::simulation::{ensure_supported, simulate, PvlibServiceClient};
use crate::services::system::{SystemConfig, SystemParams};
use crate::services::typical_year::TypicalYearSynthesizer;

/// Module efficiency assumed for all estimates.
const MODULE_EFFICIENCY: f64 = 0.20;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub resolver: LocationResolver,
    pub synthesizer: TypicalYearSynthesizer,
    pub engine: PvlibServiceClient,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EstimateQuery {
    /// US ZIP code of the installation
    pub postal_code: String,
    /// DC nameplate capacity in kW (default 7.5)
    #[serde(default = "default_capacity_kw")]
    pub capacity_kw: f64,
    /// "fixed", "single-axis" or "dual-axis" (default "fixed")
    #[serde(default = "default_tracking_mode")]
    pub tracking_mode: String,
    /// Surface tilt (fixed) or tracker axis tilt (single-axis), degrees (default 20)
    #[serde(default = "default_tilt_deg")]
    pub tilt_deg: f64,
    /// Surface azimuth in degrees, 180 = south (default 180)
    #[serde(default = "default_azimuth_deg")]
    pub azimuth_deg: f64,
    /// Maximum tracker rotation angle in degrees (default 60)
    #[serde(default = "default_max_angle_deg")]
    pub max_angle_deg: f64,
    /// Total system losses in percent (default 14)
    #[serde(default = "default_losses_pct")]
    pub losses_pct: f64,
    /// Day for the hourly profile, YYYY-MM-DD (default 2023-06-21)
    pub day: Option<NaiveDate>,
}

fn default_capacity_kw() -> f64 {
    7.5
}

fn default_tracking_mode() -> String {
    "fixed".to_string()
}

fn default_tilt_deg() -> f64 {
    20.0
}

fn default_azimuth_deg() -> f64 {
    180.0
}

fn default_max_angle_deg() -> f64 {
    60.0
}

fn default_losses_pct() -> f64 {
    14.0
}

fn default_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 21).unwrap_or_default()
}

impl EstimateQuery {
    fn into_system_params(self) -> SystemParams {
        SystemParams {
            postal_code: self.postal_code,
            capacity_kw: self.capacity_kw,
            module_efficiency: MODULE_EFFICIENCY,
            system_losses: self.losses_pct / 100.0,
            tilt_deg: self.tilt_deg,
            azimuth_deg: self.azimuth_deg,
            max_rotation_angle_deg: self.max_angle_deg,
            tracking_mode: self.tracking_mode,
        }
    }
}

/// How well the typical year behind an estimate is covered by source data.
#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherCoverage {
    /// Number of source years requested per hour
    pub source_years: usize,
    /// Hours in the typical year
    pub hours: usize,
    /// Hours averaged over fewer than `source_years` years
    pub degraded_hours: usize,
}

/// Production estimate response.
#[derive(Debug, Serialize, ToSchema)]
pub struct EstimateResponse {
    /// Validated system configuration with resolved location
    pub system: SystemConfig,
    /// Human-readable configuration summary
    pub summary: String,
    /// Annual, monthly and selected-day production
    pub report: ProductionReport,
    pub coverage: WeatherCoverage,
}

/// Estimate annual production for a PV system.
///
/// Resolves the ZIP code, builds (or reuses) the averaged weather year for
/// the location, runs the simulation engine and aggregates the AC output.
#[utoipa::path(
    get,
    path = "/api/v1/estimate",
    tag = "Estimates",
    params(EstimateQuery),
    responses(
        (status = 200, description = "Production estimate", body = EstimateResponse),
        (status = 400, description = "Invalid tracking mode or postal code", body = ErrorResponse),
        (status = 404, description = "ZIP code not found", body = ErrorResponse),
        (status = 422, description = "Dual-axis tracking requested", body = ErrorResponse),
        (status = 502, description = "Weather, geocoding or simulation service failed", body = ErrorResponse),
    )
)]
pub async fn get_estimate(
    State(state): State<AppState>,
    Query(query): Query<EstimateQuery>,
) -> Result<Json<EstimateResponse>, AppError> {
    let day = query.day.unwrap_or_else(default_day);

    let system = SystemConfig::build(query.into_system_params(), &state.resolver).await?;
    // Reject before spending weather API quota on it.
    ensure_supported(system.tracking_mode)?;

    let weather = state.synthesizer.load_or_synthesize(&system.location).await?;
    let source_years = state.synthesizer.source_years();
    let coverage = WeatherCoverage {
        source_years,
        hours: weather.len(),
        degraded_hours: weather.degraded_hours(source_years),
    };
    let result = simulate(&state.engine, &system, &weather).await?;
    let report = production_report(&result, day);

    tracing::info!(
        "Estimate for ZIP {}: {:.0} kWh/year",
        system.postal_code,
        report.annual_kwh
    );

    Ok(Json(EstimateResponse {
        summary: system.to_string(),
        system,
        report,
        coverage,
    }))
}
