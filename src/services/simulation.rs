//! Bridge to the external photovoltaic simulation engine.
//!
//! The engine owns all PV physics (solar position, transposition, module and
//! inverter models, temperature derating). This module only translates a
//! [`SystemConfig`] and a typical weather year into the engine's model
//! description and reads back the AC power series.

use std::future::Future;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::system::{SystemConfig, TrackingMode};
use crate::services::typical_year::TypicalYearSeries;

/// Power temperature coefficient for the PVWatts DC model, 1/°C.
const GAMMA_PDC: f64 = -0.003;

/// PVsyst cell temperature parameters for freestanding arrays.
const PVSYST_FREESTANDING_U_C: f64 = 29.0;
const PVSYST_FREESTANDING_U_V: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteParameters {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub tz: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mount {
    Fixed {
        surface_tilt: f64,
        surface_azimuth: f64,
    },
    SingleAxis {
        axis_tilt: f64,
        max_angle: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleParameters {
    pub pdc0: f64,
    pub gamma_pdc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InverterParameters {
    pub pdc0: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossesParameters {
    /// Total system losses in percent
    pub losses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureParameters {
    pub u_c: f64,
    pub u_v: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRow {
    /// RFC 3339 timestamp in the site's timezone
    pub time: String,
    pub ghi: f64,
    pub dhi: f64,
    pub dni: f64,
    pub temp_air: f64,
    pub wind_speed: f64,
}

/// Everything the engine needs for one model run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub location: SiteParameters,
    pub mount: Mount,
    pub module_parameters: ModuleParameters,
    pub inverter_parameters: InverterParameters,
    pub losses_parameters: LossesParameters,
    pub temperature_model: String,
    pub temperature_model_parameters: TemperatureParameters,
    pub aoi_model: String,
    pub weather: Vec<WeatherRow>,
}

/// A photovoltaic simulation engine.
///
/// Given a model description, return one AC power value (W) per weather row,
/// in the same order.
pub trait SimulationEngine {
    fn run(
        &self,
        request: &ModelRequest,
    ) -> impl Future<Output = Result<Vec<f64>, AppError>> + Send;
}

/// AC power at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct AcPoint {
    pub timestamp: DateTime<Tz>,
    pub ac_w: f64,
}

/// AC power aligned one-to-one with the typical year index.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub timezone: Tz,
    pub points: Vec<AcPoint>,
}

/// Fail with `UnsupportedConfiguration` for mount types the engine bridge
/// cannot model.
pub fn ensure_supported(mode: TrackingMode) -> Result<(), AppError> {
    match mode {
        TrackingMode::Fixed | TrackingMode::SingleAxis => Ok(()),
        TrackingMode::DualAxis => Err(AppError::UnsupportedConfiguration(
            "dual-axis tracking is not supported".to_string(),
        )),
    }
}

/// Translate `config` and `weather` into a [`ModelRequest`].
///
/// Dual-axis tracking is rejected here, before anything reaches the engine.
pub fn build_request(
    config: &SystemConfig,
    weather: &TypicalYearSeries,
) -> Result<(ModelRequest, Tz), AppError> {
    ensure_supported(config.tracking_mode)?;
    let mount = match config.tracking_mode {
        TrackingMode::SingleAxis => Mount::SingleAxis {
            axis_tilt: config.tilt_deg,
            max_angle: config.max_rotation_angle_deg,
        },
        _ => Mount::Fixed {
            surface_tilt: config.tilt_deg,
            surface_azimuth: config.azimuth_deg,
        },
    };

    let tz: Tz = config.location.timezone.parse().map_err(|e| {
        AppError::InternalError(format!(
            "unknown timezone '{}': {}",
            config.location.timezone, e
        ))
    })?;

    let pdc0 = config.capacity_kw * 1000.0;
    let rows = weather
        .hours()
        .iter()
        .map(|h| WeatherRow {
            time: h.timestamp.with_timezone(&tz).to_rfc3339(),
            ghi: h.ghi,
            dhi: h.dhi,
            dni: h.dni,
            temp_air: h.temp_air,
            wind_speed: h.wind_speed,
        })
        .collect();

    let request = ModelRequest {
        location: SiteParameters {
            latitude: config.location.latitude,
            longitude: config.location.longitude,
            altitude: config.location.elevation_m,
            tz: config.location.timezone.clone(),
        },
        mount,
        module_parameters: ModuleParameters {
            pdc0,
            gamma_pdc: GAMMA_PDC,
        },
        inverter_parameters: InverterParameters { pdc0 },
        losses_parameters: LossesParameters {
            losses: config.system_losses * 100.0,
        },
        temperature_model: "pvsyst".to_string(),
        temperature_model_parameters: TemperatureParameters {
            u_c: PVSYST_FREESTANDING_U_C,
            u_v: PVSYST_FREESTANDING_U_V,
        },
        aoi_model: "no_loss".to_string(),
        weather: rows,
    };

    Ok((request, tz))
}

/// Run `engine` for `config` over `weather`.
pub async fn simulate<E: SimulationEngine>(
    engine: &E,
    config: &SystemConfig,
    weather: &TypicalYearSeries,
) -> Result<SimulationResult, AppError> {
    let (request, tz) = build_request(config, weather)?;

    tracing::info!(
        "Running {} simulation for ZIP {} over {} hours",
        config.tracking_mode,
        config.postal_code,
        request.weather.len()
    );
    let ac = engine.run(&request).await?;

    if ac.len() != weather.len() {
        return Err(AppError::UpstreamServiceError(format!(
            "simulation returned {} values for {} weather rows",
            ac.len(),
            weather.len()
        )));
    }

    let points = weather
        .hours()
        .iter()
        .zip(ac)
        .map(|(h, ac_w)| AcPoint {
            timestamp: h.timestamp.with_timezone(&tz),
            ac_w,
        })
        .collect();

    Ok(SimulationResult {
        timezone: tz,
        points,
    })
}

// --- HTTP engine ---

#[derive(Debug, Deserialize)]
struct SimulationResponse {
    /// Missing values (NaN on the engine side) arrive as null.
    ac: Vec<Option<f64>>,
}

/// Runs models on a remote simulation service (`POST {base}/simulate`).
#[derive(Debug, Clone)]
pub struct PvlibServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl PvlibServiceClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl SimulationEngine for PvlibServiceClient {
    async fn run(&self, request: &ModelRequest) -> Result<Vec<f64>, AppError> {
        let url = format!("{}/simulate", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamServiceError(format!(
                "simulation service returned HTTP {}",
                response.status()
            )));
        }

        let body: SimulationResponse = response.json().await.map_err(|e| {
            AppError::UpstreamServiceError(format!("simulation JSON parse error: {}", e))
        })?;

        Ok(body.ac.into_iter().map(|v| v.unwrap_or(0.0)).collect())
    }
}
