//! PV installation configuration.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::location::{Location, LocationResolver};

/// Mechanical orientation strategy of the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TrackingMode {
    Fixed,
    SingleAxis,
    DualAxis,
}

impl TrackingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingMode::Fixed => "fixed",
            TrackingMode::SingleAxis => "single-axis",
            TrackingMode::DualAxis => "dual-axis",
        }
    }
}

impl FromStr for TrackingMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(TrackingMode::Fixed),
            "single-axis" => Ok(TrackingMode::SingleAxis),
            "dual-axis" => Ok(TrackingMode::DualAxis),
            other => Err(AppError::InvalidConfiguration(format!(
                "tracking mode must be one of fixed, single-axis, dual-axis (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated installation parameters as supplied by a caller.
#[derive(Debug, Clone)]
pub struct SystemParams {
    pub postal_code: String,
    pub capacity_kw: f64,
    /// Fraction, 0–1
    pub module_efficiency: f64,
    /// Fraction, 0–1
    pub system_losses: f64,
    /// Surface tilt for fixed mounts, axis tilt for single-axis trackers.
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub max_rotation_angle_deg: f64,
    pub tracking_mode: String,
}

/// A validated installation with its resolved location.
///
/// Numeric fields are passed through unchecked.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SystemConfig {
    pub postal_code: String,
    pub capacity_kw: f64,
    pub module_efficiency: f64,
    pub system_losses: f64,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub max_rotation_angle_deg: f64,
    pub tracking_mode: TrackingMode,
    pub location: Location,
}

impl SystemConfig {
    /// Validate `params` and resolve its location.
    ///
    /// The tracking mode is checked before any network call is made.
    pub async fn build(params: SystemParams, resolver: &LocationResolver) -> Result<Self, AppError> {
        let tracking_mode: TrackingMode = params.tracking_mode.parse()?;
        let location = resolver.resolve(&params.postal_code).await?;
        Ok(Self::with_location(params, tracking_mode, location))
    }

    fn with_location(params: SystemParams, tracking_mode: TrackingMode, location: Location) -> Self {
        Self {
            postal_code: location.postal_code.clone(),
            capacity_kw: params.capacity_kw,
            module_efficiency: params.module_efficiency,
            system_losses: params.system_losses,
            tilt_deg: params.tilt_deg,
            azimuth_deg: params.azimuth_deg,
            max_rotation_angle_deg: params.max_rotation_angle_deg,
            tracking_mode,
            location,
        }
    }
}

impl fmt::Display for SystemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System Configuration:")?;
        writeln!(f, "  ZIP Code: {}", self.postal_code)?;
        writeln!(
            f,
            "  Latitude/Longitude: ({:.4}, {:.4})",
            self.location.latitude, self.location.longitude
        )?;
        match self.location.elevation_m {
            Some(elevation) => writeln!(f, "  Elevation: {:.0} m", elevation)?,
            None => writeln!(f, "  Elevation: unavailable")?,
        }
        writeln!(f, "  Timezone: {}", self.location.timezone)?;
        writeln!(f, "  Capacity: {} kW", self.capacity_kw)?;
        writeln!(f, "  Efficiency: {:.1}%", self.module_efficiency * 100.0)?;
        writeln!(f, "  Losses: {:.1}%", self.system_losses * 100.0)?;
        writeln!(f, "  Tilt: {}°", self.tilt_deg)?;
        writeln!(f, "  Azimuth: {}°", self.azimuth_deg)?;
        if self.tracking_mode == TrackingMode::SingleAxis {
            writeln!(f, "  Max Rotation: {}°", self.max_rotation_angle_deg)?;
        }
        write!(f, "  Tracking: {}", self.tracking_mode)
    }
}
