//! Energy totals derived from a simulated AC series.

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::simulation::SimulationResult;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Energy produced in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyEnergy {
    /// Three-letter month label ("Jan".."Dec")
    pub month: String,
    pub kwh: f64,
}

/// Power at one hour of the selected day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HourlyPower {
    /// Local hour of day, 0–23
    pub hour: u32,
    pub ac_w: f64,
}

/// Aggregated production figures.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductionReport {
    /// IANA timezone the months and hours are expressed in
    pub timezone: String,
    pub annual_kwh: f64,
    pub monthly_kwh: Vec<MonthlyEnergy>,
    /// Selected day (local calendar date)
    pub day: NaiveDate,
    /// Hourly AC power on `day`; empty when the series has no rows on it.
    pub daily_profile: Vec<HourlyPower>,
}

/// Sum hourly AC power into annual and monthly kWh and pick out one day.
///
/// Every point is taken to cover one hour. Months and the selected day are
/// evaluated in the series' local timezone.
pub fn production_report(result: &SimulationResult, day: NaiveDate) -> ProductionReport {
    let mut monthly_wh = [0.0f64; 12];
    let mut daily_profile = Vec::new();

    for point in &result.points {
        let local = point.timestamp;
        monthly_wh[local.month0() as usize] += point.ac_w;

        if local.month() == day.month() && local.day() == day.day() {
            daily_profile.push(HourlyPower {
                hour: local.hour(),
                ac_w: point.ac_w,
            });
        }
    }

    let annual_kwh = monthly_wh.iter().sum::<f64>() / 1000.0;
    let monthly_kwh = MONTH_LABELS
        .iter()
        .zip(monthly_wh)
        .map(|(label, wh)| MonthlyEnergy {
            month: label.to_string(),
            kwh: wh / 1000.0,
        })
        .collect();

    ProductionReport {
        timezone: result.timezone.name().to_string(),
        annual_kwh,
        monthly_kwh,
        day,
        daily_profile,
    }
}
