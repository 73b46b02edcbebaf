//! Shared helpers for postal codes and calendar math.

use chrono::NaiveDate;

use crate::errors::AppError;

/// Normalise a postal code for table lookups.
///
/// Trims surrounding whitespace. Purely numeric codes shorter than five digits
/// are zero-padded, since spreadsheet exports of US ZIP tables routinely drop
/// the leading zero (`2134` → `02134`).
pub(crate) fn normalize_postal_code(code: &str) -> String {
    let trimmed = code.trim();
    if !trimmed.is_empty() && trimmed.len() < 5 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>5}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Normalise a caller-supplied postal code and reject anything that is not
/// a plain code.
///
/// Codes end up in artifact file names, so only ASCII letters, digits and
/// `-` are accepted.
pub(crate) fn validate_postal_code(code: &str) -> Result<String, AppError> {
    let normalized = normalize_postal_code(code);
    if normalized.is_empty() {
        return Err(AppError::InvalidConfiguration(
            "postal code must not be empty".to_string(),
        ));
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(AppError::InvalidConfiguration(format!(
            "postal code '{}' may only contain letters, digits and '-'",
            normalized
        )));
    }
    Ok(normalized)
}

/// Whether `year` has a February 29.
pub(crate) fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Number of hours in a non-leap year.
pub(crate) const HOURS_PER_YEAR: usize = 8760;
