//! Location lookup endpoint.
//!
//! GET /api/v1/locations/:postal_code

use axum::extract::{Path, State};
use axum::Json;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::estimates::AppState;
use crate::services::location::Location;

/// Resolve a ZIP code to coordinates, elevation and timezone.
#[utoipa::path(
    get,
    path = "/api/v1/locations/{postal_code}",
    tag = "Locations",
    params(
        ("postal_code" = String, Path, description = "US ZIP code, e.g. 83333"),
    ),
    responses(
        (status = 200, description = "Resolved location", body = Location),
        (status = 404, description = "ZIP code unknown to table and geocoder", body = ErrorResponse),
        (status = 502, description = "Geocoder unavailable", body = ErrorResponse),
    )
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(postal_code): Path<String>,
) -> Result<Json<Location>, AppError> {
    let location = state.resolver.resolve(&postal_code).await?;
    Ok(Json(location))
}
