use super::common::{map_service_error, success_response};
use crate::{dto::SeedReport, errors::{ApiError, ErrorResponse}, AppState};
use axum::{extract::State, response::IntoResponse, routing::post, Router};
use tracing::info;

pub fn database_routes() -> Router<AppState> {
    Router::new()
        .route("/database/seed", post(seed_database))
        .route("/database/reseed", post(reseed_database))
}

/// Populate the demo catalog when the store is empty
#[utoipa::path(
    post,
    path = "/api/database/seed",
    responses(
        (status = 200, description = "Seed finished (possibly skipped)", body = SeedReport),
        (status = 500, description = "Seeding failed and was rolled back", body = ErrorResponse)
    ),
    tag = "Database"
)]
pub async fn seed_database(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .seeder
        .seed()
        .await
        .map_err(map_service_error)?;

    info!(seeded = report.seeded, "Seed requested over HTTP");
    Ok(success_response(report))
}

/// Wipe the catalog and populate the demo data again
#[utoipa::path(
    post,
    path = "/api/database/reseed",
    responses(
        (status = 200, description = "Catalog replaced with demo data", body = SeedReport),
        (status = 500, description = "Reseeding failed and was rolled back", body = ErrorResponse)
    ),
    tag = "Database"
)]
pub async fn reseed_database(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .seeder
        .reseed()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}
