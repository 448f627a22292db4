use super::common::{created_response, map_service_error, no_content_response, success_response};
use crate::{
    dto::{AttributeRequest, AttributeResponse},
    errors::{ApiError, ErrorResponse},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};

pub fn attribute_routes() -> Router<AppState> {
    Router::new()
        .route("/attribute/all", get(list_attributes))
        .route("/attribute", post(create_attribute))
        .route(
            "/attribute/:id",
            get(get_attribute).put(update_attribute).delete(delete_attribute),
        )
}

/// List every attribute with its values
#[utoipa::path(
    get,
    path = "/api/attribute/all",
    responses(
        (status = 200, description = "All attributes", body = [AttributeResponse])
    ),
    tag = "Attributes"
)]
pub async fn list_attributes(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let attributes = state
        .services
        .attributes
        .list_attributes()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(attributes))
}

/// Get an attribute by ID
#[utoipa::path(
    get,
    path = "/api/attribute/{id}",
    params(("id" = i32, Path, description = "Attribute id")),
    responses(
        (status = 200, description = "Attribute found", body = AttributeResponse),
        (status = 404, description = "Attribute not found", body = ErrorResponse)
    ),
    tag = "Attributes"
)]
pub async fn get_attribute(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let attribute = state
        .services
        .attributes
        .get_attribute(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(attribute))
}

/// Create an attribute together with its values
#[utoipa::path(
    post,
    path = "/api/attribute",
    request_body = AttributeRequest,
    responses(
        (status = 201, description = "Attribute created", body = AttributeResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse)
    ),
    tag = "Attributes"
)]
pub async fn create_attribute(
    State(state): State<AppState>,
    Json(payload): Json<AttributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let attribute = state
        .services
        .attributes
        .create_attribute(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(attribute))
}

/// Update an attribute; `values` replaces every stored value when present
#[utoipa::path(
    put,
    path = "/api/attribute/{id}",
    params(("id" = i32, Path, description = "Attribute id")),
    request_body = AttributeRequest,
    responses(
        (status = 200, description = "Attribute updated", body = AttributeResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "Attribute not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse)
    ),
    tag = "Attributes"
)]
pub async fn update_attribute(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AttributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let attribute = state
        .services
        .attributes
        .update_attribute(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(attribute))
}

/// Delete an attribute and all of its values
#[utoipa::path(
    delete,
    path = "/api/attribute/{id}",
    params(("id" = i32, Path, description = "Attribute id")),
    responses(
        (status = 204, description = "Attribute deleted"),
        (status = 404, description = "Attribute not found", body = ErrorResponse)
    ),
    tag = "Attributes"
)]
pub async fn delete_attribute(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .attributes
        .delete_attribute(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
