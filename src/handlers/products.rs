use super::common::{
    created_at_response, map_service_error, no_content_response, success_response,
};
use crate::{
    dto::{
        AddProductAttributeRequest, ImageUpload, ProductFilterRequest, ProductForm, ProductInput,
        ProductResponse,
    },
    errors::{ApiError, ErrorResponse},
    AppState,
};
use axum::{
    extract::{Json, Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_IMAGE_CONTENT_TYPE: &str = "application/octet-stream";

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/product/all", get(list_products))
        .route("/product/filter", post(filter_products))
        .route("/product/category/:category_id", get(list_products_by_category))
        .route("/product", post(create_product))
        .route(
            "/product/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/product/:id/attributes", post(add_product_attribute))
        .route(
            "/product/:id/attributes/:attribute_value_id",
            delete(remove_product_attribute),
        )
}

/// List every product
#[utoipa::path(
    get,
    path = "/api/product/all",
    responses((status = 200, description = "All products", body = [ProductResponse])),
    tag = "Products"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .list_products()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/product/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

/// List the products of one category; unknown categories yield an empty list
#[utoipa::path(
    get,
    path = "/api/product/category/{categoryId}",
    params(("categoryId" = i32, Path, description = "Category id")),
    responses((status = 200, description = "Products in the category", body = [ProductResponse])),
    tag = "Products"
)]
pub async fn list_products_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .list_products_by_category(category_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Products matching an optional category and every attribute filter
#[utoipa::path(
    post,
    path = "/api/product/filter",
    request_body = ProductFilterRequest,
    responses((status = 200, description = "Matching products", body = [ProductResponse])),
    tag = "Products"
)]
pub async fn filter_products(
    State(state): State<AppState>,
    Json(payload): Json<ProductFilterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .products
        .filter_products(payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Create a product from a multipart form
#[utoipa::path(
    post,
    path = "/api/product",
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid form, unknown category or attribute value, oversized image", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let input = read_product_form(multipart).await?;

    let product = state
        .services
        .products
        .create_product(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_at_response(
        format!("/api/product/{}", product.id),
        product,
    ))
}

/// Update a product from a multipart form
///
/// Without an `image` part the stored image is kept. Without any
/// `attributeValueIds` part the stored links are kept.
#[utoipa::path(
    put,
    path = "/api/product/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 204, description = "Product updated"),
        (status = 400, description = "Invalid form, unknown category or attribute value, oversized image", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let input = read_product_form(multipart).await?;

    state
        .services
        .products
        .update_product(id, input)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Delete a product and its attribute links
#[utoipa::path(
    delete,
    path = "/api/product/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .products
        .delete_product(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Link one attribute value to a product
#[utoipa::path(
    post,
    path = "/api/product/{id}/attributes",
    params(("id" = i32, Path, description = "Product id")),
    request_body = AddProductAttributeRequest,
    responses(
        (status = 200, description = "Link added", body = ProductResponse),
        (status = 400, description = "Attribute value does not exist", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 409, description = "Link already exists", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn add_product_attribute(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AddProductAttributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .add_product_attribute(id, payload.attribute_value_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

/// Unlink one attribute value from a product
#[utoipa::path(
    delete,
    path = "/api/product/{id}/attributes/{attributeValueId}",
    params(
        ("id" = i32, Path, description = "Product id"),
        ("attributeValueId" = i32, Path, description = "Attribute value id")
    ),
    responses(
        (status = 204, description = "Link removed"),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn remove_product_attribute(
    State(state): State<AppState>,
    Path((id, attribute_value_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .products
        .remove_product_attribute(id, attribute_value_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Collects the product form parts into a `ProductInput`.
///
/// Blank text parts count as absent and unknown parts are skipped.
async fn read_product_form(mut multipart: Multipart) -> Result<ProductInput, ApiError> {
    let mut name = None;
    let mut description = None;
    let mut price = None;
    let mut stock_quantity = None;
    let mut category_id = None;
    let mut is_recommended = None;
    let mut image = None;
    let mut attribute_value_ids: Option<Vec<i32>> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "image" => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string());
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        bytes: bytes.to_vec(),
                        content_type,
                    });
                }
            }
            "attributeValueIds" | "attributeValueIds[]" => {
                let text = field.text().await?;
                let ids = attribute_value_ids.get_or_insert_with(Vec::new);
                for raw in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    ids.push(parse_field("attributeValueIds", raw)?);
                }
            }
            "name" | "description" | "price" | "stockQuantity" | "categoryId" | "isRecommended" => {
                let text = field.text().await?;
                let value = text.trim();
                if value.is_empty() {
                    continue;
                }
                match field_name.as_str() {
                    "name" => name = Some(value.to_string()),
                    "description" => description = Some(value.to_string()),
                    "price" => price = Some(parse_field::<Decimal>("price", value)?),
                    "stockQuantity" => stock_quantity = Some(parse_field("stockQuantity", value)?),
                    "categoryId" => category_id = Some(parse_field("categoryId", value)?),
                    _ => is_recommended = Some(parse_bool("isRecommended", value)?),
                }
            }
            other => debug!(field = other, "Ignoring unknown product form field"),
        }
    }

    Ok(ProductInput {
        name: required("name", name)?,
        description,
        price: required("price", price)?,
        stock_quantity: required("stockQuantity", stock_quantity)?,
        category_id: required("categoryId", category_id)?,
        is_recommended,
        image,
        attribute_value_ids,
    })
}

fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, ApiError> {
    value.parse::<T>().map_err(|_| ApiError::BadRequest {
        message: format!("{} has an invalid value: {}", field, value),
        error_code: Some("invalid_field".to_string()),
    })
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ApiError> {
    parse_field::<bool>(field, &value.to_ascii_lowercase())
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest {
        message: format!("{} is required", field),
        error_code: Some("missing_field".to_string()),
    })
}
