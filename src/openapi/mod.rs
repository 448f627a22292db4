use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = r#"
# Catalog API

Categories, category attributes with their values, and products tagged with
those values.

## Error Handling

Failures share one body shape:

```json
{
  "error": "Not Found",
  "message": "Not found: Product with ID 7 not found",
  "request_id": "2f0b6c1e-...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

Every response carries an `x-request-id` header; send your own to correlate logs.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Categories", description = "Category endpoints"),
        (name = "Attributes", description = "Category attribute and value endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Database", description = "Demo data seeding"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        // Attributes
        crate::handlers::attributes::list_attributes,
        crate::handlers::attributes::get_attribute,
        crate::handlers::attributes::create_attribute,
        crate::handlers::attributes::update_attribute,
        crate::handlers::attributes::delete_attribute,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::list_products_by_category,
        crate::handlers::products::filter_products,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::add_product_attribute,
        crate::handlers::products::remove_product_attribute,

        // Database
        crate::handlers::database::seed_database,
        crate::handlers::database::reseed_database,

        crate::health::health_check,
    ),
    components(
        schemas(
            crate::dto::CategoryRequest,
            crate::dto::CategoryResponse,
            crate::dto::AttributeSummary,
            crate::dto::AttributeRequest,
            crate::dto::AttributeResponse,
            crate::dto::ProductForm,
            crate::dto::ProductResponse,
            crate::dto::ProductAttributeResponse,
            crate::dto::AddProductAttributeRequest,
            crate::dto::ProductFilterRequest,
            crate::queries::AttributeFilter,
            crate::dto::CatalogCounts,
            crate::dto::SeedReport,
            crate::health::HealthInfo,
            crate::health::HealthDetail,
            crate::health::HealthStatus,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_catalog_routes() {
        let json = ApiDocV1::openapi().to_json().unwrap();
        assert!(json.contains("Catalog API"));
        assert!(json.contains("/api/category/{id}"));
        assert!(json.contains("/api/product/filter"));
        assert!(json.contains("/api/database/reseed"));
    }
}
