use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::queries::AttributeFilter;

pub const MAX_IMAGE_CONTENT_TYPE_LEN: usize = 50;

/// Largest price `products.price` (`DECIMAL(15, 2)`) holds; SQLite keeps it
/// as a double, so 15 significant digits is also the exact round-trip limit.
pub const MAX_PRICE: Decimal = dec!(9999999999999.99);
pub const PRICE_SCALE: u32 = 2;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /category` and `PUT /category/{id}`.
///
/// On update an omitted (or null) `attributeIds` leaves the current
/// associations alone; an empty list detaches every attribute.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Electronics")]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    pub attribute_ids: Option<Vec<i32>>,
}

/// Body of `POST /attribute` and `PUT /attribute/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRequest {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Color")]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_attribute_values")]
    #[schema(example = json!(["Black", "White"]))]
    pub values: Option<Vec<String>>,
}

/// Raw image bytes taken from an upload.
#[derive(Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Product fields accepted by create and update.
#[derive(Debug, Clone, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
    pub category_id: i32,
    /// `None` keeps the stored flag on update and means `false` on create.
    pub is_recommended: Option<bool>,
    /// `None` keeps the stored image on update.
    pub image: Option<ImageUpload>,
    /// `None` leaves links untouched on update; `Some(vec![])` removes them all.
    pub attribute_value_ids: Option<Vec<i32>>,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, price: Decimal, stock_quantity: i32, category_id: i32) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            stock_quantity,
            category_id,
            is_recommended: None,
            image: None,
            attribute_value_ids: None,
        }
    }
}

/// Multipart form accepted by `POST /product` and `PUT /product/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    #[schema(example = "iPhone 13 Pro")]
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "999.99")]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: i32,
    pub is_recommended: Option<bool>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
    pub attribute_value_ids: Option<Vec<i32>>,
}

/// Body of `POST /product/{id}/attributes`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddProductAttributeRequest {
    pub attribute_value_id: i32,
}

/// Body of `POST /product/filter`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilterRequest {
    pub category_id: Option<i32>,
    #[serde(default)]
    pub attribute_filters: Vec<AttributeFilter>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must not be negative".into());
        return Err(err);
    }
    if *price > MAX_PRICE {
        let mut err = ValidationError::new("price");
        err.message = Some(format!("Price must not exceed {}", MAX_PRICE).into());
        return Err(err);
    }
    if price.normalize().scale() > PRICE_SCALE {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must have at most 2 decimal places".into());
        return Err(err);
    }
    Ok(())
}

fn validate_attribute_values(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.is_empty() || v.chars().count() > 100) {
        let mut err = ValidationError::new("values");
        err.message = Some("Attribute values must be between 1 and 100 characters".into());
        return Err(err);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSummary {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub attributes: Vec<AttributeSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttributeResponse {
    pub attribute_value_id: i32,
    pub attribute_id: i32,
    pub attribute_name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "999.99")]
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category_id: i32,
    pub category_name: String,
    pub image_base64: Option<String>,
    pub image_content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_recommended: bool,
    pub attributes: Vec<ProductAttributeResponse>,
}

/// Row counts after a seed or reseed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCounts {
    pub categories: u64,
    pub attributes: u64,
    pub attribute_values: u64,
    pub products: u64,
    pub product_attribute_values: u64,
    pub category_attribute_links: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    #[schema(example = "Database seeded successfully")]
    pub message: String,
    /// False when seeding was skipped because the catalog already had data.
    pub seeded: bool,
    #[serde(flatten)]
    pub counts: CatalogCounts,
}
