use crate::{
    dto::{
        ImageUpload, ProductAttributeResponse, ProductFilterRequest, ProductInput,
        ProductResponse, MAX_IMAGE_CONTENT_TYPE_LEN,
    },
    entities::{attribute_value, category, category_attribute, product, product_attribute_value},
    errors::ServiceError,
    queries::{FilterProductsQuery, ProductsByCategoryQuery, Query},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{dedup_ids, record_not_updated};

/// Products, their images, and their attribute-value links.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    max_image_bytes: usize,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, max_image_bytes: usize) -> Self {
        Self {
            db,
            max_image_bytes,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductResponse>, ServiceError> {
        let products = FilterProductsQuery::default().execute(&*self.db).await?;
        hydrate_products(&*self.db, products).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<ProductResponse, ServiceError> {
        let product = find_product(&*self.db, id).await?;
        let mut hydrated = hydrate_products(&*self.db, vec![product]).await?;
        hydrated
            .pop()
            .ok_or_else(|| ServiceError::InternalError("product hydration returned nothing".into()))
    }

    /// Products in `category_id`; empty when the category has none or does not exist.
    #[instrument(skip(self))]
    pub async fn list_products_by_category(
        &self,
        category_id: i32,
    ) -> Result<Vec<ProductResponse>, ServiceError> {
        let products = ProductsByCategoryQuery { category_id }
            .execute(&*self.db)
            .await?;
        hydrate_products(&*self.db, products).await
    }

    /// Products matching the category (if given) and every attribute filter.
    #[instrument(skip(self))]
    pub async fn filter_products(
        &self,
        request: ProductFilterRequest,
    ) -> Result<Vec<ProductResponse>, ServiceError> {
        let products = FilterProductsQuery {
            category_id: request.category_id,
            attribute_filters: request.attribute_filters,
        }
        .execute(&*self.db)
        .await?;
        hydrate_products(&*self.db, products).await
    }

    #[instrument(skip(self))]
    pub async fn create_product(&self, input: ProductInput) -> Result<ProductResponse, ServiceError> {
        input.validate()?;
        let (image_base64, image_content_type) = match input.image {
            Some(image) => {
                let (data, content_type) = self.encode_image(image)?;
                (Some(data), Some(content_type))
            }
            None => (None, None),
        };

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        ensure_category(&txn, input.category_id).await?;
        let links = match input.attribute_value_ids.as_deref() {
            Some(ids) => resolve_attribute_values(&txn, ids).await?,
            None => Vec::new(),
        };

        let created = product::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock_quantity: Set(input.stock_quantity),
            category_id: Set(input.category_id),
            image_base64: Set(image_base64),
            image_content_type: Set(image_content_type),
            is_recommended: Set(input.is_recommended.unwrap_or(false)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_links(&txn, created.id, &links).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(product_id = created.id, links = links.len(), "Created product");
        self.get_product(created.id).await
    }

    /// Overwrites the scalar fields. The image is replaced only when a new
    /// one is supplied; links are replaced wholesale when ids are supplied.
    #[instrument(skip(self))]
    pub async fn update_product(&self, id: i32, input: ProductInput) -> Result<(), ServiceError> {
        input.validate()?;
        let image = input.image.map(|image| self.encode_image(image)).transpose()?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = find_product(&txn, id).await?;
        ensure_category(&txn, input.category_id).await?;
        let links = match input.attribute_value_ids.as_deref() {
            Some(ids) => Some(resolve_attribute_values(&txn, ids).await?),
            None => None,
        };

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.price = Set(input.price);
        active.stock_quantity = Set(input.stock_quantity);
        active.category_id = Set(input.category_id);
        if let Some(is_recommended) = input.is_recommended {
            active.is_recommended = Set(is_recommended);
        }
        if let Some((data, content_type)) = image {
            active.image_base64 = Set(Some(data));
            active.image_content_type = Set(Some(content_type));
        }

        match active.update(&txn).await {
            Ok(_) => {}
            Err(DbErr::RecordNotUpdated) => {
                let still_exists = product::Entity::find_by_id(id).one(&txn).await?.is_some();
                return Err(record_not_updated("Product", id, still_exists));
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(links) = links {
            product_attribute_value::Entity::delete_many()
                .filter(product_attribute_value::Column::ProductId.eq(id))
                .exec(&txn)
                .await?;
            insert_links(&txn, id, &links).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(product_id = id, "Updated product");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        find_product(&txn, id).await?;
        product_attribute_value::Entity::delete_many()
            .filter(product_attribute_value::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        product::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(product_id = id, "Deleted product");
        Ok(())
    }

    /// Links one attribute value to a product.
    #[instrument(skip(self))]
    pub async fn add_product_attribute(
        &self,
        product_id: i32,
        attribute_value_id: i32,
    ) -> Result<ProductResponse, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = find_product(&txn, product_id).await?;
        attribute_value::Entity::find_by_id(attribute_value_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::BadRequest(format!(
                    "Attribute value with ID {} not found",
                    attribute_value_id
                ))
            })?;

        if product_attribute_value::Entity::find_by_id((product_id, attribute_value_id))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "Product {} already has attribute value {}",
                product_id, attribute_value_id
            )));
        }

        product_attribute_value::ActiveModel {
            product_id: Set(product_id),
            attribute_value_id: Set(attribute_value_id),
        }
        .insert(&txn)
        .await?;
        touch_product(&txn, existing).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(product_id, attribute_value_id, "Linked attribute value to product");
        self.get_product(product_id).await
    }

    /// Unlinks one attribute value; the link must exist.
    #[instrument(skip(self))]
    pub async fn remove_product_attribute(
        &self,
        product_id: i32,
        attribute_value_id: i32,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = find_product(&txn, product_id).await?;
        let removed = product_attribute_value::Entity::delete_by_id((product_id, attribute_value_id))
            .exec(&txn)
            .await?
            .rows_affected;
        if removed == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} has no attribute value {}",
                product_id, attribute_value_id
            )));
        }
        touch_product(&txn, existing).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(product_id, attribute_value_id, "Unlinked attribute value from product");
        Ok(())
    }

    fn encode_image(&self, image: ImageUpload) -> Result<(String, String), ServiceError> {
        if image.bytes.len() > self.max_image_bytes {
            warn!(
                size = image.bytes.len(),
                limit = self.max_image_bytes,
                "Rejecting oversized product image"
            );
            return Err(ServiceError::ValidationError(format!(
                "Image is {} bytes; the maximum is {} bytes",
                image.bytes.len(),
                self.max_image_bytes
            )));
        }
        if image.content_type.chars().count() > MAX_IMAGE_CONTENT_TYPE_LEN {
            return Err(ServiceError::ValidationError(format!(
                "Image content type must be at most {} characters",
                MAX_IMAGE_CONTENT_TYPE_LEN
            )));
        }
        Ok((STANDARD.encode(&image.bytes), image.content_type))
    }
}

async fn find_product<C: ConnectionTrait>(db: &C, id: i32) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", id)))
}

async fn ensure_category<C: ConnectionTrait>(db: &C, category_id: i32) -> Result<(), ServiceError> {
    category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::BadRequest(format!("Category with ID {} not found", category_id)))
}

/// Deduplicates `requested` and fails if any id has no attribute value row.
async fn resolve_attribute_values<C: ConnectionTrait>(
    db: &C,
    requested: &[i32],
) -> Result<Vec<i32>, ServiceError> {
    let ids = dedup_ids(requested);
    if ids.is_empty() {
        return Ok(ids);
    }

    let found: HashSet<i32> = attribute_value::Entity::find()
        .select_only()
        .column(attribute_value::Column::Id)
        .filter(attribute_value::Column::Id.is_in(ids.clone()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::BadRequest(format!(
            "Attribute value(s) not found: {}",
            missing.join(", ")
        )));
    }

    Ok(ids)
}

async fn insert_links<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    attribute_value_ids: &[i32],
) -> Result<(), ServiceError> {
    if attribute_value_ids.is_empty() {
        return Ok(());
    }

    product_attribute_value::Entity::insert_many(attribute_value_ids.iter().map(|value_id| {
        product_attribute_value::ActiveModel {
            product_id: Set(product_id),
            attribute_value_id: Set(*value_id),
        }
    }))
    .exec(db)
    .await?;

    Ok(())
}

/// Stamps `updated_at` after a link change.
async fn touch_product<C: ConnectionTrait>(db: &C, existing: product::Model) -> Result<(), ServiceError> {
    let mut active: product::ActiveModel = existing.into();
    active.updated_at = Set(Some(chrono::Utc::now()));
    active.update(db).await?;
    Ok(())
}

/// Resolves category names and the product → value → attribute chain with one
/// query per table.
pub(crate) async fn hydrate_products<C: ConnectionTrait>(
    db: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductResponse>, ServiceError> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let category_ids = dedup_ids(&products.iter().map(|p| p.category_id).collect::<Vec<_>>());
    let category_names: HashMap<i32, String> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let links = product_attribute_value::Entity::find()
        .filter(product_attribute_value::Column::ProductId.is_in(product_ids))
        .order_by_asc(product_attribute_value::Column::ProductId)
        .order_by_asc(product_attribute_value::Column::AttributeValueId)
        .all(db)
        .await?;

    let value_ids = dedup_ids(&links.iter().map(|l| l.attribute_value_id).collect::<Vec<_>>());
    let values: HashMap<i32, attribute_value::Model> = if value_ids.is_empty() {
        HashMap::new()
    } else {
        attribute_value::Entity::find()
            .filter(attribute_value::Column::Id.is_in(value_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect()
    };

    let attribute_ids = dedup_ids(
        &values
            .values()
            .map(|v| v.category_attribute_id)
            .collect::<Vec<_>>(),
    );
    let attribute_names: HashMap<i32, String> = if attribute_ids.is_empty() {
        HashMap::new()
    } else {
        category_attribute::Entity::find()
            .filter(category_attribute::Column::Id.is_in(attribute_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect()
    };

    let mut attributes_by_product: HashMap<i32, Vec<ProductAttributeResponse>> = HashMap::new();
    for link in links {
        let Some(value) = values.get(&link.attribute_value_id) else {
            continue;
        };
        attributes_by_product
            .entry(link.product_id)
            .or_default()
            .push(ProductAttributeResponse {
                attribute_value_id: value.id,
                attribute_id: value.category_attribute_id,
                attribute_name: attribute_names
                    .get(&value.category_attribute_id)
                    .cloned()
                    .unwrap_or_default(),
                value: value.value.clone(),
            });
    }

    Ok(products
        .into_iter()
        .map(|p| ProductResponse {
            category_name: category_names.get(&p.category_id).cloned().unwrap_or_default(),
            attributes: attributes_by_product.remove(&p.id).unwrap_or_default(),
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            stock_quantity: p.stock_quantity,
            category_id: p.category_id,
            image_base64: p.image_base64,
            image_content_type: p.image_content_type,
            created_at: p.created_at,
            updated_at: p.updated_at,
            is_recommended: p.is_recommended,
        })
        .collect())
}
