use crate::{
    dto::{AttributeRequest, AttributeResponse},
    entities::{attribute_value, category_attribute, category_attribute_category, product_attribute_value},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

use super::record_not_updated;

/// Category attributes and the values they own.
#[derive(Clone)]
pub struct AttributeService {
    db: Arc<DatabaseConnection>,
}

impl AttributeService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_attributes(&self) -> Result<Vec<AttributeResponse>, ServiceError> {
        let attributes = category_attribute::Entity::find()
            .order_by_asc(category_attribute::Column::Id)
            .all(&*self.db)
            .await?;
        hydrate_attributes(&*self.db, attributes).await
    }

    #[instrument(skip(self))]
    pub async fn get_attribute(&self, id: i32) -> Result<AttributeResponse, ServiceError> {
        let attribute = find_attribute(&*self.db, id).await?;
        let mut hydrated = hydrate_attributes(&*self.db, vec![attribute]).await?;
        hydrated
            .pop()
            .ok_or_else(|| ServiceError::InternalError("attribute hydration returned nothing".into()))
    }

    /// Inserts the attribute, then one value row per supplied string.
    #[instrument(skip(self))]
    pub async fn create_attribute(
        &self,
        input: AttributeRequest,
    ) -> Result<AttributeResponse, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let created = category_attribute::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(values) = input.values {
            insert_values(&txn, created.id, values).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(attribute_id = created.id, "Created category attribute");
        self.get_attribute(created.id).await
    }

    /// Overwrites the scalars. A present `values` list replaces every stored
    /// value; product links to the discarded values go with them.
    #[instrument(skip(self))]
    pub async fn update_attribute(
        &self,
        id: i32,
        input: AttributeRequest,
    ) -> Result<AttributeResponse, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = find_attribute(&txn, id).await?;
        let mut active: category_attribute::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.description = Set(input.description);

        match active.update(&txn).await {
            Ok(_) => {}
            Err(DbErr::RecordNotUpdated) => {
                let still_exists = category_attribute::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .is_some();
                return Err(record_not_updated("Category attribute", id, still_exists));
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(values) = input.values {
            let unlinked = delete_values(&txn, id).await?;
            if unlinked > 0 {
                info!(attribute_id = id, unlinked, "Dropped product links to replaced values");
            }
            insert_values(&txn, id, values).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(attribute_id = id, "Updated category attribute");
        self.get_attribute(id).await
    }

    /// Removes the attribute together with its values and every link to them.
    #[instrument(skip(self))]
    pub async fn delete_attribute(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        find_attribute(&txn, id).await?;

        delete_values(&txn, id).await?;
        category_attribute_category::Entity::delete_many()
            .filter(category_attribute_category::Column::CategoryAttributeId.eq(id))
            .exec(&txn)
            .await?;
        category_attribute::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(attribute_id = id, "Deleted category attribute");
        Ok(())
    }
}

async fn find_attribute<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<category_attribute::Model, ServiceError> {
    category_attribute::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Category attribute with ID {} not found", id)))
}

async fn insert_values<C: ConnectionTrait>(
    db: &C,
    attribute_id: i32,
    values: Vec<String>,
) -> Result<(), ServiceError> {
    if values.is_empty() {
        return Ok(());
    }

    attribute_value::Entity::insert_many(values.into_iter().map(|value| {
        attribute_value::ActiveModel {
            value: Set(value),
            category_attribute_id: Set(attribute_id),
            ..Default::default()
        }
    }))
    .exec(db)
    .await?;

    Ok(())
}

/// Deletes all values of `attribute_id` and the product links that point at
/// them. Returns how many product links were removed.
async fn delete_values<C: ConnectionTrait>(db: &C, attribute_id: i32) -> Result<u64, ServiceError> {
    let value_ids: Vec<i32> = attribute_value::Entity::find()
        .select_only()
        .column(attribute_value::Column::Id)
        .filter(attribute_value::Column::CategoryAttributeId.eq(attribute_id))
        .into_tuple()
        .all(db)
        .await?;

    if value_ids.is_empty() {
        return Ok(0);
    }

    let unlinked = product_attribute_value::Entity::delete_many()
        .filter(product_attribute_value::Column::AttributeValueId.is_in(value_ids))
        .exec(db)
        .await?
        .rows_affected;

    let removed = attribute_value::Entity::delete_many()
        .filter(attribute_value::Column::CategoryAttributeId.eq(attribute_id))
        .exec(db)
        .await?
        .rows_affected;
    debug!(attribute_id, removed, "Removed attribute values");

    Ok(unlinked)
}

/// Attaches the flattened value strings to each attribute, ordered by value id.
pub(crate) async fn hydrate_attributes<C: ConnectionTrait>(
    db: &C,
    attributes: Vec<category_attribute::Model>,
) -> Result<Vec<AttributeResponse>, ServiceError> {
    if attributes.is_empty() {
        return Ok(Vec::new());
    }

    let attribute_ids: Vec<i32> = attributes.iter().map(|a| a.id).collect();
    let mut values_by_attribute: HashMap<i32, Vec<String>> = HashMap::new();
    for value in attribute_value::Entity::find()
        .filter(attribute_value::Column::CategoryAttributeId.is_in(attribute_ids))
        .order_by_asc(attribute_value::Column::Id)
        .all(db)
        .await?
    {
        values_by_attribute
            .entry(value.category_attribute_id)
            .or_default()
            .push(value.value);
    }

    Ok(attributes
        .into_iter()
        .map(|a| AttributeResponse {
            values: values_by_attribute.remove(&a.id).unwrap_or_default(),
            id: a.id,
            name: a.name,
            description: a.description,
        })
        .collect())
}
