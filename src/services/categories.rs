use crate::{
    dto::{AttributeSummary, CategoryRequest, CategoryResponse},
    entities::{category, category_attribute, category_attribute_category, product},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{dedup_ids, record_not_updated};

/// Category CRUD plus the category↔attribute association.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All categories with their attribute summaries, ordered by id.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryResponse>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?;
        hydrate_categories(&*self.db, categories).await
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: i32) -> Result<CategoryResponse, ServiceError> {
        let category = find_category(&*self.db, id).await?;
        let mut hydrated = hydrate_categories(&*self.db, vec![category]).await?;
        hydrated
            .pop()
            .ok_or_else(|| ServiceError::InternalError("category hydration returned nothing".into()))
    }

    /// Creates a category and attaches whichever requested attributes exist.
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let created = category::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(attribute_ids) = input.attribute_ids.as_deref() {
            attach_attributes(&txn, created.id, attribute_ids).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(category_id = created.id, "Created category");
        self.get_category(created.id).await
    }

    /// Overwrites name and description; replaces the attribute set only when
    /// `attribute_ids` is present.
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: i32,
        input: CategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = find_category(&txn, id).await?;
        let mut active: category::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.description = Set(input.description);

        match active.update(&txn).await {
            Ok(_) => {}
            Err(DbErr::RecordNotUpdated) => {
                let still_exists = category::Entity::find_by_id(id).one(&txn).await?.is_some();
                return Err(record_not_updated("Category", id, still_exists));
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(attribute_ids) = input.attribute_ids.as_deref() {
            category_attribute_category::Entity::delete_many()
                .filter(category_attribute_category::Column::CategoryId.eq(id))
                .exec(&txn)
                .await?;
            attach_attributes(&txn, id, attribute_ids).await?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(category_id = id, "Updated category");
        self.get_category(id).await
    }

    /// Deletes a category that no product references.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        find_category(&txn, id).await?;

        let referencing = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&txn)
            .await?;
        if referencing > 0 {
            warn!(category_id = id, referencing, "Refusing to delete referenced category");
            return Err(ServiceError::Conflict(format!(
                "Category with ID {} is still used by {} product(s)",
                id, referencing
            )));
        }

        category_attribute_category::Entity::delete_many()
            .filter(category_attribute_category::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        category::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(category_id = id, "Deleted category");
        Ok(())
    }
}

async fn find_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<category::Model, ServiceError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Category with ID {} not found", id)))
}

/// Links `category_id` to the attributes in `requested` that exist; unknown ids are skipped.
async fn attach_attributes<C: ConnectionTrait>(
    db: &C,
    category_id: i32,
    requested: &[i32],
) -> Result<(), ServiceError> {
    let requested = dedup_ids(requested);
    if requested.is_empty() {
        return Ok(());
    }

    let existing = category_attribute::Entity::find()
        .filter(category_attribute::Column::Id.is_in(requested.clone()))
        .order_by_asc(category_attribute::Column::Id)
        .all(db)
        .await?;

    if existing.len() < requested.len() {
        warn!(
            category_id,
            requested = requested.len(),
            found = existing.len(),
            "Ignoring unknown attribute ids"
        );
    }
    if existing.is_empty() {
        return Ok(());
    }

    category_attribute_category::Entity::insert_many(existing.into_iter().map(|attribute| {
        category_attribute_category::ActiveModel {
            category_id: Set(category_id),
            category_attribute_id: Set(attribute.id),
        }
    }))
    .exec(db)
    .await?;

    Ok(())
}

/// Attaches attribute summaries to each category with one query per table.
pub(crate) async fn hydrate_categories<C: ConnectionTrait>(
    db: &C,
    categories: Vec<category::Model>,
) -> Result<Vec<CategoryResponse>, ServiceError> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }

    let category_ids: Vec<i32> = categories.iter().map(|c| c.id).collect();
    let links = category_attribute_category::Entity::find()
        .filter(category_attribute_category::Column::CategoryId.is_in(category_ids))
        .all(db)
        .await?;

    let attribute_ids = dedup_ids(&links.iter().map(|l| l.category_attribute_id).collect::<Vec<_>>());
    let attributes: HashMap<i32, category_attribute::Model> = if attribute_ids.is_empty() {
        HashMap::new()
    } else {
        category_attribute::Entity::find()
            .filter(category_attribute::Column::Id.is_in(attribute_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect()
    };

    let mut by_category: HashMap<i32, Vec<AttributeSummary>> = HashMap::new();
    for link in links {
        if let Some(attribute) = attributes.get(&link.category_attribute_id) {
            by_category
                .entry(link.category_id)
                .or_default()
                .push(AttributeSummary {
                    id: attribute.id,
                    name: attribute.name.clone(),
                    description: attribute.description.clone(),
                });
        }
    }

    Ok(categories
        .into_iter()
        .map(|c| {
            let mut attributes = by_category.remove(&c.id).unwrap_or_default();
            attributes.sort_by_key(|a| a.id);
            CategoryResponse {
                id: c.id,
                name: c.name,
                description: c.description,
                created_at: c.created_at,
                updated_at: c.updated_at,
                attributes,
            }
        })
        .collect())
}
