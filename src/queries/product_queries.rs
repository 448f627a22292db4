use super::Query;
use crate::{
    entities::{attribute_value, product, product_attribute_value},
    errors::ServiceError,
};
use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, Query as SeaQuery, SelectStatement},
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

/// Requires a product to carry `value` under the attribute `category_attribute_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    pub category_attribute_id: i32,
    pub value: String,
}

impl AttributeFilter {
    pub fn new(category_attribute_id: i32, value: impl Into<String>) -> Self {
        Self {
            category_attribute_id,
            value: value.into(),
        }
    }

    /// `SELECT product_id FROM product_attribute_values JOIN attribute_values ... WHERE attribute = ? AND value = ?`
    fn matching_product_ids(&self) -> SelectStatement {
        SeaQuery::select()
            .column((
                product_attribute_value::Entity,
                product_attribute_value::Column::ProductId,
            ))
            .from(product_attribute_value::Entity)
            .inner_join(
                attribute_value::Entity,
                Expr::col((attribute_value::Entity, attribute_value::Column::Id)).equals((
                    product_attribute_value::Entity,
                    product_attribute_value::Column::AttributeValueId,
                )),
            )
            .and_where(
                Expr::col((
                    attribute_value::Entity,
                    attribute_value::Column::CategoryAttributeId,
                ))
                .eq(self.category_attribute_id),
            )
            .and_where(
                Expr::col((attribute_value::Entity, attribute_value::Column::Value))
                    .eq(self.value.as_str()),
            )
            .to_owned()
    }
}

/// Products matching an optional category and every attribute filter.
///
/// Each filter is an independent `id IN (...)` predicate, so a product must
/// satisfy all of them; two filters on the same attribute with different
/// values therefore only match products linked to both values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterProductsQuery {
    pub category_id: Option<i32>,
    pub attribute_filters: Vec<AttributeFilter>,
}

impl FilterProductsQuery {
    pub fn select(&self) -> Select<product::Entity> {
        let mut condition = Condition::all();

        if let Some(category_id) = self.category_id {
            condition = condition.add(product::Column::CategoryId.eq(category_id));
        }

        for filter in &self.attribute_filters {
            condition = condition.add(product::Column::Id.in_subquery(filter.matching_product_ids()));
        }

        let mut select = product::Entity::find();
        if !condition.is_empty() {
            select = select.filter(condition);
        }
        select.order_by_asc(product::Column::Id)
    }
}

#[async_trait]
impl Query for FilterProductsQuery {
    type Result = Vec<product::Model>;

    async fn execute<C>(&self, db: &C) -> Result<Self::Result, ServiceError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        debug!(
            category_id = ?self.category_id,
            filters = self.attribute_filters.len(),
            "filtering products"
        );
        self.select().all(db).await.map_err(ServiceError::db_error)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProductsByCategoryQuery {
    pub category_id: i32,
}

#[async_trait]
impl Query for ProductsByCategoryQuery {
    type Result = Vec<product::Model>;

    async fn execute<C>(&self, db: &C) -> Result<Self::Result, ServiceError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        FilterProductsQuery {
            category_id: Some(self.category_id),
            attribute_filters: Vec::new(),
        }
        .execute(db)
        .await
    }
}
