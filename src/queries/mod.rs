use crate::errors::ServiceError;
use async_trait::async_trait;
use sea_orm::ConnectionTrait;

pub mod product_queries;

pub use product_queries::{AttributeFilter, FilterProductsQuery, ProductsByCategoryQuery};

/// A read-only query that can run against a pool or inside a transaction.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute<C>(&self, db: &C) -> Result<Self::Result, ServiceError>
    where
        C: ConnectionTrait + Send + Sync;
}
