pub mod attributes;
pub mod categories;
pub mod common;
pub mod database;
pub mod products;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{AttributeService, CategoryService, ProductService, SeedService},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<CategoryService>,
    pub attributes: Arc<AttributeService>,
    pub products: Arc<ProductService>,
    pub seeder: Arc<SeedService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            attributes: Arc::new(AttributeService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool.clone(), config.max_image_bytes)),
            seeder: Arc::new(SeedService::new(db_pool)),
        }
    }
}
