//! Canonical demo catalog.
//!
//! `seed` fills an empty store and does nothing otherwise; `reseed` wipes the
//! catalog tables and repopulates them. Both run in a single transaction.

use crate::{
    dto::{CatalogCounts, SeedReport},
    entities::{
        attribute_value, category, category_attribute, category_attribute_category, product,
        product_attribute_value,
    },
    errors::ServiceError,
};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set,
    TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// 1x1 transparent PNG used for every demo product.
pub const PLACEHOLDER_IMAGE_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";
pub const PLACEHOLDER_IMAGE_CONTENT_TYPE: &str = "image/png";

const ATTRIBUTES: [(&str, &str); 15] = [
    ("Brand", "Product manufacturer or brand name"),
    ("Color", "Product color"),
    ("Material", "Main material used"),
    ("Screen Size", "Display size in inches"),
    ("Storage", "Storage capacity"),
    ("RAM", "Memory size"),
    ("Size", "Product size"),
    ("Gender", "Target gender"),
    ("Season", "Suitable season"),
    ("Author", "Book author"),
    ("Genre", "Book genre"),
    ("Format", "Book format"),
    ("Room", "Intended room"),
    ("Usage", "Product usage"),
    ("Dimensions", "Product dimensions"),
];

/// Attributes every category carries.
const COMMON_ATTRIBUTES: [&str; 3] = ["Brand", "Color", "Material"];

/// Name, description and the category-specific attributes.
const CATEGORIES: [(&str, &str, [&str; 3]); 4] = [
    (
        "Electronics",
        "Electronic devices and accessories",
        ["Screen Size", "Storage", "RAM"],
    ),
    (
        "Clothing",
        "Apparel and fashion items",
        ["Size", "Gender", "Season"],
    ),
    (
        "Books",
        "Books and publications",
        ["Author", "Genre", "Format"],
    ),
    (
        "Home & Garden",
        "Home improvement and garden supplies",
        ["Room", "Usage", "Dimensions"],
    ),
];

const ATTRIBUTE_VALUES: [(&str, [&str; 4]); 4] = [
    ("Brand", ["Samsung", "Apple", "Nike", "Adidas"]),
    ("Color", ["Black", "White", "Red", "Blue"]),
    ("Size", ["S", "M", "L", "XL"]),
    ("Genre", ["Fiction", "Non-Fiction", "Science Fiction", "Mystery"]),
];

/// Product name, attribute name, value.
const PRODUCT_LINKS: [(&str, &str, &str); 12] = [
    ("iPhone 13 Pro", "Brand", "Apple"),
    ("iPhone 13 Pro", "Color", "Black"),
    ("Samsung Galaxy S21", "Brand", "Samsung"),
    ("Samsung Galaxy S21", "Color", "White"),
    ("Nike Air Max", "Brand", "Nike"),
    ("Nike Air Max", "Color", "Black"),
    ("Nike Air Max", "Size", "S"),
    ("Adidas T-Shirt", "Brand", "Adidas"),
    ("Adidas T-Shirt", "Color", "White"),
    ("Adidas T-Shirt", "Size", "M"),
    ("The Great Gatsby", "Genre", "Fiction"),
    ("1984", "Genre", "Non-Fiction"),
];

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    stock_quantity: i32,
    category: &'static str,
    is_recommended: bool,
}

fn seed_products() -> Vec<SeedProduct> {
    let product = |name, description, price, stock_quantity, category, is_recommended| SeedProduct {
        name,
        description,
        price,
        stock_quantity,
        category,
        is_recommended,
    };
    vec![
        product("iPhone 13 Pro", "Latest Apple iPhone with advanced camera system", dec!(999.99), 50, "Electronics", true),
        product("Samsung Galaxy S21", "Powerful Android smartphone with amazing display", dec!(899.99), 45, "Electronics", true),
        product("MacBook Pro M1", "High-performance laptop with M1 chip", dec!(1299.99), 30, "Electronics", false),
        product("Nike Air Max", "Comfortable running shoes with air cushioning", dec!(129.99), 100, "Clothing", true),
        product("Adidas T-Shirt", "Classic cotton t-shirt with Adidas logo", dec!(29.99), 200, "Clothing", false),
        product("Levi's 501 Jeans", "Classic straight-leg jeans", dec!(59.99), 75, "Clothing", true),
        product("The Great Gatsby", "Classic novel by F. Scott Fitzgerald", dec!(14.99), 50, "Books", true),
        product("To Kill a Mockingbird", "Harper Lee's masterpiece", dec!(12.99), 40, "Books", false),
        product("1984", "George Orwell's dystopian classic", dec!(9.99), 60, "Books", true),
        product("Modern Sofa", "Comfortable 3-seater sofa", dec!(799.99), 10, "Home & Garden", true),
        product("Garden Tool Set", "Complete set of gardening tools", dec!(49.99), 25, "Home & Garden", false),
        product("Smart LED Bulbs", "WiFi-enabled LED light bulbs", dec!(39.99), 100, "Home & Garden", true),
    ]
}

#[derive(Clone)]
pub struct SeedService {
    db: Arc<DatabaseConnection>,
}

impl SeedService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Populates the demo catalog unless any category or attribute exists.
    #[instrument(skip(self))]
    pub async fn seed(&self) -> Result<SeedReport, ServiceError> {
        let start = std::time::Instant::now();
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let has_data = category::Entity::find().count(&txn).await? > 0
            || category_attribute::Entity::find().count(&txn).await? > 0;

        let seeded = if has_data {
            info!("Catalog already has data; skipping seed");
            false
        } else {
            populate(&txn).await?;
            true
        };

        let counts = catalog_counts(&txn).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("catalog_seed.runs", 1, "mode" => "seed");
        histogram!("catalog_seed.duration", start.elapsed());
        info!(seeded, ?counts, "Seed finished");

        Ok(SeedReport {
            message: "Database seeded successfully".to_string(),
            seeded,
            counts,
        })
    }

    /// Deletes every catalog row, then populates the demo catalog.
    #[instrument(skip(self))]
    pub async fn reseed(&self) -> Result<SeedReport, ServiceError> {
        let start = std::time::Instant::now();
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        clear(&txn).await?;
        populate(&txn).await?;

        let counts = catalog_counts(&txn).await?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("catalog_seed.runs", 1, "mode" => "reseed");
        histogram!("catalog_seed.duration", start.elapsed());
        info!(?counts, "Reseed finished");

        Ok(SeedReport {
            message: "Database reseeded successfully".to_string(),
            seeded: true,
            counts,
        })
    }

    pub async fn counts(&self) -> Result<CatalogCounts, ServiceError> {
        catalog_counts(&*self.db).await
    }
}

pub async fn catalog_counts<C: ConnectionTrait>(db: &C) -> Result<CatalogCounts, ServiceError> {
    Ok(CatalogCounts {
        categories: category::Entity::find().count(db).await?,
        attributes: category_attribute::Entity::find().count(db).await?,
        attribute_values: attribute_value::Entity::find().count(db).await?,
        products: product::Entity::find().count(db).await?,
        product_attribute_values: product_attribute_value::Entity::find().count(db).await?,
        category_attribute_links: category_attribute_category::Entity::find().count(db).await?,
    })
}

/// Dependency order: links, values, attributes, products, categories.
async fn clear<C: ConnectionTrait>(db: &C) -> Result<(), ServiceError> {
    let links = product_attribute_value::Entity::delete_many().exec(db).await?;
    let values = attribute_value::Entity::delete_many().exec(db).await?;
    category_attribute_category::Entity::delete_many().exec(db).await?;
    let attributes = category_attribute::Entity::delete_many().exec(db).await?;
    let products = product::Entity::delete_many().exec(db).await?;
    let categories = category::Entity::delete_many().exec(db).await?;

    info!(
        links = links.rows_affected,
        values = values.rows_affected,
        attributes = attributes.rows_affected,
        products = products.rows_affected,
        categories = categories.rows_affected,
        "Cleared catalog"
    );
    Ok(())
}

async fn populate<C: ConnectionTrait>(db: &C) -> Result<(), ServiceError> {
    let mut category_ids = HashMap::new();
    for (name, description, _) in CATEGORIES {
        let created = category::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;
        category_ids.insert(name, created.id);
    }

    let mut attribute_ids = HashMap::new();
    for (name, description) in ATTRIBUTES {
        let created = category_attribute::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            ..Default::default()
        }
        .insert(db)
        .await?;
        attribute_ids.insert(name, created.id);
    }

    let mut join_rows = Vec::new();
    for (category_name, _, specific) in CATEGORIES {
        let category_id = lookup(&category_ids, category_name)?;
        for attribute_name in COMMON_ATTRIBUTES.iter().chain(specific.iter()) {
            join_rows.push(category_attribute_category::ActiveModel {
                category_id: Set(category_id),
                category_attribute_id: Set(lookup(&attribute_ids, attribute_name)?),
            });
        }
    }
    category_attribute_category::Entity::insert_many(join_rows)
        .exec(db)
        .await?;

    let mut value_ids = HashMap::new();
    for (attribute_name, values) in ATTRIBUTE_VALUES {
        let attribute_id = lookup(&attribute_ids, attribute_name)?;
        for value in values {
            let created = attribute_value::ActiveModel {
                value: Set(value.to_string()),
                category_attribute_id: Set(attribute_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
            value_ids.insert((attribute_name, value), created.id);
        }
    }

    let mut product_ids = HashMap::new();
    for seed in seed_products() {
        let created = product::ActiveModel {
            name: Set(seed.name.to_string()),
            description: Set(Some(seed.description.to_string())),
            price: Set(seed.price),
            stock_quantity: Set(seed.stock_quantity),
            category_id: Set(lookup(&category_ids, seed.category)?),
            image_base64: Set(Some(PLACEHOLDER_IMAGE_BASE64.to_string())),
            image_content_type: Set(Some(PLACEHOLDER_IMAGE_CONTENT_TYPE.to_string())),
            is_recommended: Set(seed.is_recommended),
            ..Default::default()
        }
        .insert(db)
        .await?;
        product_ids.insert(seed.name, created.id);
    }

    let mut links = Vec::with_capacity(PRODUCT_LINKS.len());
    for (product_name, attribute_name, value) in PRODUCT_LINKS {
        let attribute_value_id = value_ids
            .get(&(attribute_name, value))
            .copied()
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "seed value {}={} is not defined",
                    attribute_name, value
                ))
            })?;
        links.push(product_attribute_value::ActiveModel {
            product_id: Set(lookup(&product_ids, product_name)?),
            attribute_value_id: Set(attribute_value_id),
        });
    }
    product_attribute_value::Entity::insert_many(links)
        .exec(db)
        .await?;

    Ok(())
}

fn lookup(ids: &HashMap<&'static str, i32>, name: &str) -> Result<i32, ServiceError> {
    ids.get(name)
        .copied()
        .ok_or_else(|| ServiceError::InternalError(format!("seed entry {} is not defined", name)))
}
