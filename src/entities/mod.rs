pub mod cart_item;
pub mod category;
pub mod product;
pub mod product_image;

use chrono::Utc;
use sea_orm::{
    sea_query::Index, ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Schema, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::entities::{
    cart_item::Entity as CartItem,
    category::Entity as Category,
    product::Entity as Product,
    product_image::Entity as ProductImage,
};

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Creates every table (parents first) plus the cart line uniqueness index.
/// Safe to run against an existing database.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(Category).if_not_exists().to_owned(),
        schema.create_table_from_entity(Product).if_not_exists().to_owned(),
        schema.create_table_from_entity(ProductImage).if_not_exists().to_owned(),
        schema.create_table_from_entity(CartItem).if_not_exists().to_owned(),
    ];
    for table in tables.iter() {
        db.execute(backend.build(table)).await?;
    }

    let indexes = schema
        .create_index_from_entity(Product)
        .into_iter()
        .chain(schema.create_index_from_entity(ProductImage))
        .chain(schema.create_index_from_entity(CartItem));
    for mut index in indexes {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    let cart_line = Index::create()
        .name("idx-cart_items-session_product")
        .table(CartItem)
        .col(cart_item::Column::SessionId)
        .col(cart_item::Column::ProductId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&cart_line)).await?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed seed file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Category slug.
    pub category: Option<String>,
    pub scale: Option<String>,
    pub material: Option<String>,
    pub manufacturer: Option<String>,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub is_in_stock: Option<bool>,
    #[serde(default)]
    pub images: Vec<ImageSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ImageSeed {
    pub image_url: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub is_primary: bool,
}

impl CatalogSeed {
    pub fn builtin() -> Result<Self, SeedError> {
        Ok(serde_json::from_str(BUILTIN_CATALOG)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Loads the seed into an empty catalog. Returns `false` without touching
/// anything when categories already exist.
pub async fn seed_catalog(db: &DatabaseConnection, seed: &CatalogSeed) -> Result<bool, SeedError> {
    if Category::find().count(db).await? > 0 {
        info!("Catalog already populated, skipping seed");
        return Ok(false);
    }

    let now = Utc::now();
    let txn = db.begin().await?;

    let mut slugs: HashMap<&str, i32> = HashMap::new();
    for entry in &seed.categories {
        let created = category::ActiveModel {
            name: Set(entry.name.clone()),
            slug: Set(entry.slug.clone()),
            description: Set(entry.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        slugs.insert(entry.slug.as_str(), created.id);
    }

    for entry in &seed.products {
        let category_id = match entry.category.as_deref() {
            Some(slug) => {
                let id = slugs.get(slug).copied();
                if id.is_none() {
                    warn!(product = %entry.name, slug, "Seed product references unknown category");
                }
                id
            }
            None => None,
        };

        let created = product::ActiveModel {
            name: Set(entry.name.clone()),
            description: Set(entry.description.clone()),
            price: Set(entry.price),
            image_url: Set(entry.image_url.clone()),
            category_id: Set(category_id),
            scale: Set(entry.scale.clone()),
            material: Set(entry.material.clone()),
            manufacturer: Set(entry.manufacturer.clone()),
            stock_quantity: Set(entry.stock_quantity),
            is_in_stock: Set(entry.is_in_stock.unwrap_or(entry.stock_quantity > 0)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for image in &entry.images {
            product_image::ActiveModel {
                product_id: Set(created.id),
                image_url: Set(image.image_url.clone()),
                display_order: Set(image.display_order),
                is_primary: Set(image.is_primary),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Seeded catalog"
    );
    Ok(true)
}
