// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

use storefront::api::create_api_router;
use storefront::entities::{category, product, product_image, setup_schema};

pub struct TestApp {
    pub address: String,
    pub db: Arc<DatabaseConnection>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Fresh SQLite file per call, so tests never share rows.
pub async fn test_db() -> DatabaseConnection {
    let path = std::env::temp_dir().join(format!("storefront-test-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = Database::connect(&url)
        .await
        .expect("Failed to connect test database");
    setup_schema(&db).await.expect("Failed to create schema");
    db
}

/// Serves the full router on an ephemeral port.
pub async fn spawn_app() -> TestApp {
    let db = Arc::new(test_db().await);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = format!("http://{}", listener.local_addr().unwrap());

    let app = create_api_router(db.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    TestApp {
        address,
        db,
        client: reqwest::Client::new(),
    }
}

pub async fn insert_category(db: &DatabaseConnection, name: &str, slug: &str) -> category::Model {
    let now = Utc::now();
    category::ActiveModel {
        name: Set(name.to_owned()),
        slug: Set(slug.to_owned()),
        description: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert category")
}

pub async fn insert_image(
    db: &DatabaseConnection,
    product_id: i32,
    image_url: &str,
    display_order: i32,
    is_primary: bool,
) -> product_image::Model {
    let now = Utc::now();
    product_image::ActiveModel {
        product_id: Set(product_id),
        image_url: Set(image_url.to_owned()),
        display_order: Set(display_order),
        is_primary: Set(is_primary),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert image")
}

pub struct ProductFixture {
    name: String,
    price: f64,
    description: Option<String>,
    category_id: Option<i32>,
    scale: Option<String>,
    material: Option<String>,
    stock_quantity: i32,
    is_in_stock: bool,
    age_minutes: i64,
}

impl ProductFixture {
    pub fn new(name: &str, price: f64) -> Self {
        Self {
            name: name.to_owned(),
            price,
            description: None,
            category_id: None,
            scale: None,
            material: None,
            stock_quantity: 10,
            is_in_stock: true,
            age_minutes: 0,
        }
    }

    pub fn description(mut self, value: &str) -> Self {
        self.description = Some(value.to_owned());
        self
    }

    pub fn category(mut self, id: i32) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn scale(mut self, value: &str) -> Self {
        self.scale = Some(value.to_owned());
        self
    }

    pub fn material(mut self, value: &str) -> Self {
        self.material = Some(value.to_owned());
        self
    }

    pub fn out_of_stock(mut self) -> Self {
        self.stock_quantity = 0;
        self.is_in_stock = false;
        self
    }

    /// Backdates created_at so "newest first" ordering is predictable.
    pub fn created_minutes_ago(mut self, minutes: i64) -> Self {
        self.age_minutes = minutes;
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> product::Model {
        let created = Utc::now() - Duration::minutes(self.age_minutes);
        product::ActiveModel {
            name: Set(self.name),
            description: Set(self.description),
            price: Set(self.price),
            image_url: Set(None),
            category_id: Set(self.category_id),
            scale: Set(self.scale),
            material: Set(self.material),
            manufacturer: Set(None),
            stock_quantity: Set(self.stock_quantity),
            is_in_stock: Set(self.is_in_stock),
            created_at: Set(created),
            updated_at: Set(created),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to insert product")
    }
}
