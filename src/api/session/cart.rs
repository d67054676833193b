use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::extract::ValidatedJson;
use crate::middleware::{
    logging::{to_response, ApiError},
    session::Session,
};
use crate::services::cart;

//ROUTERS
pub fn cart_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/cart", get(get_cart).post(add_product))
        .route("/cart/:id", put(update_entry).delete(remove_product))
        .layer(Extension(db))
}

//Routes
async fn get_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<Session>,
) -> Response {
    match cart::list(&db, session.id()).await {
        Ok(cart) => to_response(Json(cart), Ok(())),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn add_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<Session>,
    ValidatedJson(payload): ValidatedJson<AddProduct>,
) -> Response {
    match cart::add_item(&db, session.id(), payload.product_id, payload.quantity).await {
        Ok(()) => success(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn update_entry(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<Session>,
    ValidatedJson(payload): ValidatedJson<UpdateEntry>,
) -> Response {
    match cart::set_quantity(&db, session.id(), id, payload.quantity).await {
        Ok(()) => success(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn remove_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<Session>,
) -> Response {
    match cart::remove_item(&db, session.id(), id).await {
        Ok(()) => success(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn success() -> Response {
    to_response((StatusCode::OK, Json(json!({ "success": true }))), Ok(()))
}

//Structs
#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
struct AddProduct {
    product_id: i32,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 10_000, message = "Quantity should be between 1 and 10000"))]
    quantity: i32,
}

#[derive(Deserialize, Debug, Validate)]
struct UpdateEntry {
    #[validate(range(min = 0, max = 10_000, message = "Quantity should be between 0 and 10000"))]
    quantity: i32,
}

fn default_quantity() -> i32 {
    1
}
