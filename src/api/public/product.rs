use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware::logging::{to_response, ApiError};
use crate::services::catalog::{self, ProductFilter};

pub fn product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/products/latest", get(get_latest_products))
        .route("/products/facets", get(get_facets))
        .route("/products/:id", get(get_product))
        .route("/products/:id/recommendations", get(get_recommendations))
        .layer(Extension(db))
}

async fn get_products(
    Query(filter): Query<ProductFilter>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match catalog::list_products(&db, &filter).await {
        Ok(products) => to_response(Json(products), Ok(())),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_latest_products(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match catalog::latest_products(&db).await {
        Ok(products) => to_response(Json(products), Ok(())),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_facets(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match catalog::facets(&db).await {
        Ok(facets) => to_response(Json(facets), Ok(())),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match catalog::product_detail(&db, id).await {
        Ok(product) => to_response(Json(product), Ok(())),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn get_recommendations(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match catalog::recommendations(&db, id).await {
        Ok(products) => to_response(Json(products), Ok(())),
        Err(err) => ApiError::from(err).into_response(),
    }
}
