use axum::{extract::Extension, response::{IntoResponse, Response}, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware::logging::{to_response, ApiError};
use crate::services::catalog;

pub fn category_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .layer(Extension(db))
}

async fn get_categories(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match catalog::list_categories(&db).await {
        Ok(categories) => to_response(Json(categories), Ok(())),
        Err(err) => ApiError::from(err).into_response(),
    }
}
