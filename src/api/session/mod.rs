pub mod cart;

use axum::{middleware::from_fn, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::middleware::session::session_middleware;
use cart::cart_router;

pub fn session_api_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .merge(cart_router(db))
        .layer(from_fn(session_middleware))
}
