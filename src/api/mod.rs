pub mod extract;
pub mod public;
pub mod session;

use axum::{middleware::from_fn, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::middleware::logging::logging_middleware;
use public::public_api_router;
use session::session_api_router;

pub fn create_api_router(shared_db: Arc<DatabaseConnection>) -> Router {
    let api = Router::new()
        .merge(public_api_router(shared_db.clone()))
        .merge(session_api_router(shared_db));

    Router::new()
        .nest("/api", api)
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
