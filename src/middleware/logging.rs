use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::services::StoreError;

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();
    match response.extensions().get::<Result<(), ApiError>>() {
        Some(Ok(_)) => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
        Some(Err(value)) if status.is_server_error() => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value,
            "Failed to process request"
        ),
        Some(Err(value)) => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value,
            "Rejected request"
        ),
        None => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request without logged data"
        ),
    }

    response
}

#[derive(Clone, Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    DbError(String),
    #[error("Failed to validate: {0}")]
    ValidationFail(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationFail(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Storage details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::ValidationFail(value) | ApiError::NotFound(value) => value.clone(),
            ApiError::DbError(_) => "Internal server error".to_owned(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(value) => ApiError::ValidationFail(value),
            StoreError::NotFound(value) => ApiError::NotFound(value),
            StoreError::Storage(err) => ApiError::DbError(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.public_message()
        }));
        to_response((self.status(), body), Err(self))
    }
}

pub fn to_response<T: IntoResponse>(
    response: T,               //The response that we are sending + StatusCode
    ext: Result<(), ApiError>, //The extension, that we want to give logging middleware
) -> Response {
    let mut response = response.into_response();

    response.extensions_mut().insert(ext);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn store_errors_map_to_statuses() {
        let validation: ApiError = StoreError::Validation("bad".to_owned()).into();
        let missing: ApiError = StoreError::NotFound("gone".to_owned()).into();
        let storage: ApiError = StoreError::Storage(DbErr::Custom("disk".to_owned())).into();

        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.public_message(), "Internal server error");
        assert_eq!(missing.public_message(), "gone");
    }

    #[test]
    fn error_response_carries_log_extension() {
        let response = ApiError::NotFound("Product not found".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(matches!(
            response.extensions().get::<Result<(), ApiError>>(),
            Some(Err(ApiError::NotFound(_)))
        ));
    }
}
