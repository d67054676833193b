pub mod cart;
pub mod catalog;

use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] DbErr),
}
