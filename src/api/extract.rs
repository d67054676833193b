use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::middleware::logging::ApiError;

/// JSON body that is deserialized and then checked against its `Validate`
/// rules. Either failure rejects with a 400 `{"error": ...}` body.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::ValidationFail(rejection.body_text()))?;
        value
            .validate()
            .map_err(|err| ApiError::ValidationFail(err.to_string()))?;
        Ok(ValidatedJson(value))
    }
}
