//! JSON body extractor whose rejections use the crate's error envelope.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// Like `axum::Json`, but malformed or mistyped bodies become 400 `bad_request`.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

impl<T: DeserializeOwned> Payload<T> {
    /// Decode a body that was read as raw bytes, for handlers that check
    /// object permissions before looking at the body.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AppError> {
        Json::<T>::from_bytes(bytes)
            .map(|Json(value)| Payload(value))
            .map_err(rejection_to_error)
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}
