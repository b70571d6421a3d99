//! JSON body extractor that reports rejections in the API envelope.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};

use crate::error::{GatewayError, ValidationError};

/// Like [`axum::Json`], but a rejected body becomes
/// [`ValidationError::MalformedBody`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))?;
        Ok(Self(value))
    }
}
