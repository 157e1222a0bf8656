/// Body extractors whose rejections use the service error envelope
use crate::error::SeekerError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header,
    Form, Json,
};
use serde::de::DeserializeOwned;

/// JSON body; malformed input becomes a 400 validation error
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SeekerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| invalid_body(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Body sent either as JSON or as a urlencoded form, chosen by Content-Type
#[derive(Debug)]
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SeekerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| invalid_body(e.body_text()))?;
            return Ok(Self(value));
        }

        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| invalid_body(e.body_text()))?;
        Ok(Self(value))
    }
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

fn invalid_body(detail: String) -> SeekerError {
    tracing::debug!(detail = %detail, "request body rejected");
    SeekerError::Validation("Invalid request body".to_string())
}
