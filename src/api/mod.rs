use crate::api::error::ApiError;
use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use validator::Validate;

pub mod conversations;
pub mod error;
pub mod messages;
pub mod questions;

/// All endpoints, without DI provider or middleware attached.
pub fn router() -> Router {
    Router::new()
        .nest("/questions", questions::router())
        .nest("/conversation", conversations::router())
        .nest("/message", messages::router())
}

/// JSON body that has been deserialized and passed its `Validate` rules.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
