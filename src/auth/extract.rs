//! Admin request extractor
//!
//! Reads the JSON body loosely, verifies its `password` field, and only then
//! deserializes the payload, so an unauthorized caller never learns anything
//! about the expected request shape.

use crate::error::{validation_error, AppError};
use crate::state::SharedState;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;

/// JSON body of an authorized admin request
pub struct AdminJson<T>(pub T);

/// Admin request whose body carries nothing but the password
pub type AdminOnly = AdminJson<IgnoredAny>;

impl<T> FromRequest<SharedState> for AdminJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &SharedState) -> Result<Self, Self::Rejection> {
        // A body that is not JSON carries no password either
        let body = match Json::<Value>::from_request(req, state).await {
            Ok(Json(body)) => body,
            Err(_) => Value::Null,
        };

        state
            .admin
            .verify(body.get("password").and_then(Value::as_str))?;

        serde_json::from_value(body)
            .map(AdminJson)
            .map_err(|e| validation_error(format!("Invalid request body: {}", e)))
    }
}
