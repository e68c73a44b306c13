use crate::{errors::ServiceError, services::commerce::CartOwner, ApiResponse};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Serialize;
use uuid::Uuid;

/// Header naming the authenticated customer
pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
/// Header naming an anonymous visitor's session
pub const SESSION_KEY_HEADER: &str = "x-session-key";

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Standard no content response
pub fn no_content_response() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Who is calling, as asserted by the fronting layer.
///
/// The API trusts these headers; it never issues or verifies them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    pub customer_id: Option<Uuid>,
    pub session_key: Option<String>,
}

impl CallerIdentity {
    /// The cart this caller shops with. A customer id wins over a session key.
    pub fn cart_owner(&self) -> Result<CartOwner, ServiceError> {
        match (&self.customer_id, &self.session_key) {
            (Some(customer_id), _) => Ok(CartOwner::Customer(*customer_id)),
            (None, Some(session_key)) => Ok(CartOwner::Session(session_key.clone())),
            (None, None) => Err(ServiceError::Unauthorized(format!(
                "Either {} or {} is required",
                CUSTOMER_ID_HEADER, SESSION_KEY_HEADER
            ))),
        }
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer_id = header_value(parts, CUSTOMER_ID_HEADER)
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| {
                    ServiceError::InvalidInput(format!("{} must be a UUID", CUSTOMER_ID_HEADER))
                })
            })
            .transpose()?;
        let session_key = header_value(parts, SESSION_KEY_HEADER).map(str::to_string);

        Ok(Self {
            customer_id,
            session_key,
        })
    }
}
