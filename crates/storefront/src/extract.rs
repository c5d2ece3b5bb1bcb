//! Request extractors that reject with [`AppError`].
//!
//! Axum's built-in rejections render as plain text; these keep every failure
//! inside the JSON error envelope.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use osun_core::{CustomerId, OrderId};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Header carrying the customer id, set by the trusted front-end proxy.
pub const CUSTOMER_HEADER: &str = "x-wc-customer-id";

/// JSON request body. An empty body is read as `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e.body_text())))?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(body)
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
    }
}

/// Query string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|e| AppError::Validation(format!("Invalid query string: {}", e.body_text())))
    }
}

/// The `{id}` path segment of an order-scoped route.
#[derive(Debug, Clone, Copy)]
pub struct OrderIdPath(pub OrderId);

impl<S> FromRequestParts<S> for OrderIdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::InvalidOrderId)?;

        OrderId::parse(raw.trim())
            .map(Self)
            .map_err(|_| AppError::InvalidOrderId)
    }
}

/// Customer id from [`CUSTOMER_HEADER`], if the proxy sent one.
#[derive(Debug, Clone, Copy)]
pub struct TrustedCustomer(pub Option<CustomerId>);

impl TrustedCustomer {
    /// The customer id, or a validation error naming the missing header.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when the header was absent.
    pub fn required(self) -> Result<CustomerId, AppError> {
        self.0
            .ok_or_else(|| AppError::Validation(format!("{CUSTOMER_HEADER} header is required")))
    }
}

impl<S> FromRequestParts<S> for TrustedCustomer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(CUSTOMER_HEADER) else {
            return Ok(Self(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|v| CustomerId::parse(v.trim()).ok())
            .map(|id| Self(Some(id)))
            .ok_or_else(|| AppError::Validation(format!("Invalid {CUSTOMER_HEADER} header")))
    }
}
