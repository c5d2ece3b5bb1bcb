//! Success envelopes shared by the JSON routes.

use axum::Json;
use serde::Serialize;

/// `{success: true, message?, data?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub const fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

/// `{success: true, ...fields}` for routes whose result sits at the top level.
#[derive(Debug, Serialize)]
pub struct Flattened<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Flattened<T> {
    pub const fn ok(body: T) -> Json<Self> {
        Json(Self {
            success: true,
            body,
        })
    }
}
