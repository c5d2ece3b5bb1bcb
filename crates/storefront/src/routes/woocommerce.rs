//! Generic WooCommerce REST proxy.
//!
//! Exposes a fixed set of resources so the front end can read products and
//! orders without holding API keys.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::Method,
};
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::services::upstream;
use crate::services::woocommerce::proxy_path_allowed;
use crate::state::AppState;

/// Forward a request to `/wp-json/wc/v3/{path}`.
///
/// GET/POST/PUT /api/wc/{*path}
#[instrument(skip_all, fields(method = %method, path = %path))]
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<ApiResponse<Value>>> {
    if !proxy_path_allowed(&path) {
        return Err(AppError::NotFound(format!("Unknown WooCommerce resource: {path}")));
    }

    let body = (method != Method::GET).then_some(body);
    let response = state
        .woocommerce()?
        .proxy(method, &path, query.as_deref(), body)
        .await?;
    Ok(ApiResponse::data(upstream::unwrap_data(response)))
}
