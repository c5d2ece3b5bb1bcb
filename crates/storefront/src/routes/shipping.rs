//! Shipping fee quotes.

use axum::{Json, extract::State};
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::services::upstream;
use crate::state::AppState;

/// Quote a JLO delivery fee.
///
/// POST /api/shipping/jlo
#[instrument(skip_all)]
pub async fn calculate_fee(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<ApiResponse<Value>>> {
    if body.as_object().is_none_or(serde_json::Map::is_empty) {
        return Err(AppError::Validation("Shipping details are required".to_string()));
    }
    let quote = state.jlo()?.calculate_shipping_fee(&body).await?;
    Ok(ApiResponse::data(upstream::unwrap_data(quote)))
}
