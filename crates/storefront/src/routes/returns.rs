//! JLO return routes that are not tied to one order.

use axum::{
    Json,
    extract::{Path, State},
};
use osun_core::{CustomerId, OrderId};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery, TrustedCustomer};
use crate::response::ApiResponse;
use crate::services::jlo::{self, ReturnsFilter};
use crate::services::upstream;
use crate::state::AppState;

/// Filters for `GET /api/returns`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReturnsQuery {
    pub wc_customer_id: Option<CustomerId>,
    pub order_id: Option<OrderId>,
}

/// List returns by customer or order.
///
/// GET /api/returns
///
/// Without a `wc_customer_id` parameter the trusted customer header is used.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    TrustedCustomer(customer): TrustedCustomer,
    ApiQuery(query): ApiQuery<ReturnsQuery>,
) -> Result<Json<ApiResponse<Vec<Value>>>> {
    let filter = ReturnsFilter {
        wc_customer_id: query.wc_customer_id.or(customer),
        order_id: query.order_id,
    };
    if filter.wc_customer_id.is_none() && filter.order_id.is_none() {
        return Err(AppError::Validation(
            "wc_customer_id or order_id is required".to_string(),
        ));
    }

    let body = state.jlo()?.list_returns(filter).await?;
    Ok(ApiResponse::data(jlo::returns_list(body)))
}

/// Register a return with JLO as-is.
///
/// POST /api/returns
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<ApiResponse<Value>>> {
    if !body.is_object() {
        return Err(AppError::Validation("Request body must be an object".to_string()));
    }
    let created = state.jlo()?.create_return(&body).await?;
    Ok(ApiResponse::data(upstream::unwrap_data(created)))
}

/// Tracking timeline for a JLO return.
///
/// GET /api/returns/{id}/tracking
#[instrument(skip_all, fields(return_id = %return_id))]
pub async fn tracking(
    State(state): State<AppState>,
    Path(return_id): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let tracking = state.jlo()?.return_tracking(&return_id).await?;
    Ok(ApiResponse::data(upstream::unwrap_data(tracking)))
}

/// Push a carrier tracking update to JLO.
///
/// POST /api/return-shipments/{id}/tracking
#[instrument(skip_all, fields(shipment_id = %shipment_id))]
pub async fn update_shipment_tracking(
    State(state): State<AppState>,
    Path(shipment_id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<ApiResponse<Value>>> {
    let updated = state
        .jlo()?
        .update_shipment_tracking(&shipment_id, &body)
        .await?;
    Ok(ApiResponse::data(upstream::unwrap_data(updated)))
}
