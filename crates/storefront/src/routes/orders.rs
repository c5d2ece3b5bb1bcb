//! Order-scoped return and refund routes.
//!
//! Every handler validates its input before asking for the upstream clients,
//! so a bad request is a 400 even when an upstream is not configured.

use axum::{Json, extract::State};
use osun_core::meta::RefundRequestRecord;
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::extract::{ApiJson, ApiQuery, OrderIdPath, TrustedCustomer};
use crate::response::{ApiResponse, Flattened};
use crate::services::returns::{
    ApproveRefundInput, ApproveReturnInput, ApprovedRefund, ApprovedReturn, CreatedShipment,
    OrderSummary, OrderWithReturns, RefundRequestInput, ReturnRequestInput, ReturnShipmentInput,
    SubmittedReturn, SyncedReturn,
};
use crate::state::AppState;

/// Default page size for the order history.
const DEFAULT_PER_PAGE: u32 = 10;

/// Submit a return request to JLO.
///
/// POST /api/orders/{id}/return-request
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn submit_return(
    State(state): State<AppState>,
    OrderIdPath(order_id): OrderIdPath,
    ApiJson(input): ApiJson<ReturnRequestInput>,
) -> Result<Json<Flattened<SubmittedReturn>>> {
    let request = input.validate()?;
    let submitted = state.returns()?.submit_return(order_id, request).await?;
    Ok(Flattened::ok(submitted))
}

/// Approve a return and refund it.
///
/// POST /api/orders/{id}/return-request/approve
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn approve_return(
    State(state): State<AppState>,
    OrderIdPath(order_id): OrderIdPath,
    ApiJson(input): ApiJson<ApproveReturnInput>,
) -> Result<Json<ApiResponse<ApprovedReturn>>> {
    let approval = input.validate()?;
    let approved = state.returns()?.approve_return(order_id, approval).await?;
    let message = if approved.refund.is_some() {
        "Return approved and refund created"
    } else {
        "Return approved"
    };
    Ok(ApiResponse::with_message(message, approved))
}

/// Pull the latest JLO return (status and requested items) into the order.
///
/// POST /api/orders/{id}/return-request/sync
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn sync_return_status(
    State(state): State<AppState>,
    OrderIdPath(order_id): OrderIdPath,
) -> Result<Json<ApiResponse<SyncedReturn>>> {
    let synced = state.returns()?.sync_return_status(order_id).await?;
    Ok(ApiResponse::data(synced))
}

/// Record a customer refund request.
///
/// POST /api/orders/{id}/refund-request
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn submit_refund(
    State(state): State<AppState>,
    OrderIdPath(order_id): OrderIdPath,
    ApiJson(input): ApiJson<RefundRequestInput>,
) -> Result<Json<ApiResponse<RefundRequestRecord>>> {
    let request = input.validate()?;
    let record = state
        .returns()?
        .submit_refund_request(order_id, request)
        .await?;
    Ok(ApiResponse::with_message("Refund request submitted", record))
}

/// Approve a refund request and create the refund.
///
/// POST /api/orders/{id}/refund-request/approve
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn approve_refund(
    State(state): State<AppState>,
    OrderIdPath(order_id): OrderIdPath,
    ApiJson(input): ApiJson<ApproveRefundInput>,
) -> Result<Json<ApiResponse<ApprovedRefund>>> {
    let approval = input.validate()?;
    let approved = state.returns()?.approve_refund(order_id, approval).await?;
    Ok(ApiResponse::with_message("Refund processed", approved))
}

/// Create a return shipment (pickup or drop-off).
///
/// POST /api/orders/{id}/return-shipment
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn create_return_shipment(
    State(state): State<AppState>,
    OrderIdPath(order_id): OrderIdPath,
    ApiJson(input): ApiJson<ReturnShipmentInput>,
) -> Result<Json<Flattened<CreatedShipment>>> {
    let shipment = input.validate()?;
    let created = state
        .returns()?
        .create_return_shipment(order_id, shipment)
        .await?;
    Ok(Flattened::ok(created))
}

/// Order detail with its JLO returns.
///
/// GET /api/orders/{id}
#[instrument(skip_all, fields(order_id = %order_id))]
pub async fn show(
    State(state): State<AppState>,
    OrderIdPath(order_id): OrderIdPath,
    TrustedCustomer(customer): TrustedCustomer,
) -> Result<Json<ApiResponse<OrderWithReturns>>> {
    let order = state
        .returns()?
        .order_with_returns(order_id, customer)
        .await?;
    Ok(ApiResponse::data(order))
}

/// Paging for the order history.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrdersQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Order history for the customer named by the trusted header.
///
/// GET /api/orders
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    customer: TrustedCustomer,
    ApiQuery(query): ApiQuery<OrdersQuery>,
) -> Result<Json<ApiResponse<Vec<OrderSummary>>>> {
    let customer = customer.required()?;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);

    let orders = state
        .returns()?
        .customer_orders(customer, page, per_page)
        .await?;
    Ok(ApiResponse::data(orders))
}
