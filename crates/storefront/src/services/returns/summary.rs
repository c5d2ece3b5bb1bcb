//! Front-end projection of an order.

use osun_core::meta::{
    REFUND_REQUEST_STATUS_KEY, RETURN_REQUEST_STATUS_KEY, RefundRequestRecord,
    ReturnRequestRecord, ReturnShipmentRecord,
};
use osun_core::{OrderId, RequestStatus, ReturnCode};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::services::woocommerce::Order;

/// Order fields the storefront account pages need, plus workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: String,
    pub total: Decimal,
    pub currency: String,
    pub date_created: Option<String>,
    pub item_count: u32,
    pub return_status: Option<RequestStatus>,
    pub refund_status: Option<RequestStatus>,
    pub return_code: Option<ReturnCode>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        // The plain status mirror wins; fall back to the record for orders
        // written before the mirror existed.
        let return_status = order.status_meta(RETURN_REQUEST_STATUS_KEY).or_else(|| {
            order
                .document_or_warn::<ReturnRequestRecord>()
                .map(|record| record.status)
        });
        let refund_status = order.status_meta(REFUND_REQUEST_STATUS_KEY).or_else(|| {
            order
                .document_or_warn::<RefundRequestRecord>()
                .map(|record| record.status)
        });

        Self {
            id: order.id,
            status: order.status.clone(),
            total: order.total,
            currency: order.currency.clone(),
            date_created: order.date_created.clone(),
            item_count: order.line_items.iter().map(|line| line.quantity).sum(),
            return_status,
            refund_status,
            return_code: order
                .document_or_warn::<ReturnShipmentRecord>()
                .map(|shipment| shipment.return_code),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_summary_reads_workflow_state() {
        let order: Order = serde_json::from_value(json!({
            "id": 500,
            "status": "completed",
            "currency": "NGN",
            "total": "15000.00",
            "line_items": [
                { "id": 11, "quantity": 2, "total": "9000" },
                { "id": 12, "quantity": 1, "total": "6000" }
            ],
            "meta_data": [
                { "key": "_refund_request", "value": "{\"status\":\"processed\",\"reason\":\"late\"}" },
                { "key": "_return_shipment", "value": "{\"method\":\"dropoff\",\"return_code\":\"RTN-ABC123\"}" }
            ]
        }))
        .unwrap();

        let summary = OrderSummary::from(&order);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.return_status, None);
        assert_eq!(summary.refund_status, Some(RequestStatus::Processed));
        assert_eq!(summary.return_code.unwrap().as_str(), "RTN-ABC123");
    }
}
