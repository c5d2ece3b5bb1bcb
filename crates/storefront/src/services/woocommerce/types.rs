//! WooCommerce REST API v3 payloads.
//!
//! Only the fields this service reads are modelled. WooCommerce sends money as
//! strings (`"120.00"`) and occasionally as numbers (`price`), so every amount
//! goes through [`lenient_decimal`].

use osun_core::meta::{MetaDocument, MetaError};
use osun_core::{CustomerId, LineItemId, OrderId, RefundId, RequestStatus, parse_amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserialize a money field that may be a string, a number, empty or null.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(Decimal::ZERO),
        Value::String(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        _ => parse_amount(&value).map_err(serde::de::Error::custom),
    }
}

/// Deserialize a string field WooCommerce may send as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Orders
// =============================================================================

/// A WooCommerce order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Decimal,
    /// `0` for guest orders.
    #[serde(default)]
    pub customer_id: u64,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub billing: Address,
    #[serde(default)]
    pub shipping: Address,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub meta_data: Vec<MetaEntry>,
}

impl Order {
    /// The registered customer who placed the order, `None` for guests.
    #[must_use]
    pub const fn customer(&self) -> Option<CustomerId> {
        if self.customer_id == 0 {
            None
        } else {
            Some(CustomerId::new(self.customer_id))
        }
    }

    /// Raw value of a meta key. WooCommerce allows duplicate keys; the last wins.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta_data
            .iter()
            .rev()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    /// Decode a metadata record, `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError`] when the stored value cannot be decoded.
    pub fn document<T: MetaDocument>(&self) -> Result<Option<T>, MetaError> {
        self.meta(T::KEY).map(T::decode).transpose()
    }

    /// Decode a metadata record, logging and discarding undecodable values.
    #[must_use]
    pub fn document_or_warn<T: MetaDocument>(&self) -> Option<T> {
        match self.document::<T>() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(order_id = %self.id, key = T::KEY, error = %e, "Ignoring unreadable order metadata");
                None
            }
        }
    }

    /// A plain status mirror key such as `_return_request_status`.
    #[must_use]
    pub fn status_meta(&self, key: &str) -> Option<RequestStatus> {
        self.meta(key)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Look up a line item by id.
    #[must_use]
    pub fn line_item(&self, id: LineItemId) -> Option<&LineItem> {
        self.line_items.iter().find(|line| line.id == id)
    }
}

/// An order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub product_id: u64,
    #[serde(default)]
    pub variation_id: u64,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub subtotal: Decimal,
    /// Line total after discounts, excluding tax.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Decimal,
    #[serde(default)]
    pub sku: Option<String>,
}

impl LineItem {
    /// Per-unit price derived from the line total.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        if self.quantity == 0 {
            return Decimal::ZERO;
        }
        self.total / Decimal::from(self.quantity)
    }
}

/// Billing or shipping address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub company: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub address_1: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub address_2: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub postcode: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub country: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub phone: String,
}

impl Address {
    /// Whether the address has a street line.
    #[must_use]
    pub fn has_street(&self) -> bool {
        !self.address_1.trim().is_empty()
    }

    /// `"First Last"`, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Street lines joined with a comma.
    #[must_use]
    pub fn street(&self) -> String {
        [self.address_1.trim(), self.address_2.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One `meta_data` entry as returned by WooCommerce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// One `meta_data` entry to write. Existing keys are replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaUpdate {
    pub key: String,
    pub value: String,
}

impl MetaUpdate {
    /// Encode a metadata record under its key.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError`] if the record cannot be serialized.
    pub fn document<T: MetaDocument>(record: &T) -> Result<Self, MetaError> {
        Ok(Self {
            key: T::KEY.to_string(),
            value: record.encode()?,
        })
    }

    /// A plain status mirror.
    #[must_use]
    pub fn status(key: &str, status: RequestStatus) -> Self {
        Self {
            key: key.to_string(),
            value: status.as_str().to_string(),
        }
    }
}

// =============================================================================
// Refunds and notes
// =============================================================================

/// Body for `POST /orders/{id}/refunds`.
#[derive(Debug, Clone, Serialize)]
pub struct RefundCreate {
    /// Two-decimal amount string.
    pub amount: String,
    pub reason: String,
    pub restock_items: bool,
    /// Push the refund to the payment gateway.
    pub api_refund: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<RefundLineCreate>,
}

/// A refunded line inside [`RefundCreate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundLineCreate {
    pub id: LineItemId,
    pub quantity: u32,
    pub refund_total: String,
}

/// A refund as returned by WooCommerce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: RefundId,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
    #[serde(default)]
    pub date_created: Option<String>,
}

/// An order note as returned by WooCommerce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNote {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
    #[serde(default)]
    pub customer_note: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use osun_core::meta::{RETURN_REQUEST_KEY, ReturnRequestRecord};
    use serde_json::json;

    use super::*;

    fn sample_order() -> Order {
        serde_json::from_value(json!({
            "id": 500,
            "status": "completed",
            "currency": "NGN",
            "total": "15000.00",
            "customer_id": 12,
            "billing": { "first_name": "Ada", "last_name": "Obi", "email": "ada@example.ng", "phone": "0803", "address_1": "" },
            "shipping": { "first_name": "Ada", "last_name": "Obi", "address_1": "4 Broad St", "address_2": null, "city": "Lagos", "state": "LA" },
            "line_items": [
                { "id": 11, "name": "Adire shirt", "product_id": 90, "quantity": 2, "subtotal": "10000.00", "total": "9000.00", "price": 4500 },
                { "id": 12, "name": "Cap", "product_id": 91, "quantity": 1, "subtotal": "6000", "total": "6000", "price": "" }
            ],
            "meta_data": [
                { "id": 1, "key": "_return_request", "value": "{\"status\":\"pending\"}" },
                { "id": 2, "key": "_return_request_status", "value": "pending" },
                { "id": 3, "key": "_return_request_status", "value": "processed" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_order_deserializes_woocommerce_shapes() {
        let order = sample_order();
        assert_eq!(order.total, Decimal::from(15000));
        assert_eq!(order.customer(), Some(CustomerId::new(12)));
        assert_eq!(order.line_items[0].price, Decimal::from(4500));
        assert_eq!(order.line_items[1].price, Decimal::ZERO);
        assert_eq!(order.shipping.address_2, "");
        assert_eq!(order.shipping.full_name(), "Ada Obi");
        assert_eq!(order.shipping.street(), "4 Broad St");
    }

    #[test]
    fn test_guest_order_has_no_customer() {
        let order: Order = serde_json::from_value(json!({ "id": 1, "customer_id": 0 })).unwrap();
        assert_eq!(order.customer(), None);
        assert!(order.line_items.is_empty());
    }

    #[test]
    fn test_meta_lookup_prefers_last_entry() {
        let order = sample_order();
        assert_eq!(
            order.status_meta("_return_request_status"),
            Some(RequestStatus::Processed)
        );
        assert!(order.meta("_missing").is_none());
    }

    #[test]
    fn test_document_decoding() {
        let order = sample_order();
        let record = order.document::<ReturnRequestRecord>().unwrap().unwrap();
        assert_eq!(record.status, RequestStatus::Pending);

        let mut broken = sample_order();
        broken.meta_data[0].value = json!("{oops");
        assert!(broken.document::<ReturnRequestRecord>().is_err());
        assert!(broken.document_or_warn::<ReturnRequestRecord>().is_none());
    }

    #[test]
    fn test_unit_price() {
        let order = sample_order();
        let line = order.line_item(LineItemId::new(11)).unwrap();
        assert_eq!(line.unit_price(), Decimal::from_str("4500").unwrap());
    }

    #[test]
    fn test_meta_update_document() {
        let update = MetaUpdate::document(&ReturnRequestRecord::default()).unwrap();
        assert_eq!(update.key, RETURN_REQUEST_KEY);
        assert!(update.value.contains("return_request.v1"));

        let status = MetaUpdate::status("_refund_request_status", RequestStatus::Pending);
        assert_eq!(status.value, "pending");
    }

    #[test]
    fn test_refund_create_omits_empty_lines() {
        let body = RefundCreate {
            amount: "10.00".to_string(),
            reason: "Damaged".to_string(),
            restock_items: true,
            api_refund: false,
            line_items: Vec::new(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("line_items").is_none());
        assert_eq!(value["amount"], "10.00");
    }
}
