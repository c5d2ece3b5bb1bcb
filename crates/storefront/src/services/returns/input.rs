//! Request bodies for the returns routes and their validation.
//!
//! Bodies are accepted leniently (snake_case or the camelCase the browser
//! sends, everything optional) and then checked field by field so every
//! failure gets a specific 400 message.

use osun_core::{
    AmountError, LineItemId, PreferredResolution, ReturnMethod, parse_amount,
    parse_positive_amount,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ReturnsError;

/// A person or place on either end of a return.
///
/// Every field is optional so callers can send partial overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// A line the customer wants to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ItemInput {
    #[serde(alias = "id", alias = "lineItemId")]
    pub line_item_id: LineItemId,
    /// Defaults to the full ordered quantity.
    #[serde(default, alias = "qty")]
    pub quantity: Option<u32>,
}

fn required_text(value: Option<String>, field: &str) -> Result<String, ReturnsError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ReturnsError::validation(format!("{field} is required")))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_method(value: Option<String>) -> Result<ReturnMethod, ReturnsError> {
    required_text(value, "method")?
        .to_lowercase()
        .parse()
        .map_err(|_| ReturnsError::validation("method must be pickup or dropoff"))
}

/// Parse an optional approval amount.
///
/// Absent, null, `""`, zero and negative amounts all mean "not given" so the
/// next amount source applies. Only non-numeric input is rejected.
fn optional_amount(value: Option<&Value>, field: &str) -> Result<Option<Decimal>, ReturnsError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match parse_amount(value) {
        Err(AmountError::Missing) => Ok(None),
        Ok(amount) => Ok(Some(amount).filter(|a| *a > Decimal::ZERO)),
        Err(_) => Err(ReturnsError::validation(format!("{field} must be a number"))),
    }
}

// =============================================================================
// Return request
// =============================================================================

/// Body of `POST /api/orders/{id}/return-request`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReturnRequestInput {
    #[serde(alias = "reasonCode")]
    pub reason_code: Option<String>,
    #[serde(alias = "reasonNote")]
    pub reason_note: Option<String>,
    #[serde(alias = "preferredResolution")]
    pub preferred_resolution: Option<String>,
    pub method: Option<String>,
    pub images: Vec<String>,
    pub items: Option<Vec<ItemInput>>,
    pub customer: Option<Contact>,
    pub hub: Option<Contact>,
}

/// A validated return request.
#[derive(Debug, Clone)]
pub struct ReturnRequest {
    pub reason_code: String,
    pub reason_note: Option<String>,
    pub preferred_resolution: PreferredResolution,
    pub method: ReturnMethod,
    pub images: Vec<String>,
    pub items: Option<Vec<ItemInput>>,
    pub customer: Option<Contact>,
    pub hub: Option<Contact>,
}

impl ReturnRequestInput {
    /// Validate the body.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnsError::Validation`] naming the first invalid field.
    pub fn validate(self) -> Result<ReturnRequest, ReturnsError> {
        let reason_code = required_text(self.reason_code, "reason_code")?;
        let preferred_resolution = match optional_text(self.preferred_resolution) {
            None => PreferredResolution::default(),
            Some(value) => value.to_lowercase().parse().map_err(|_| {
                ReturnsError::validation("preferred_resolution must be refund or replacement")
            })?,
        };
        let method = parse_method(self.method)?;
        if self
            .items
            .as_ref()
            .is_some_and(|items| items.iter().any(|item| item.quantity == Some(0)))
        {
            return Err(ReturnsError::validation(
                "item quantity must be at least 1",
            ));
        }

        Ok(ReturnRequest {
            reason_code,
            reason_note: optional_text(self.reason_note),
            preferred_resolution,
            method,
            images: self
                .images
                .into_iter()
                .filter(|url| !url.trim().is_empty())
                .collect(),
            items: self.items.filter(|items| !items.is_empty()),
            customer: self.customer,
            hub: self.hub,
        })
    }
}

// =============================================================================
// Return approval
// =============================================================================

/// Body of `POST /api/orders/{id}/return-request/approve`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApproveReturnInput {
    #[serde(alias = "approveRefund")]
    pub approve_refund: Option<bool>,
    #[serde(alias = "refundAmount")]
    pub refund_amount: Option<Value>,
    pub reason: Option<String>,
}

/// A validated return approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveReturn {
    pub approve_refund: bool,
    pub refund_amount: Option<Decimal>,
    pub reason: Option<String>,
}

impl ApproveReturnInput {
    /// Validate the body.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnsError::Validation`] for an unusable `refundAmount`.
    pub fn validate(self) -> Result<ApproveReturn, ReturnsError> {
        Ok(ApproveReturn {
            approve_refund: self.approve_refund.unwrap_or(true),
            refund_amount: optional_amount(self.refund_amount.as_ref(), "refundAmount")?,
            reason: optional_text(self.reason),
        })
    }
}

// =============================================================================
// Refund request and approval
// =============================================================================

/// Body of `POST /api/orders/{id}/refund-request`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefundRequestInput {
    pub reason: Option<String>,
    pub amount: Option<Value>,
    #[serde(alias = "customerEmail")]
    pub customer_email: Option<String>,
    #[serde(alias = "customerName")]
    pub customer_name: Option<String>,
}

/// A validated refund request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRequest {
    pub reason: String,
    pub amount: Decimal,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

impl RefundRequestInput {
    /// Validate the body.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnsError::Validation`] when `reason` is blank or `amount`
    /// is not a positive number.
    pub fn validate(self) -> Result<RefundRequest, ReturnsError> {
        let reason = required_text(self.reason, "reason")?;
        let amount = parse_positive_amount(self.amount.as_ref().unwrap_or(&Value::Null))
            .map_err(|e| match e {
                AmountError::Missing => ReturnsError::validation("amount is required"),
                _ => ReturnsError::validation("amount must be a positive number"),
            })?;

        Ok(RefundRequest {
            reason,
            amount,
            customer_email: optional_text(self.customer_email),
            customer_name: optional_text(self.customer_name),
        })
    }
}

/// Body of `POST /api/orders/{id}/refund-request/approve`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApproveRefundInput {
    pub amount: Option<Value>,
    pub reason: Option<String>,
    pub restock: Option<bool>,
}

/// A validated refund approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveRefund {
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
    pub restock: bool,
}

impl ApproveRefundInput {
    /// Validate the body.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnsError::Validation`] for an unusable `amount`.
    pub fn validate(self) -> Result<ApproveRefund, ReturnsError> {
        Ok(ApproveRefund {
            amount: optional_amount(self.amount.as_ref(), "amount")?,
            reason: optional_text(self.reason),
            restock: self.restock.unwrap_or(false),
        })
    }
}

// =============================================================================
// Return shipment
// =============================================================================

/// Body of `POST /api/orders/{id}/return-shipment`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReturnShipmentInput {
    pub method: Option<String>,
    pub customer: Option<Contact>,
    pub hub: Option<Contact>,
}

/// A validated return shipment request.
#[derive(Debug, Clone)]
pub struct ReturnShipment {
    pub method: ReturnMethod,
    pub customer: Option<Contact>,
    pub hub: Option<Contact>,
}

impl ReturnShipmentInput {
    /// Validate the body.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnsError::Validation`] when `method` is missing or unknown.
    pub fn validate(self) -> Result<ReturnShipment, ReturnsError> {
        Ok(ReturnShipment {
            method: parse_method(self.method)?,
            customer: self.customer,
            hub: self.hub,
        })
    }
}
