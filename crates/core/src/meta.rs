//! Versioned schema for the order metadata this system owns.
//!
//! WooCommerce order `meta_data` is the only persistent record of an in-flight
//! return, refund or return shipment. Each record is stored as a JSON string
//! under a well-known key and replaced wholesale on every status transition.
//!
//! # Versioning
//!
//! Every encoded blob carries a `"schema"` tag such as `"return_request.v1"`.
//! Decoding follows one rule per tag:
//!
//! - current tag: deserialize directly
//! - no tag: a legacy untagged blob; deserialize leniently (field aliases and
//!   defaults) and treat it as the current version
//! - any other tag: [`MetaError::UnknownSchema`]
//!
//! When a `v2` shape is introduced, add a `match` arm that deserializes the
//! `v1` record and converts it, and bump [`MetaDocument::SCHEMA`]. Encoding
//! always writes the current version, so records migrate the next time they
//! are written.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::types::{
    LineItemId, PreferredResolution, RefundId, RequestStatus, ReturnCode, ReturnMethod,
};

/// Meta key holding the encoded [`ReturnRequestRecord`].
pub const RETURN_REQUEST_KEY: &str = "_return_request";
/// Meta key mirroring the return request status as a plain string.
pub const RETURN_REQUEST_STATUS_KEY: &str = "_return_request_status";
/// Meta key holding the encoded [`RefundRequestRecord`].
pub const REFUND_REQUEST_KEY: &str = "_refund_request";
/// Meta key mirroring the refund request status as a plain string.
pub const REFUND_REQUEST_STATUS_KEY: &str = "_refund_request_status";
/// Meta key holding the encoded [`ReturnShipmentRecord`].
pub const RETURN_SHIPMENT_KEY: &str = "_return_shipment";

/// Field carrying the schema tag inside every encoded blob.
const SCHEMA_FIELD: &str = "schema";

/// Errors that can occur when decoding or encoding metadata.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The meta value is null, empty, or not a JSON object.
    #[error("metadata value for {key} is empty or not an object")]
    NotAnObject {
        /// Meta key being decoded.
        key: &'static str,
    },
    /// The blob is tagged with a schema this build does not know.
    #[error("unknown schema {found:?} for {key}")]
    UnknownSchema {
        /// Meta key being decoded.
        key: &'static str,
        /// Tag found in the blob.
        found: String,
    },
    /// The blob is JSON but does not match the record shape.
    #[error("malformed {key}: {source}")]
    Malformed {
        /// Meta key being decoded.
        key: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// A record stored as JSON under a single order meta key.
pub trait MetaDocument: Serialize + DeserializeOwned {
    /// Order meta key.
    const KEY: &'static str;
    /// Current schema tag.
    const SCHEMA: &'static str;

    /// Decode a raw meta value.
    ///
    /// The value may be a JSON-encoded string (what this system writes) or an
    /// object (what WooCommerce returns when a plugin stored an array).
    ///
    /// # Errors
    ///
    /// Returns a [`MetaError`] when the value is empty, tagged with an unknown
    /// schema, or does not match the record shape.
    fn decode(raw: &Value) -> Result<Self, MetaError> {
        let mut object = match raw {
            Value::String(s) if !s.trim().is_empty() => serde_json::from_str::<Value>(s)
                .map_err(|source| MetaError::Malformed {
                    key: Self::KEY,
                    source,
                })?,
            Value::Object(_) => raw.clone(),
            _ => return Err(MetaError::NotAnObject { key: Self::KEY }),
        };

        let Some(map) = object.as_object_mut() else {
            return Err(MetaError::NotAnObject { key: Self::KEY });
        };

        match map.remove(SCHEMA_FIELD) {
            None => {}
            Some(Value::String(tag)) if tag == Self::SCHEMA => {}
            Some(other) => {
                return Err(MetaError::UnknownSchema {
                    key: Self::KEY,
                    found: other.as_str().map_or_else(|| other.to_string(), String::from),
                });
            }
        }

        serde_json::from_value(object).map_err(|source| MetaError::Malformed {
            key: Self::KEY,
            source,
        })
    }

    /// Encode the record as the JSON string stored in the meta value.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Malformed`] if serialization fails.
    fn encode(&self) -> Result<String, MetaError> {
        let mut value = serde_json::to_value(self).map_err(|source| MetaError::Malformed {
            key: Self::KEY,
            source,
        })?;
        if let Some(map) = value.as_object_mut() {
            map.insert(
                SCHEMA_FIELD.to_owned(),
                Value::String(Self::SCHEMA.to_owned()),
            );
        }
        Ok(value.to_string())
    }
}

/// A line item the customer asked to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    /// WooCommerce order line item id.
    #[serde(alias = "id")]
    pub line_item_id: LineItemId,
    /// Quantity requested for return.
    #[serde(alias = "qty")]
    pub quantity: u32,
    /// Refund total agreed for this line, overriding the computed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_total: Option<Decimal>,
}

/// Return request state stored under `_return_request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReturnRequestRecord {
    /// Coarse status.
    pub status: RequestStatus,
    /// Reason code selected by the customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    /// Free-text reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_note: Option<String>,
    pub preferred_resolution: PreferredResolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ReturnMethod>,
    /// Line items requested for return.
    pub items: Vec<RequestedItem>,
    /// Refund amount requested or agreed before approval.
    #[serde(alias = "amount", skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Decimal>,
    /// Identifier of the return in the JLO service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jlo_return_id: Option<String>,
    /// Last JLO lifecycle status seen, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jlo_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl MetaDocument for ReturnRequestRecord {
    const KEY: &'static str = RETURN_REQUEST_KEY;
    const SCHEMA: &'static str = "return_request.v1";
}

/// Refund request state stored under `_refund_request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RefundRequestRecord {
    pub status: RequestStatus,
    pub reason: String,
    /// Amount the customer asked for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(alias = "customerEmail", skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(alias = "customerName", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Amount actually refunded on approval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<RefundId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl MetaDocument for RefundRequestRecord {
    const KEY: &'static str = REFUND_REQUEST_KEY;
    const SCHEMA: &'static str = "refund_request.v1";
}

/// Return shipment stored under `_return_shipment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnShipmentRecord {
    pub method: ReturnMethod,
    /// Code printed on the parcel; never changes once issued.
    pub return_code: ReturnCode,
    /// Carrier tracking number, absent when pickup booking failed or for drop-off.
    #[serde(default)]
    pub fez_tracking: Option<String>,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl MetaDocument for ReturnShipmentRecord {
    const KEY: &'static str = RETURN_SHIPMENT_KEY;
    const SCHEMA: &'static str = "return_shipment.v1";
}
