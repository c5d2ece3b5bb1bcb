//! Returns and refunds workflow.
//!
//! Coordinates WooCommerce (order state, refunds, notes), JLO (the physical
//! return) and Fez (pickup booking). The only persistent state lives in order
//! metadata (see [`osun_core::meta`]).
//!
//! # Consistency
//!
//! There is no transaction spanning the upstreams. Each operation performs its
//! writes in a fixed order and stops at the first failure; anything already
//! written stays written. Failures after the first write are logged with
//! `unreconciled = true` and surface as [`ReturnsError::Unreconciled`].
//!
//! Metadata updates are unconditional `PUT`s, so two concurrent approvals both
//! succeed and the later write wins. Approving twice creates two refunds.

pub mod builder;
pub mod code;
mod error;
mod input;
mod summary;

pub use error::ReturnsError;
pub use input::{
    ApproveRefund, ApproveRefundInput, ApproveReturn, ApproveReturnInput, Contact, ItemInput,
    RefundRequest, RefundRequestInput, ReturnRequest, ReturnRequestInput, ReturnShipment,
    ReturnShipmentInput,
};
pub use summary::OrderSummary;

use chrono::Utc;
use osun_core::meta::{
    REFUND_REQUEST_STATUS_KEY, RETURN_REQUEST_STATUS_KEY, RefundRequestRecord,
    ReturnRequestRecord, ReturnShipmentRecord,
};
use osun_core::{CustomerId, JloReturnStatus, OrderId, RequestStatus, ReturnCode, ReturnMethod, format_amount};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::services::fez::{FezClient, PickupContact, PickupRequest};
use crate::services::jlo::{self, JloClient, ReturnsFilter};
use crate::services::upstream::{self, UpstreamError};
use crate::services::woocommerce::{MetaUpdate, Order, Refund, RefundCreate, RefundLineCreate, WooClient};

// =============================================================================
// Results
// =============================================================================

/// Outcome of a submitted return.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedReturn {
    pub return_id: Option<String>,
    /// JLO's record of the return, unwrapped from its envelope.
    pub data: Value,
}

/// Outcome of an approved return.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovedReturn {
    pub order_id: OrderId,
    pub return_request: ReturnRequestRecord,
    pub refund: Option<Refund>,
    pub refund_amount: Option<Decimal>,
}

/// Outcome of an approved refund request.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovedRefund {
    pub order_id: OrderId,
    pub refund_request: RefundRequestRecord,
    pub refund: Refund,
}

/// Outcome of a return shipment request.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedShipment {
    pub return_code: ReturnCode,
    pub fez_tracking: Option<String>,
    pub method: ReturnMethod,
    pub instructions: String,
}

/// Outcome of a JLO status sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncedReturn {
    pub order_id: OrderId,
    pub jlo_return_id: Option<String>,
    /// JLO status as reported, including values this build does not know.
    pub jlo_status: String,
    pub status: RequestStatus,
}

/// An order with its JLO returns attached.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithReturns {
    pub order: Order,
    pub returns: Vec<Value>,
    pub summary: OrderSummary,
}

// =============================================================================
// ReturnsService
// =============================================================================

/// Returns workflow over borrowed upstream clients.
///
/// Built per request from the application state; cheap to construct.
#[derive(Clone, Copy)]
pub struct ReturnsService<'a> {
    woo: &'a WooClient,
    jlo: Option<&'a JloClient>,
    fez: Option<&'a FezClient>,
}

/// Build the error mapper for a failure after a completed write.
fn unreconciled(
    order_id: OrderId,
    completed: &'static str,
    failed: &'static str,
) -> impl FnOnce(UpstreamError) -> ReturnsError {
    move |source| {
        error!(
            order_id = %order_id,
            unreconciled = true,
            completed,
            failed,
            error = %source,
            "Returns workflow stopped after a partial write"
        );
        ReturnsError::Unreconciled {
            completed,
            failed,
            source,
        }
    }
}

impl<'a> ReturnsService<'a> {
    #[must_use]
    pub const fn new(woo: &'a WooClient, jlo: Option<&'a JloClient>, fez: Option<&'a FezClient>) -> Self {
        Self { woo, jlo, fez }
    }

    fn jlo(&self) -> Result<&'a JloClient, ReturnsError> {
        self.jlo.ok_or(ReturnsError::NotConfigured("JLO"))
    }

    fn default_hub(&self) -> Option<Contact> {
        self.jlo
            .and_then(JloClient::hub)
            .map(builder::hub_contact)
    }

    /// Submit a return to JLO.
    ///
    /// Does not write order metadata; the order picks up the return on the
    /// next [`ReturnsService::sync_return_status`].
    ///
    /// # Errors
    ///
    /// Returns an error if JLO is not configured, the order cannot be fetched,
    /// an item is not on the order, or JLO rejects the return.
    #[instrument(skip(self, request), fields(order_id = %order_id, reason_code = %request.reason_code))]
    pub async fn submit_return(
        &self,
        order_id: OrderId,
        request: ReturnRequest,
    ) -> Result<SubmittedReturn, ReturnsError> {
        let jlo = self.jlo()?;
        let order = self.woo.get_order(order_id).await?;

        let items = builder::select_return_items(&order, request.items.as_deref())?;
        let customer = request
            .customer
            .clone()
            .unwrap_or_else(|| builder::derive_customer(&order));
        let hub = request.hub.clone().or_else(|| self.default_hub());

        let payload = builder::jlo_return_payload(&order, &request, &items, &customer, hub.as_ref());
        let response = jlo.create_return(&payload).await?;

        let return_id = jlo::return_id(&response);
        if return_id.is_none() {
            warn!(order_id = %order_id, "JLO accepted the return without an id");
        }
        info!(order_id = %order_id, return_id = ?return_id, "Return submitted to JLO");

        Ok(SubmittedReturn {
            return_id,
            data: upstream::unwrap_data(response),
        })
    }

    /// Approve a return and optionally refund it.
    ///
    /// Writes the processed return request first, then creates the refund,
    /// then appends the audit note.
    ///
    /// # Errors
    ///
    /// Returns an error if any upstream call fails. Failures after the
    /// metadata write are [`ReturnsError::Unreconciled`].
    #[instrument(skip(self, approval), fields(order_id = %order_id, approve_refund = approval.approve_refund))]
    pub async fn approve_return(
        &self,
        order_id: OrderId,
        approval: ApproveReturn,
    ) -> Result<ApprovedReturn, ReturnsError> {
        let order = self.woo.get_order(order_id).await?;
        let stored = order.document_or_warn::<ReturnRequestRecord>();
        if stored.is_none() {
            warn!(order_id = %order_id, "Approving a return with no stored return request");
        }
        let mut record = stored.unwrap_or_default();

        let lines = builder::refund_line_items(&order, &record.items);
        let amount = approval.approve_refund.then(|| {
            builder::resolve_return_refund_amount(
                approval.refund_amount,
                record.refund_amount,
                &lines,
                order.total,
            )
        });

        record.status = RequestStatus::Processed;
        record.processed_at = Some(Utc::now());
        if let Some(amount) = amount.filter(|a| *a > Decimal::ZERO) {
            record.refund_amount = Some(amount);
        }

        self.woo
            .update_order_meta(
                order_id,
                &[
                    MetaUpdate::document(&record)?,
                    MetaUpdate::status(RETURN_REQUEST_STATUS_KEY, RequestStatus::Processed),
                ],
            )
            .await?;

        let refund = match amount {
            Some(amount) if amount > Decimal::ZERO => {
                let reason = approval
                    .reason
                    .clone()
                    .or_else(|| record.reason_note.clone())
                    .or_else(|| record.reason_code.clone())
                    .unwrap_or_else(|| "Return approved".to_string());
                let refund = self
                    .woo
                    .create_refund(
                        order_id,
                        &RefundCreate {
                            amount: format_amount(amount),
                            reason,
                            restock_items: true,
                            api_refund: self.woo.gateway_refunds(),
                            line_items: lines.iter().map(RefundLineCreate::from).collect(),
                        },
                    )
                    .await
                    .map_err(unreconciled(order_id, "return marked processed", "refund creation"))?;
                Some(refund)
            }
            _ => None,
        };

        let note = builder::return_approval_note(
            &record,
            refund.as_ref(),
            amount.unwrap_or_default(),
            &order.currency,
        );
        self.woo
            .add_order_note(order_id, &note)
            .await
            .map_err(unreconciled(order_id, "return approval", "audit note"))?;

        info!(
            order_id = %order_id,
            refund_id = ?refund.as_ref().map(|r| r.id),
            "Return approved"
        );

        Ok(ApprovedReturn {
            order_id,
            return_request: record,
            refund_amount: refund.as_ref().and(amount),
            refund,
        })
    }

    /// Record a customer refund request on the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata write or the audit note fails.
    #[instrument(skip(self, request), fields(order_id = %order_id, amount = %request.amount))]
    pub async fn submit_refund_request(
        &self,
        order_id: OrderId,
        request: RefundRequest,
    ) -> Result<RefundRequestRecord, ReturnsError> {
        let record = RefundRequestRecord {
            status: RequestStatus::Pending,
            reason: request.reason,
            amount: Some(request.amount),
            customer_email: request.customer_email,
            customer_name: request.customer_name,
            requested_at: Some(Utc::now()),
            ..RefundRequestRecord::default()
        };

        let order = self
            .woo
            .update_order_meta(
                order_id,
                &[
                    MetaUpdate::document(&record)?,
                    MetaUpdate::status(REFUND_REQUEST_STATUS_KEY, RequestStatus::Pending),
                ],
            )
            .await?;

        let note = builder::refund_request_note(request.amount, &order.currency, &record.reason);
        self.woo
            .add_order_note(order_id, &note)
            .await
            .map_err(unreconciled(order_id, "refund request recorded", "audit note"))?;

        info!(order_id = %order_id, "Refund request recorded");
        Ok(record)
    }

    /// Approve a refund request and create the WooCommerce refund.
    ///
    /// # Errors
    ///
    /// Returns a validation error when no positive amount can be resolved, and
    /// an upstream error if any call fails.
    #[instrument(skip(self, approval), fields(order_id = %order_id))]
    pub async fn approve_refund(
        &self,
        order_id: OrderId,
        approval: ApproveRefund,
    ) -> Result<ApprovedRefund, ReturnsError> {
        let order = self.woo.get_order(order_id).await?;
        let mut record = order
            .document_or_warn::<RefundRequestRecord>()
            .unwrap_or_default();

        let amount = builder::resolve_refund_amount(approval.amount, record.amount, order.total);
        if amount <= Decimal::ZERO {
            return Err(ReturnsError::validation("No refundable amount for this order"));
        }

        let reason = approval
            .reason
            .clone()
            .or_else(|| Some(record.reason.clone()).filter(|r| !r.trim().is_empty()))
            .unwrap_or_else(|| "Refund approved".to_string());

        let refund = self
            .woo
            .create_refund(
                order_id,
                &RefundCreate {
                    amount: format_amount(amount),
                    reason,
                    restock_items: approval.restock,
                    api_refund: self.woo.gateway_refunds(),
                    line_items: Vec::new(),
                },
            )
            .await?;

        record.status = RequestStatus::Processed;
        record.refunded_amount = Some(amount);
        record.refund_id = Some(refund.id);
        record.processed_at = Some(Utc::now());

        let updates = [
            MetaUpdate::document(&record)?,
            MetaUpdate::status(REFUND_REQUEST_STATUS_KEY, RequestStatus::Processed),
        ];
        self.woo
            .update_order_meta(order_id, &updates)
            .await
            .map_err(unreconciled(order_id, "refund created", "refund request update"))?;

        let note = builder::refund_approval_note(&refund, amount, &order.currency, approval.restock);
        self.woo
            .add_order_note(order_id, &note)
            .await
            .map_err(unreconciled(order_id, "refund created", "audit note"))?;

        info!(order_id = %order_id, refund_id = %refund.id, "Refund approved");

        Ok(ApprovedRefund {
            order_id,
            refund_request: record,
            refund,
        })
    }

    /// Issue a return code, book a pickup if asked, and record the shipment.
    ///
    /// A failed pickup booking never fails the request: the shipment is
    /// recorded without tracking and the customer gets drop-off instructions.
    ///
    /// An order gets one shipment. Once `_return_shipment` is stored, later
    /// calls return it unchanged without booking or writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the order cannot be fetched or the metadata write
    /// or audit note fails.
    #[instrument(skip(self, shipment), fields(order_id = %order_id, method = %shipment.method))]
    pub async fn create_return_shipment(
        &self,
        order_id: OrderId,
        shipment: ReturnShipment,
    ) -> Result<CreatedShipment, ReturnsError> {
        let order = self.woo.get_order(order_id).await?;
        let hub = shipment.hub.clone().or_else(|| self.default_hub());

        if let Some(existing) = order.document_or_warn::<ReturnShipmentRecord>() {
            info!(
                order_id = %order_id,
                return_code = %existing.return_code,
                requested_method = %shipment.method,
                "Return shipment already exists, returning it"
            );
            return Ok(CreatedShipment {
                instructions: builder::shipment_instructions(
                    &existing.return_code,
                    existing.fez_tracking.as_deref(),
                    hub.as_ref(),
                ),
                return_code: existing.return_code,
                fez_tracking: existing.fez_tracking,
                method: existing.method,
            });
        }

        let return_code = code::generate();

        let fez_tracking = if shipment.method == ReturnMethod::Pickup {
            let customer = shipment
                .customer
                .clone()
                .unwrap_or_else(|| builder::derive_customer(&order));
            self.book_pickup(&order, &return_code, &customer, hub.as_ref())
                .await
        } else {
            None
        };

        let record = ReturnShipmentRecord {
            method: shipment.method,
            return_code: return_code.clone(),
            fez_tracking: fez_tracking.clone(),
            status: RequestStatus::Pending,
            created_at: Some(Utc::now()),
        };
        self.woo
            .update_order_meta(order_id, &[MetaUpdate::document(&record)?])
            .await?;

        let note = builder::shipment_note(&return_code, shipment.method, fez_tracking.as_deref());
        self.woo
            .add_order_note(order_id, &note)
            .await
            .map_err(unreconciled(order_id, "return shipment recorded", "audit note"))?;

        info!(
            order_id = %order_id,
            return_code = %return_code,
            has_tracking = fez_tracking.is_some(),
            "Return shipment created"
        );

        Ok(CreatedShipment {
            instructions: builder::shipment_instructions(
                &return_code,
                fez_tracking.as_deref(),
                hub.as_ref(),
            ),
            return_code,
            fez_tracking,
            method: shipment.method,
        })
    }

    /// Book a Fez pickup, logging and swallowing every failure.
    async fn book_pickup(
        &self,
        order: &Order,
        return_code: &ReturnCode,
        customer: &Contact,
        hub: Option<&Contact>,
    ) -> Option<String> {
        let Some(fez) = self.fez else {
            warn!(order_id = %order.id, return_code = %return_code, "Fez is not configured, falling back to drop-off");
            return None;
        };

        let request = PickupRequest {
            reference: return_code.to_string(),
            order_id: order.id.as_u64(),
            pickup: PickupContact::from(customer),
            dropoff: hub.map(PickupContact::from),
            description: format!("Return for order #{}", order.id),
        };

        match fez.create_pickup(&request).await {
            Ok(tracking) => Some(tracking),
            Err(e) => {
                warn!(
                    order_id = %order.id,
                    return_code = %return_code,
                    error = %e,
                    "Fez pickup booking failed, falling back to drop-off"
                );
                None
            }
        }
    }

    /// Pull the latest JLO return for an order into its return request.
    ///
    /// Besides the status, the customer's requested items, reason,
    /// resolution, method and amount are copied from JLO, so approval refunds
    /// what was actually returned.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnsError::NotFound`] when JLO has no return for the order,
    /// and an upstream error if any call fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn sync_return_status(&self, order_id: OrderId) -> Result<SyncedReturn, ReturnsError> {
        let jlo = self.jlo()?;
        let returns = jlo::returns_list(
            jlo.list_returns(ReturnsFilter {
                order_id: Some(order_id),
                ..ReturnsFilter::default()
            })
            .await?,
        );

        let latest = latest_return(&returns)
            .ok_or_else(|| ReturnsError::NotFound("No return found for order".to_string()))?;
        let jlo_status = latest
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let status = jlo_status
            .parse::<JloReturnStatus>()
            .map_or_else(
                |_| {
                    warn!(order_id = %order_id, jlo_status = %jlo_status, "Unknown JLO return status");
                    RequestStatus::Pending
                },
                |s| s.coarse(),
            );
        let jlo_return_id = jlo::return_id(latest);

        let order = self.woo.get_order(order_id).await?;
        let mut record = order
            .document_or_warn::<ReturnRequestRecord>()
            .unwrap_or_default();
        builder::apply_jlo_request(&mut record, latest);
        record.status = status;
        record.jlo_status = Some(jlo_status.clone());
        record.jlo_return_id.clone_from(&jlo_return_id);
        record.synced_at = Some(Utc::now());
        if status == RequestStatus::Processed && record.processed_at.is_none() {
            record.processed_at = record.synced_at;
        }

        self.woo
            .update_order_meta(
                order_id,
                &[
                    MetaUpdate::document(&record)?,
                    MetaUpdate::status(RETURN_REQUEST_STATUS_KEY, status),
                ],
            )
            .await?;

        info!(order_id = %order_id, jlo_status = %jlo_status, status = %status, "Return status synced");

        Ok(SyncedReturn {
            order_id,
            jlo_return_id,
            jlo_status,
            status,
        })
    }

    /// Fetch an order with its JLO returns.
    ///
    /// When `customer` is given the order must belong to that customer; a
    /// mismatch is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the order cannot be fetched or belongs to someone
    /// else. JLO failures only log a warning.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn order_with_returns(
        &self,
        order_id: OrderId,
        customer: Option<CustomerId>,
    ) -> Result<OrderWithReturns, ReturnsError> {
        let order = self.woo.get_order(order_id).await?;
        if let Some(customer) = customer
            && order.customer() != Some(customer)
        {
            return Err(ReturnsError::NotFound("Order not found".to_string()));
        }

        let returns = match self.jlo {
            Some(jlo) => match jlo
                .list_returns(ReturnsFilter {
                    order_id: Some(order_id),
                    ..ReturnsFilter::default()
                })
                .await
            {
                Ok(body) => jlo::returns_list(body),
                Err(e) => {
                    warn!(order_id = %order_id, error = %e, "Could not load JLO returns for order");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(OrderWithReturns {
            summary: OrderSummary::from(&order),
            order,
            returns,
        })
    }

    /// List a customer's orders as summaries.
    ///
    /// # Errors
    ///
    /// Returns an error if WooCommerce fails.
    #[instrument(skip(self), fields(customer_id = %customer))]
    pub async fn customer_orders(
        &self,
        customer: CustomerId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<OrderSummary>, ReturnsError> {
        let orders = self.woo.list_orders(customer, page, per_page).await?;
        Ok(orders.iter().map(OrderSummary::from).collect())
    }
}

/// Most recent return by `created_at`; the last entry wins ties and missing dates.
fn latest_return(returns: &[Value]) -> Option<&Value> {
    returns.iter().max_by(|a, b| {
        let created = |v: &&Value| {
            v.get("created_at")
                .or_else(|| v.get("createdAt"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        created(a).cmp(&created(b))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_latest_return_by_created_at() {
        let returns = vec![
            json!({ "id": "a", "created_at": "2026-03-02T10:00:00Z" }),
            json!({ "id": "b", "created_at": "2026-03-05T10:00:00Z" }),
            json!({ "id": "c", "created_at": "2026-03-01T10:00:00Z" }),
        ];
        assert_eq!(latest_return(&returns).unwrap()["id"], "b");
    }

    #[test]
    fn test_latest_return_without_dates_is_last() {
        let returns = vec![json!({ "id": "a" }), json!({ "id": "b" })];
        assert_eq!(latest_return(&returns).unwrap()["id"], "b");
        assert!(latest_return(&[]).is_none());
    }
}
