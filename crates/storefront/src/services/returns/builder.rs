//! Pure functions that turn orders and requests into upstream payloads.
//!
//! Nothing here performs I/O, so the amount and quantity rules are tested
//! directly against hand-built orders.

use osun_core::meta::{RequestedItem, ReturnRequestRecord};
use osun_core::{
    LineItemId, PreferredResolution, ReturnCode, ReturnMethod, format_amount, parse_amount,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use super::error::ReturnsError;
use super::input::{Contact, ItemInput, ReturnRequest};
use crate::config::HubConfig;
use crate::services::fez::PickupContact;
use crate::services::woocommerce::{Address, Order, Refund, RefundLineCreate};

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// =============================================================================
// Contacts
// =============================================================================

/// Customer contact derived from the order: shipping address when it has a
/// street line, billing otherwise; email from billing; phone from whichever
/// address has one.
#[must_use]
pub fn derive_customer(order: &Order) -> Contact {
    let address: &Address = if order.shipping.has_street() {
        &order.shipping
    } else {
        &order.billing
    };
    let name = non_empty(&address.full_name()).or_else(|| non_empty(&order.billing.full_name()));
    let phone = non_empty(&address.phone).or_else(|| non_empty(&order.billing.phone));

    Contact {
        name,
        email: non_empty(&order.billing.email),
        phone,
        address: non_empty(&address.street()),
        city: non_empty(&address.city),
        state: non_empty(&address.state),
        postcode: non_empty(&address.postcode),
        country: non_empty(&address.country),
    }
}

/// Configured returns hub as a contact.
#[must_use]
pub fn hub_contact(hub: &HubConfig) -> Contact {
    Contact {
        name: Some(hub.name.clone()),
        phone: Some(hub.phone.clone()),
        address: Some(hub.address.clone()),
        city: hub.city.clone(),
        state: hub.state.clone(),
        ..Contact::default()
    }
}

impl From<&Contact> for PickupContact {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone().unwrap_or_default(),
            phone: contact.phone.clone().unwrap_or_default(),
            address: contact.address.clone().unwrap_or_default(),
            city: contact.city.clone(),
            state: contact.state.clone(),
        }
    }
}

// =============================================================================
// Items
// =============================================================================

/// Resolve the items to return.
///
/// `None` means every line at its full quantity. Requested quantities are
/// clamped to what was ordered and a missing quantity means the full line.
///
/// # Errors
///
/// Returns [`ReturnsError::Validation`] when a line id is not on the order.
pub fn select_return_items(
    order: &Order,
    requested: Option<&[ItemInput]>,
) -> Result<Vec<RequestedItem>, ReturnsError> {
    let Some(requested) = requested else {
        return Ok(order
            .line_items
            .iter()
            .filter(|line| line.quantity > 0)
            .map(|line| RequestedItem {
                line_item_id: line.id,
                quantity: line.quantity,
                refund_total: None,
            })
            .collect());
    };

    requested
        .iter()
        .map(|item| {
            let line = order.line_item(item.line_item_id).ok_or_else(|| {
                ReturnsError::validation(format!(
                    "Line item {} is not part of order {}",
                    item.line_item_id, order.id
                ))
            })?;
            Ok(RequestedItem {
                line_item_id: line.id,
                quantity: item.quantity.unwrap_or(line.quantity).min(line.quantity),
                refund_total: None,
            })
        })
        .collect()
}

/// A refunded line with its computed total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundLine {
    pub line_item_id: LineItemId,
    pub quantity: u32,
    pub refund_total: Decimal,
}

impl From<&RefundLine> for RefundLineCreate {
    fn from(line: &RefundLine) -> Self {
        Self {
            id: line.line_item_id,
            quantity: line.quantity,
            refund_total: format_amount(line.refund_total),
        }
    }
}

/// Compute refund lines for the requested items.
///
/// Quantities are clamped to the ordered quantity; the total is the line's
/// unit price times quantity unless the request stored an agreed
/// `refund_total`. Unknown lines and zero quantities are skipped.
#[must_use]
pub fn refund_line_items(order: &Order, items: &[RequestedItem]) -> Vec<RefundLine> {
    items
        .iter()
        .filter_map(|item| {
            let line = order.line_item(item.line_item_id)?;
            let quantity = item.quantity.min(line.quantity);
            if quantity == 0 {
                return None;
            }
            let total = item
                .refund_total
                .unwrap_or_else(|| line.unit_price() * Decimal::from(quantity));
            Some(RefundLine {
                line_item_id: line.id,
                quantity,
                refund_total: total.round_dp(2),
            })
        })
        .collect()
}

/// Line items recorded on a JLO return, as sent by [`jlo_return_payload`].
///
/// Entries without a usable line id or with a zero quantity are dropped.
fn jlo_items(jlo_return: &Value) -> Vec<RequestedItem> {
    let Some(items) = jlo_return.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let id = item
                .get("line_item_id")
                .or_else(|| item.get("id"))
                .and_then(Value::as_u64)
                .filter(|id| *id > 0)?;
            let quantity = item
                .get("quantity")
                .or_else(|| item.get("qty"))
                .and_then(Value::as_u64)
                .and_then(|q| u32::try_from(q).ok())
                .filter(|q| *q > 0)?;
            Some(RequestedItem {
                line_item_id: LineItemId::new(id),
                quantity,
                refund_total: item
                    .get("refund_total")
                    .and_then(|total| parse_amount(total).ok())
                    .filter(|total| *total >= Decimal::ZERO),
            })
        })
        .collect()
}

/// Copy what the customer asked for on a JLO return into the stored request.
///
/// JLO holds the request until the first sync, so this is where the stored
/// record learns its items, reason, resolution and method. Fields JLO leaves
/// out keep their stored values, and a stored refund amount is never replaced.
pub fn apply_jlo_request(record: &mut ReturnRequestRecord, jlo_return: &Value) {
    let text = |key: &str| {
        jlo_return
            .get(key)
            .and_then(Value::as_str)
            .and_then(non_empty)
    };

    let items = jlo_items(jlo_return);
    if !items.is_empty() {
        record.items = items;
    }
    if let Some(reason_code) = text("reason_code") {
        record.reason_code = Some(reason_code);
    }
    if let Some(reason_note) = text("reason_note") {
        record.reason_note = Some(reason_note);
    }
    if let Some(resolution) = text("preferred_resolution")
        .and_then(|r| r.to_lowercase().parse::<PreferredResolution>().ok())
    {
        record.preferred_resolution = resolution;
    }
    if let Some(method) = text("method").and_then(|m| m.to_lowercase().parse::<ReturnMethod>().ok()) {
        record.method = Some(method);
    }
    if record.refund_amount.is_none() {
        record.refund_amount = ["refund_amount", "requested_amount"]
            .iter()
            .filter_map(|key| jlo_return.get(*key))
            .find_map(|amount| parse_amount(amount).ok())
            .filter(|amount| *amount > Decimal::ZERO);
    }
}

// =============================================================================
// Amounts
// =============================================================================

fn first_positive(candidates: impl IntoIterator<Item = Option<Decimal>>) -> Option<Decimal> {
    candidates
        .into_iter()
        .flatten()
        .find(|amount| *amount > Decimal::ZERO)
}

/// Refund amount for an approved return.
///
/// First positive of: explicit amount, stored requested amount, sum of the
/// refund lines, order total. Zero when none is positive.
#[must_use]
pub fn resolve_return_refund_amount(
    explicit: Option<Decimal>,
    stored: Option<Decimal>,
    lines: &[RefundLine],
    order_total: Decimal,
) -> Decimal {
    let line_sum: Decimal = lines.iter().map(|line| line.refund_total).sum();
    first_positive([explicit, stored, Some(line_sum), Some(order_total)])
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

/// Refund amount for an approved refund request.
///
/// First positive of: explicit amount, stored requested amount, order total.
#[must_use]
pub fn resolve_refund_amount(
    explicit: Option<Decimal>,
    stored: Option<Decimal>,
    order_total: Decimal,
) -> Decimal {
    first_positive([explicit, stored, Some(order_total)])
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

// =============================================================================
// Payloads
// =============================================================================

/// Body for JLO `POST /returns`.
#[must_use]
pub fn jlo_return_payload(
    order: &Order,
    request: &ReturnRequest,
    items: &[RequestedItem],
    customer: &Contact,
    hub: Option<&Contact>,
) -> Value {
    let items: Vec<Value> = items
        .iter()
        .filter_map(|item| {
            let line = order.line_item(item.line_item_id)?;
            Some(json!({
                "line_item_id": line.id,
                "product_id": line.product_id,
                "variation_id": line.variation_id,
                "name": line.name,
                "sku": line.sku,
                "quantity": item.quantity,
                "unit_price": format_amount(line.unit_price()),
            }))
        })
        .collect();

    let mut payload = json!({
        "order_id": order.id,
        "wc_customer_id": order.customer(),
        "reason_code": request.reason_code,
        "reason_note": request.reason_note,
        "preferred_resolution": request.preferred_resolution,
        "method": request.method,
        "images": request.images,
        "items": items,
        "customer": customer,
        "order_total": format_amount(order.total),
        "currency": order.currency,
    });
    if let (Some(hub), Some(map)) = (hub, payload.as_object_mut()) {
        map.insert("hub".to_string(), json!(hub));
    }
    payload
}

// =============================================================================
// Notes and instructions
// =============================================================================

/// Audit note for an approved return.
#[must_use]
pub fn return_approval_note(
    record: &ReturnRequestRecord,
    refund: Option<&Refund>,
    amount: Decimal,
    currency: &str,
) -> String {
    let items: u32 = record.items.iter().map(|item| item.quantity).sum();
    let mut note = format!("Return request approved ({items} item(s)).");
    match refund {
        Some(refund) => note.push_str(&format!(
            " Refund #{} of {currency} {} created.",
            refund.id,
            format_amount(amount)
        )),
        None => note.push_str(" No refund issued."),
    }
    if let Some(jlo_id) = &record.jlo_return_id {
        note.push_str(&format!(" JLO return {jlo_id}."));
    }
    note
}

/// Audit note for a new refund request.
#[must_use]
pub fn refund_request_note(amount: Decimal, currency: &str, reason: &str) -> String {
    format!(
        "Refund requested by customer: {currency} {}. Reason: {reason}",
        format_amount(amount)
    )
}

/// Audit note for an approved refund request.
#[must_use]
pub fn refund_approval_note(refund: &Refund, amount: Decimal, currency: &str, restock: bool) -> String {
    format!(
        "Refund request approved. Refund #{} of {currency} {} created{}.",
        refund.id,
        format_amount(amount),
        if restock { " and items restocked" } else { "" }
    )
}

/// Audit note for a new return shipment.
#[must_use]
pub fn shipment_note(code: &ReturnCode, method: ReturnMethod, tracking: Option<&str>) -> String {
    match tracking {
        Some(tracking) => format!("Return shipment {code} created ({method}). Fez tracking: {tracking}."),
        None => format!("Return shipment {code} created ({method})."),
    }
}

/// Customer-facing instructions for a return shipment.
#[must_use]
pub fn shipment_instructions(
    code: &ReturnCode,
    tracking: Option<&str>,
    hub: Option<&Contact>,
) -> String {
    if let Some(tracking) = tracking {
        return format!(
            "A courier will contact you to collect your parcel. Label it with return code {code} \
             and keep tracking number {tracking} for reference."
        );
    }
    let destination = hub
        .and_then(|hub| match (&hub.name, &hub.address) {
            (Some(name), Some(address)) => Some(format!("{name}, {address}")),
            (None, Some(address)) => Some(address.clone()),
            (Some(name), None) => Some(name.clone()),
            (None, None) => None,
        })
        .unwrap_or_else(|| "our returns hub".to_string());
    format!("Write return code {code} clearly on your parcel and drop it off at {destination}.")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn order() -> Order {
        serde_json::from_value(json!({
            "id": 500,
            "currency": "NGN",
            "total": "16500.00",
            "customer_id": 12,
            "billing": {
                "first_name": "Ada", "last_name": "Obi",
                "email": "ada@example.ng", "phone": "08030000000",
                "address_1": "9 Billing Rd", "city": "Abuja"
            },
            "shipping": {
                "first_name": "Ada", "last_name": "Obi",
                "address_1": "4 Broad St", "address_2": "Flat 2", "city": "Lagos", "state": "LA"
            },
            "line_items": [
                { "id": 11, "name": "Adire shirt", "product_id": 90, "quantity": 2, "total": "9000.00" },
                { "id": 12, "name": "Cap", "product_id": 91, "quantity": 1, "total": "6000.00" },
                { "id": 13, "name": "Gift wrap", "product_id": 92, "quantity": 0, "total": "0" }
            ]
        }))
        .unwrap()
    }

    fn item(id: u64, quantity: u32) -> RequestedItem {
        RequestedItem {
            line_item_id: LineItemId::new(id),
            quantity,
            refund_total: None,
        }
    }

    #[test]
    fn test_derive_customer_prefers_shipping() {
        let customer = derive_customer(&order());
        assert_eq!(customer.name.as_deref(), Some("Ada Obi"));
        assert_eq!(customer.address.as_deref(), Some("4 Broad St, Flat 2"));
        assert_eq!(customer.city.as_deref(), Some("Lagos"));
        assert_eq!(customer.email.as_deref(), Some("ada@example.ng"));
        assert_eq!(customer.phone.as_deref(), Some("08030000000"));
    }

    #[test]
    fn test_derive_customer_falls_back_to_billing() {
        let mut order = order();
        order.shipping = Address::default();
        let customer = derive_customer(&order);
        assert_eq!(customer.address.as_deref(), Some("9 Billing Rd"));
        assert_eq!(customer.city.as_deref(), Some("Abuja"));
        assert_eq!(customer.state, None);
    }

    #[test]
    fn test_select_items_defaults_to_every_line() {
        let items = select_return_items(&order(), None).unwrap();
        assert_eq!(items, vec![item(11, 2), item(12, 1)]);
    }

    #[test]
    fn test_select_items_clamps_and_fills_quantity() {
        let requested = [
            ItemInput { line_item_id: LineItemId::new(11), quantity: Some(5) },
            ItemInput { line_item_id: LineItemId::new(12), quantity: None },
        ];
        let items = select_return_items(&order(), Some(&requested)).unwrap();
        assert_eq!(items, vec![item(11, 2), item(12, 1)]);
    }

    #[test]
    fn test_select_items_rejects_unknown_line() {
        let requested = [ItemInput { line_item_id: LineItemId::new(99), quantity: Some(1) }];
        let err = select_return_items(&order(), Some(&requested)).unwrap_err();
        assert_eq!(err.to_string(), "Line item 99 is not part of order 500");
    }

    #[test]
    fn test_refund_lines_clamp_and_price() {
        let lines = refund_line_items(&order(), &[item(11, 3), item(12, 1), item(99, 1), item(13, 1)]);
        assert_eq!(
            lines,
            vec![
                RefundLine { line_item_id: LineItemId::new(11), quantity: 2, refund_total: dec("9000.00") },
                RefundLine { line_item_id: LineItemId::new(12), quantity: 1, refund_total: dec("6000.00") },
            ]
        );
    }

    #[test]
    fn test_refund_lines_partial_quantity_and_stored_total() {
        let mut partial = item(11, 1);
        let lines = refund_line_items(&order(), &[partial.clone()]);
        assert_eq!(lines[0].refund_total, dec("4500.00"));

        partial.refund_total = Some(dec("4000"));
        let lines = refund_line_items(&order(), &[partial]);
        assert_eq!(lines[0].refund_total, dec("4000"));
    }

    #[test]
    fn test_apply_jlo_request_copies_customer_choices() {
        let jlo_return = json!({
            "id": "ret_1",
            "status": "requested",
            "reason_code": "damaged",
            "reason_note": " Torn seam ",
            "preferred_resolution": "replacement",
            "method": "dropoff",
            "items": [
                { "line_item_id": 11, "product_id": 90, "quantity": 1, "unit_price": "4500.00" },
                { "line_item_id": 12, "quantity": 0 },
                { "name": "no id", "quantity": 1 }
            ]
        });
        let mut record = ReturnRequestRecord::default();

        apply_jlo_request(&mut record, &jlo_return);

        assert_eq!(record.items, vec![item(11, 1)]);
        assert_eq!(record.reason_code.as_deref(), Some("damaged"));
        assert_eq!(record.reason_note.as_deref(), Some("Torn seam"));
        assert_eq!(record.preferred_resolution, PreferredResolution::Replacement);
        assert_eq!(record.method, Some(ReturnMethod::Dropoff));
        assert_eq!(record.refund_amount, None);

        // Refund lines now follow the returned shirt, not the whole order
        let lines = refund_line_items(&order(), &record.items);
        assert_eq!(
            resolve_return_refund_amount(None, record.refund_amount, &lines, dec("16500.00")),
            dec("4500.00")
        );
    }

    #[test]
    fn test_apply_jlo_request_keeps_stored_values() {
        let mut record = ReturnRequestRecord {
            reason_code: Some("wrong_size".to_string()),
            items: vec![item(12, 1)],
            refund_amount: Some(dec("5000.00")),
            ..ReturnRequestRecord::default()
        };

        apply_jlo_request(
            &mut record,
            &json!({ "status": "approved", "refund_amount": "9000.00", "items": [] }),
        );
        assert_eq!(record.items, vec![item(12, 1)]);
        assert_eq!(record.reason_code.as_deref(), Some("wrong_size"));
        assert_eq!(record.refund_amount, Some(dec("5000.00")));

        let mut record = ReturnRequestRecord::default();
        apply_jlo_request(&mut record, &json!({ "requested_amount": 3000 }));
        assert_eq!(record.refund_amount, Some(dec("3000")));
    }

    #[test]
    fn test_return_refund_amount_priority() {
        let lines = refund_line_items(&order(), &[item(11, 1)]);
        let total = dec("16500.00");

        assert_eq!(
            resolve_return_refund_amount(Some(dec("100")), Some(dec("200")), &lines, total),
            dec("100")
        );
        assert_eq!(
            resolve_return_refund_amount(None, Some(dec("200")), &lines, total),
            dec("200")
        );
        assert_eq!(resolve_return_refund_amount(None, None, &lines, total), dec("4500"));
        assert_eq!(resolve_return_refund_amount(None, None, &[], total), total);
        assert_eq!(
            resolve_return_refund_amount(None, Some(Decimal::ZERO), &[], total),
            total
        );
        assert_eq!(
            resolve_return_refund_amount(None, None, &[], Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_refund_amount_priority() {
        let total = dec("16500");
        assert_eq!(resolve_refund_amount(Some(dec("10")), Some(dec("20")), total), dec("10"));
        assert_eq!(resolve_refund_amount(None, Some(dec("20")), total), dec("20"));
        assert_eq!(resolve_refund_amount(None, None, total), total);
        assert_eq!(resolve_refund_amount(None, None, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_jlo_payload_shape() {
        let order = order();
        let request = ReturnRequest {
            reason_code: "damaged".to_string(),
            reason_note: None,
            preferred_resolution: PreferredResolution::Refund,
            method: ReturnMethod::Pickup,
            images: vec![],
            items: None,
            customer: None,
            hub: None,
        };
        let items = select_return_items(&order, None).unwrap();
        let customer = derive_customer(&order);
        let payload = jlo_return_payload(&order, &request, &items, &customer, None);

        assert_eq!(payload["order_id"], 500);
        assert_eq!(payload["wc_customer_id"], 12);
        assert_eq!(payload["preferred_resolution"], "refund");
        assert_eq!(payload["method"], "pickup");
        assert_eq!(payload["items"][0]["unit_price"], "4500.00");
        assert_eq!(payload["customer"]["city"], "Lagos");
        assert!(payload.get("hub").is_none());

        let hub = hub_contact(&HubConfig {
            name: "Ikeja Hub".to_string(),
            phone: "0800".to_string(),
            address: "1 Allen Ave".to_string(),
            city: None,
            state: None,
        });
        let payload = jlo_return_payload(&order, &request, &items, &customer, Some(&hub));
        assert_eq!(payload["hub"]["name"], "Ikeja Hub");
    }

    #[test]
    fn test_shipment_instructions() {
        let code = ReturnCode::parse("RTN-AB12CD").unwrap();
        let with_tracking = shipment_instructions(&code, Some("FEZ1"), None);
        assert!(with_tracking.contains("FEZ1"));

        let dropoff = shipment_instructions(&code, None, None);
        assert_eq!(
            dropoff,
            "Write return code RTN-AB12CD clearly on your parcel and drop it off at our returns hub."
        );

        let hub = Contact {
            name: Some("Ikeja Hub".to_string()),
            address: Some("1 Allen Ave".to_string()),
            ..Contact::default()
        };
        assert!(shipment_instructions(&code, None, Some(&hub)).ends_with("Ikeja Hub, 1 Allen Ave."));
    }

    #[test]
    fn test_notes() {
        let code = ReturnCode::parse("RTN-AB12CD").unwrap();
        assert_eq!(
            shipment_note(&code, ReturnMethod::Dropoff, None),
            "Return shipment RTN-AB12CD created (dropoff)."
        );
        assert_eq!(
            refund_request_note(dec("2500.5"), "NGN", "wrong size"),
            "Refund requested by customer: NGN 2500.50. Reason: wrong size"
        );
    }
}
