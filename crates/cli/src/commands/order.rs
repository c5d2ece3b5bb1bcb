//! Order inspection and manual return-status reconciliation.
//!
//! # Environment Variables
//!
//! - `WOOCOMMERCE_URL`, `WOOCOMMERCE_CONSUMER_KEY`, `WOOCOMMERCE_CONSUMER_SECRET`
//! - `JLO_API_URL` (for `sync`)

use osun_core::OrderId;
use osun_core::meta::{
    MetaDocument, RefundRequestRecord, ReturnRequestRecord, ReturnShipmentRecord,
};
use osun_storefront::config::StorefrontConfig;
use osun_storefront::services::jlo::JloClient;
use osun_storefront::services::returns::{OrderSummary, ReturnsService};
use osun_storefront::services::woocommerce::{Order, WooClient};
use serde::Serialize;
use serde_json::Value;

use super::{CommandError, print_json};

/// Decoded state of one metadata document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
enum Decoded<T> {
    Absent,
    Present(T),
    /// Stored but undecodable; the workflow treats it as absent.
    Invalid(String),
}

impl<T: MetaDocument> Decoded<T> {
    fn from_order(order: &Order) -> Self {
        match order.document::<T>() {
            Ok(Some(doc)) => Self::Present(doc),
            Ok(None) => Self::Absent,
            Err(e) => Self::Invalid(e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Inspection {
    summary: OrderSummary,
    return_request: Decoded<ReturnRequestRecord>,
    refund_request: Decoded<RefundRequestRecord>,
    return_shipment: Decoded<ReturnShipmentRecord>,
    /// Raw entries for the keys above, as stored.
    raw_meta: Vec<(String, Value)>,
}

impl Inspection {
    fn of(order: &Order) -> Self {
        let keys = [
            ReturnRequestRecord::KEY,
            RefundRequestRecord::KEY,
            ReturnShipmentRecord::KEY,
        ];
        Self {
            summary: OrderSummary::from(order),
            return_request: Decoded::from_order(order),
            refund_request: Decoded::from_order(order),
            return_shipment: Decoded::from_order(order),
            raw_meta: order
                .meta_data
                .iter()
                .filter(|entry| keys.contains(&entry.key.as_str()))
                .map(|entry| (entry.key.clone(), entry.value.clone()))
                .collect(),
        }
    }
}

fn woo_client(config: &StorefrontConfig) -> Result<WooClient, CommandError> {
    let woo = config
        .woocommerce
        .as_ref()
        .ok_or(CommandError::NotConfigured("WooCommerce"))?;
    Ok(WooClient::new(woo, config.proxy_retry)?)
}

/// Fetch an order and print its decoded workflow metadata.
///
/// # Errors
///
/// Returns an error if WooCommerce is not configured or the fetch fails.
pub async fn inspect(id: OrderId) -> Result<(), CommandError> {
    let config = StorefrontConfig::from_env()?;
    let woo = woo_client(&config)?;

    tracing::info!(order_id = %id, "Fetching order");
    let order = woo.get_order(id).await?;

    print_json(&Inspection::of(&order))
}

/// Run one return-status sync for an order.
///
/// # Errors
///
/// Returns an error if WooCommerce or JLO is not configured, JLO has no
/// return for the order, or an upstream call fails.
pub async fn sync(id: OrderId) -> Result<(), CommandError> {
    let config = StorefrontConfig::from_env()?;
    let woo = woo_client(&config)?;
    let jlo = config
        .jlo
        .as_ref()
        .map(JloClient::new)
        .transpose()?
        .ok_or(CommandError::NotConfigured("JLO"))?;

    let synced = ReturnsService::new(&woo, Some(&jlo), None)
        .sync_return_status(id)
        .await?;

    tracing::info!(
        order_id = %id,
        jlo_status = %synced.jlo_status,
        status = %synced.status,
        "Return status synced"
    );
    print_json(&synced)
}
