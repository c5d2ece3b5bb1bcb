//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Liveness
//! GET  /health/ready                             - Readiness (WooCommerce configured)
//!
//! # Orders
//! GET  /api/orders                               - Order history (x-wc-customer-id)
//! GET  /api/orders/{id}                          - Order with JLO returns
//! POST /api/orders/{id}/return-request           - Submit a return to JLO
//! POST /api/orders/{id}/return-request/approve   - Approve a return (and refund)
//! POST /api/orders/{id}/return-request/sync      - Pull JLO status into the order
//! POST /api/orders/{id}/refund-request           - Record a refund request
//! POST /api/orders/{id}/refund-request/approve   - Approve a refund request
//! POST /api/orders/{id}/return-shipment          - Pickup or drop-off shipment
//!
//! # Returns (JLO)
//! GET  /api/returns                              - List by customer or order
//! POST /api/returns                              - Register a return
//! GET  /api/returns/{id}/tracking                - Return tracking
//! POST /api/return-shipments/{id}/tracking       - Push a tracking update
//!
//! # Shipping and payments
//! POST /api/shipping/jlo                         - Delivery fee quote
//! POST /api/payments/verify-paystack             - Verify a transaction
//! POST /api/payments/charge-authorization        - Charge a saved card
//!
//! # WooCommerce proxy
//! GET|POST|PUT /api/wc/{*path}                   - products, orders, customers, shipping_methods
//! ```

pub mod health;
pub mod orders;
pub mod payments;
pub mod returns;
pub mod shipping;
pub mod woocommerce;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/return-request", post(orders::submit_return))
        .route("/{id}/return-request/approve", post(orders::approve_return))
        .route("/{id}/return-request/sync", post(orders::sync_return_status))
        .route("/{id}/refund-request", post(orders::submit_refund))
        .route("/{id}/refund-request/approve", post(orders::approve_refund))
        .route("/{id}/return-shipment", post(orders::create_return_shipment))
}

/// Create the JLO return routes router.
pub fn return_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(returns::index).post(returns::create))
        .route("/{id}/tracking", get(returns::tracking))
}

/// Create all API routes under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", order_routes())
        .nest("/returns", return_routes())
        .route(
            "/return-shipments/{id}/tracking",
            post(returns::update_shipment_tracking),
        )
        .route("/shipping/jlo", post(shipping::calculate_fee))
        .route("/payments/verify-paystack", post(payments::verify))
        .route(
            "/payments/charge-authorization",
            post(payments::charge_authorization),
        )
        .route(
            "/wc/{*path}",
            get(woocommerce::proxy)
                .post(woocommerce::proxy)
                .put(woocommerce::proxy),
        )
}

/// Create the full storefront router with request tracing.
///
/// Rate limiting is added by the binary, which serves with connect info.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
}
