//! JLO, Paystack and WooCommerce pass-through routes, health checks and
//! behavior with upstreams left unconfigured.

use axum::http::{Method, StatusCode};
use osun_integration_tests::{CUSTOMER_ID, ORDER_ID, Services, TestApp};
use serde_json::json;

// ============================================================================
// JLO
// ============================================================================

#[tokio::test]
async fn test_returns_index_by_order_or_customer() {
    let app = TestApp::start().await;
    app.mocks.seed_jlo_return(json!({
        "id": "ret_1",
        "order_id": ORDER_ID,
        "wc_customer_id": CUSTOMER_ID,
        "status": "requested"
    }));
    app.mocks.seed_jlo_return(json!({
        "id": "ret_2",
        "order_id": 77,
        "wc_customer_id": 7,
        "status": "requested"
    }));

    let (status, body) = app.get("/api/returns?order_id=500").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["id"], "ret_1");

    let (_, body) = app.get("/api/returns?wc_customer_id=7").await;
    assert_eq!(body["data"][0]["id"], "ret_2");

    // Falls back to the trusted header
    let (_, body) = app.get_as("/api/returns", CUSTOMER_ID).await;
    assert_eq!(body["data"][0]["id"], "ret_1");

    let (status, body) = app.get("/api/returns").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "wc_customer_id or order_id is required");
}

#[tokio::test]
async fn test_returns_index_jlo_failure() {
    let app = TestApp::start().await;
    app.mocks.fail_jlo_list();

    let (status, body) = app.get("/api/returns?order_id=500").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "JLO is down for maintenance");
    assert_eq!(body["status"], 503);
}

#[tokio::test]
async fn test_create_return_passthrough() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post("/api/returns", json!({ "order_id": 500, "reason_code": "damaged" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["id"], "ret_1");
    assert_eq!(app.mocks.jlo_created()[0]["reason_code"], "damaged");

    let (status, body) = app.post("/api/returns", json!([1, 2])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Request body must be an object");
}

#[tokio::test]
async fn test_tracking_routes() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/api/returns/ret_4/tracking").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["return_id"], "ret_4");
    assert_eq!(body["data"]["events"][0]["status"], "requested");

    let (status, body) = app
        .post(
            "/api/return-shipments/shp_1/tracking",
            json!({ "tracking_number": "FEZ1", "status": "in_transit" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["shipment_id"], "shp_1");
    assert_eq!(body["data"]["tracking"]["tracking_number"], "FEZ1");
}

#[tokio::test]
async fn test_shipping_fee() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post("/api/shipping/jlo", json!({ "state": "Lagos", "weight": 2 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fee"], 2500);
    assert_eq!(body["data"]["destination"], "Lagos");

    let (status, body) = app.post("/api/shipping/jlo", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Shipping details are required");
}

// ============================================================================
// Paystack
// ============================================================================

#[tokio::test]
async fn test_verify_paystack() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post("/api/payments/verify-paystack", json!({ "reference": "ref_123" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["reference"], "ref_123");
    assert_eq!(body["data"]["status"], "success");

    let (status, body) = app
        .post("/api/payments/verify-paystack", json!({ "reference": " " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "reference is required");

    let (status, body) = app
        .post("/api/payments/verify-paystack", json!({ "reference": "unknown-ref" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Transaction reference not found");
}

#[tokio::test]
async fn test_charge_authorization_sends_kobo() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post(
            "/api/payments/charge-authorization",
            json!({
                "email": "ada@example.com",
                "amount": "2500.50",
                "authorizationCode": "AUTH_abc"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let charges = app.mocks.charges();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0]["amount"], 250_050);
    assert_eq!(charges[0]["authorization_code"], "AUTH_abc");
    assert_eq!(charges[0]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_charge_authorization_validation() {
    let app = TestApp::start().await;

    for amount in ["0", "79228162514264337593543950335"] {
        let (status, body) = app
            .post(
                "/api/payments/charge-authorization",
                json!({ "email": "ada@example.com", "amount": amount, "authorization_code": "AUTH_abc" }),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{amount}");
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "amount must be a positive number");
    }
    assert!(app.mocks.charges().is_empty());
}

// ============================================================================
// WooCommerce proxy
// ============================================================================

#[tokio::test]
async fn test_proxy_forwards_query() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/api/wc/products?per_page=5").await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(app.mocks.proxy_queries(), vec![Some("per_page=5".to_string())]);
}

#[tokio::test]
async fn test_proxy_refuses_unknown_resources() {
    let app = TestApp::start().await;

    for path in ["coupons", "system_status", "products/../settings"] {
        let (status, body) = app.get(&format!("/api/wc/{path}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body["success"], false);
    }
    assert!(app.mocks.proxy_queries().is_empty());
}

#[tokio::test]
async fn test_proxy_put_updates_order() {
    let app = TestApp::start().await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/wc/orders/500",
            Some(json!({ "meta_data": [{ "key": "gift_note", "value": "Happy birthday" }] })),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.mocks.meta(ORDER_ID, "gift_note"),
        Some(json!("Happy birthday"))
    );
}

// ============================================================================
// Health and configuration
// ============================================================================

#[tokio::test]
async fn test_health_checks() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (status, _) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}

const NOTHING: Services = Services {
    woocommerce: false,
    jlo: false,
    paystack: false,
    fez: false,
    hub: false,
};

#[tokio::test]
async fn test_unconfigured_upstreams() {
    let app = TestApp::with_services(NOTHING).await;

    let (status, _) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = app.get("/api/orders/500").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "WooCommerce is not configured");

    let (_, body) = app.get("/api/returns?order_id=500").await;
    assert_eq!(body["message"], "JLO is not configured");

    let (_, body) = app
        .post("/api/payments/verify-paystack", json!({ "reference": "ref_1" }))
        .await;
    assert_eq!(body["message"], "Paystack is not configured");
}

#[tokio::test]
async fn test_validation_runs_before_configuration_check() {
    let app = TestApp::with_services(NOTHING).await;

    let (status, body) = app
        .post("/api/orders/500/return-request", json!({ "method": "pickup" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "reason_code is required");
}

#[tokio::test]
async fn test_return_request_without_jlo() {
    let app = TestApp::with_services(Services {
        jlo: false,
        ..Services::all()
    })
    .await;

    let (status, body) = app
        .post(
            "/api/orders/500/return-request",
            json!({ "reason_code": "damaged", "method": "pickup" }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "JLO is not configured");
}
