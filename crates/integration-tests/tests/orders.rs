//! Order lookup, order history and JLO status sync.

use axum::http::{Method, StatusCode};
use osun_integration_tests::{CUSTOMER_ID, ORDER_ID, TestApp, sample_order};
use serde_json::json;

#[tokio::test]
async fn test_invalid_order_ids_are_rejected() {
    let app = TestApp::start().await;

    let routes = [
        (Method::GET, ""),
        (Method::POST, "/return-request"),
        (Method::POST, "/return-request/approve"),
        (Method::POST, "/return-request/sync"),
        (Method::POST, "/refund-request"),
        (Method::POST, "/refund-request/approve"),
        (Method::POST, "/return-shipment"),
    ];

    for id in ["abc", "0", "-4", "1.5"] {
        for (method, suffix) in &routes {
            let uri = format!("/api/orders/{id}{suffix}");
            let body = (*method == Method::POST).then(|| json!({}));
            let (status, response) = app.send(method.clone(), &uri, body, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(response["success"], false, "{uri}");
            assert_eq!(response["message"], "Invalid order id", "{uri}");
        }
    }
    assert!(app.mocks.notes().is_empty());
}

// ============================================================================
// Order detail
// ============================================================================

#[tokio::test]
async fn test_show_order_with_returns() {
    let app = TestApp::start().await;
    app.mocks.seed_jlo_return(json!({
        "id": "ret_9",
        "order_id": ORDER_ID,
        "wc_customer_id": CUSTOMER_ID,
        "status": "in_transit"
    }));

    let (status, body) = app.get_as("/api/orders/500", CUSTOMER_ID).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order"]["id"], 500);
    assert_eq!(body["data"]["returns"][0]["id"], "ret_9");
    assert_eq!(body["data"]["summary"]["item_count"], 3);
    assert_eq!(body["data"]["summary"]["total"], "15000.00");
}

#[tokio::test]
async fn test_show_hides_other_customers_orders() {
    let app = TestApp::start().await;

    let (status, body) = app.get_as("/api/orders/500", 7).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");
}

#[tokio::test]
async fn test_show_survives_jlo_outage() {
    let app = TestApp::start().await;
    app.mocks.fail_jlo_list();

    let (status, body) = app.get("/api/orders/500").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["returns"], json!([]));
}

#[tokio::test]
async fn test_show_unknown_order_passes_upstream_status() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/api/orders/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invalid ID.");
    assert_eq!(body["status"], 404);
    assert_eq!(
        body["details"]["code"],
        "woocommerce_rest_shop_order_invalid_id"
    );
}

// ============================================================================
// Order history
// ============================================================================

#[tokio::test]
async fn test_index_requires_customer_header() {
    let app = TestApp::start().await;

    let (status, body) = app.get("/api/orders").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "x-wc-customer-id header is required");
}

#[tokio::test]
async fn test_index_lists_only_the_customers_orders() {
    let app = TestApp::start().await;
    app.mocks.insert_order(sample_order(501, 7));
    app.mocks.insert_order(sample_order(502, CUSTOMER_ID));
    app.mocks
        .set_meta(ORDER_ID, "_return_request_status", json!("pending"));

    let (status, body) = app.get_as("/api/orders?per_page=5", CUSTOMER_ID).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let orders = body["data"].as_array().cloned().unwrap_or_default();
    let ids: Vec<_> = orders.iter().map(|o| o["id"].clone()).collect();
    assert_eq!(ids, vec![json!(502), json!(500)]);
    assert_eq!(orders[1]["return_status"], "pending");
    assert!(orders[0]["return_status"].is_null());
}

// ============================================================================
// Sync
// ============================================================================

#[tokio::test]
async fn test_sync_uses_latest_return() {
    let app = TestApp::start().await;
    app.mocks.seed_jlo_return(json!({
        "id": "ret_1",
        "order_id": ORDER_ID,
        "status": "rejected",
        "created_at": "2026-02-21T10:00:00Z"
    }));
    app.mocks.seed_jlo_return(json!({
        "id": "ret_2",
        "order_id": ORDER_ID,
        "status": "refund_completed",
        "created_at": "2026-02-25T10:00:00Z"
    }));

    let (status, body) = app
        .post("/api/orders/500/return-request/sync", json!({}))
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["jlo_return_id"], "ret_2");
    assert_eq!(body["data"]["jlo_status"], "refund_completed");
    assert_eq!(body["data"]["status"], "processed");

    let stored = app
        .mocks
        .meta_document(ORDER_ID, "_return_request")
        .unwrap_or_default();
    assert_eq!(stored["status"], "processed");
    assert_eq!(stored["jlo_status"], "refund_completed");
    assert_eq!(stored["jlo_return_id"], "ret_2");
    assert!(stored["synced_at"].is_string());
    assert_eq!(
        app.mocks.meta(ORDER_ID, "_return_request_status"),
        Some(json!("processed"))
    );
}

#[tokio::test]
async fn test_sync_keeps_unknown_status_verbatim() {
    let app = TestApp::start().await;
    app.mocks.seed_jlo_return(json!({
        "id": "ret_5",
        "order_id": ORDER_ID,
        "status": "awaiting_courier"
    }));

    let (status, body) = app
        .post("/api/orders/500/return-request/sync", json!({}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["jlo_status"], "awaiting_courier");
}

#[tokio::test]
async fn test_sync_rejected_return() {
    let app = TestApp::start().await;
    app.mocks.seed_jlo_return(json!({
        "id": "ret_3",
        "order_id": ORDER_ID,
        "status": "rejected"
    }));

    let (_, body) = app
        .post("/api/orders/500/return-request/sync", json!({}))
        .await;

    assert_eq!(body["data"]["status"], "rejected");
}

#[tokio::test]
async fn test_sync_without_returns() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post("/api/orders/500/return-request/sync", json!({}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No return found for order");
    assert!(app.mocks.meta(ORDER_ID, "_return_request").is_none());
}
