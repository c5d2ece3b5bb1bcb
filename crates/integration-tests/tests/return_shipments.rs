//! Return shipments: return codes, Fez pickups and the drop-off fallback.

use axum::http::StatusCode;
use osun_integration_tests::{ORDER_ID, Services, TestApp};
use serde_json::{Value, json};

fn assert_return_code(code: &Value) {
    let code = code.as_str().unwrap_or_default();
    let suffix = code.strip_prefix("RTN-").unwrap_or_default();
    assert_eq!(suffix.len(), 6, "{code}");
    assert!(
        suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
        "{code}"
    );
}

#[tokio::test]
async fn test_pickup_with_fez_tracking() {
    let app = TestApp::start().await;
    app.mocks.set_fez_tracking(Some("FEZ123456"));

    let (status, body) = app
        .post(
            "/api/orders/500/return-shipment",
            json!({ "method": "pickup" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["fez_tracking"], "FEZ123456");
    assert_eq!(body["method"], "pickup");
    assert_return_code(&body["return_code"]);

    let requests = app.mocks.fez_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["pickup"]["address"], "12 Allen Avenue");
    assert_eq!(requests[0]["pickup"]["name"], "Ada Obi");
    assert_eq!(requests[0]["reference"], body["return_code"]);

    let stored = app
        .mocks
        .meta_document(ORDER_ID, "_return_shipment")
        .unwrap_or_default();
    assert_eq!(stored["schema"], "return_shipment.v1");
    assert_eq!(stored["fez_tracking"], "FEZ123456");
    assert_eq!(stored["return_code"], body["return_code"]);
}

#[tokio::test]
async fn test_pickup_failure_falls_back_to_dropoff() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post(
            "/api/orders/500/return-shipment",
            json!({ "method": "pickup" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert!(body["fez_tracking"].is_null());
    assert_return_code(&body["return_code"]);
    let instructions = body["instructions"].as_str().unwrap_or_default();
    assert!(instructions.contains("drop it off"), "{instructions}");
    assert_eq!(app.mocks.fez_requests().len(), 1);

    let stored = app
        .mocks
        .meta_document(ORDER_ID, "_return_shipment")
        .unwrap_or_default();
    assert!(stored["fez_tracking"].is_null());
    assert_eq!(stored["method"], "pickup");
}

#[tokio::test]
async fn test_dropoff_never_calls_fez() {
    let app = TestApp::start().await;
    app.mocks.set_fez_tracking(Some("FEZ123456"));

    let (status, body) = app
        .post(
            "/api/orders/500/return-shipment",
            json!({ "method": "dropoff" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["fez_tracking"].is_null());
    assert!(app.mocks.fez_requests().is_empty());
    assert_eq!(app.mocks.notes().len(), 1);
}

#[tokio::test]
async fn test_dropoff_instructions_name_configured_hub() {
    let app = TestApp::with_services(Services {
        hub: true,
        ..Services::all()
    })
    .await;

    let (_, body) = app
        .post(
            "/api/orders/500/return-shipment",
            json!({ "method": "dropoff" }),
        )
        .await;

    let instructions = body["instructions"].as_str().unwrap_or_default();
    assert!(instructions.contains("Osun Returns Hub"), "{instructions}");
}

#[tokio::test]
async fn test_pickup_without_fez_configured() {
    let app = TestApp::with_services(Services {
        fez: false,
        ..Services::all()
    })
    .await;

    let (status, body) = app
        .post(
            "/api/orders/500/return-shipment",
            json!({ "method": "pickup" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["fez_tracking"].is_null());
    assert!(app.mocks.fez_requests().is_empty());
}

#[tokio::test]
async fn test_return_code_is_issued_once() {
    let app = TestApp::start().await;
    app.mocks.set_fez_tracking(Some("FEZ123456"));

    let (status, first) = app
        .post(
            "/api/orders/500/return-shipment",
            json!({ "method": "dropoff" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_return_code(&first["return_code"]);

    let (status, second) = app
        .post(
            "/api/orders/500/return-shipment",
            json!({ "method": "pickup" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{second}");
    assert_eq!(second["return_code"], first["return_code"]);
    assert_eq!(second["method"], "dropoff");
    assert!(second["fez_tracking"].is_null());

    // No second booking, record or note
    assert!(app.mocks.fez_requests().is_empty());
    assert_eq!(app.mocks.notes().len(), 1);
    let stored = app
        .mocks
        .meta_document(ORDER_ID, "_return_shipment")
        .unwrap_or_default();
    assert_eq!(stored["return_code"], first["return_code"]);
    assert_eq!(stored["method"], "dropoff");
}

#[tokio::test]
async fn test_shipment_requires_method() {
    let app = TestApp::start().await;

    let (status, body) = app
        .post("/api/orders/500/return-shipment", json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "method is required");

    let (status, _) = app
        .post(
            "/api/orders/500/return-shipment",
            json!({ "method": "teleport" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.mocks.meta(ORDER_ID, "_return_shipment").is_none());
}
