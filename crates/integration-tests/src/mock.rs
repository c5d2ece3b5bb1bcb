//! In-process mock of the storefront's upstreams.
//!
//! One axum server answers for every upstream under its own path prefix:
//!
//! - `/woo/wp-json/wc/v3/...` - WooCommerce orders, refunds, notes, products
//! - `/jlo/...` - JLO returns, tracking and shipping fees
//! - `/fez/...` - Fez pickups
//! - `/paystack/...` - Paystack verify and charge
//!
//! Orders live in memory, so metadata written by one request is visible to the
//! next, the way WooCommerce behaves.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A request body recorded against an order.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub order_id: u64,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    orders: Mutex<HashMap<u64, Value>>,
    refunds: Mutex<Vec<Recorded>>,
    notes: Mutex<Vec<Recorded>>,
    fail_notes: AtomicBool,
    jlo_created: Mutex<Vec<Value>>,
    jlo_returns: Mutex<Vec<Value>>,
    jlo_reject: Mutex<Option<(u16, Value)>>,
    fail_jlo_list: AtomicBool,
    fez_requests: Mutex<Vec<Value>>,
    fez_tracking: Mutex<Option<String>>,
    charges: Mutex<Vec<Value>>,
    proxy_queries: Mutex<Vec<Option<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the running mock server.
#[derive(Clone)]
pub struct MockUpstreams {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstreams {
    /// Bind to an ephemeral port and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock upstream listener");
        let addr = listener
            .local_addr()
            .expect("Mock upstream listener has no address");

        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL for one upstream, e.g. `http://127.0.0.1:1234/jlo/`.
    ///
    /// # Panics
    ///
    /// Panics if the URL does not parse, which cannot happen for a socket address.
    #[must_use]
    pub fn url(&self, prefix: &str) -> url::Url {
        url::Url::parse(&format!("http://{}/{prefix}/", self.addr))
            .expect("Mock upstream URL is valid")
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    pub fn insert_order(&self, order: Value) {
        let id = order["id"].as_u64().unwrap_or_default();
        lock(&self.state.orders).insert(id, order);
    }

    /// Store a meta entry on an order, replacing any entry with the same key.
    pub fn set_meta(&self, order_id: u64, key: &str, value: Value) {
        let mut orders = lock(&self.state.orders);
        if let Some(order) = orders.get_mut(&order_id) {
            upsert_meta(order, key, value);
        }
    }

    /// Add a return to what JLO lists for `GET /returns`; each needs an
    /// `order_id`. Returns created through `POST /returns` are listed too.
    pub fn seed_jlo_return(&self, jlo_return: Value) {
        lock(&self.state.jlo_returns).push(jlo_return);
    }

    /// Make `POST /jlo/returns` answer with this status and body.
    pub fn reject_jlo_returns(&self, status: u16, body: Value) {
        *lock(&self.state.jlo_reject) = Some((status, body));
    }

    pub fn fail_jlo_list(&self) {
        self.state.fail_jlo_list.store(true, Ordering::SeqCst);
    }

    /// Tracking number Fez returns; `None` makes every booking fail with 503.
    pub fn set_fez_tracking(&self, tracking: Option<&str>) {
        *lock(&self.state.fez_tracking) = tracking.map(String::from);
    }

    pub fn fail_notes(&self) {
        self.state.fail_notes.store(true, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn order(&self, order_id: u64) -> Option<Value> {
        lock(&self.state.orders).get(&order_id).cloned()
    }

    /// Raw meta value stored under `key`.
    #[must_use]
    pub fn meta(&self, order_id: u64, key: &str) -> Option<Value> {
        let order = self.order(order_id)?;
        order["meta_data"]
            .as_array()?
            .iter()
            .find(|entry| entry["key"] == key)
            .map(|entry| entry["value"].clone())
    }

    /// Meta value stored under `key`, decoded from its JSON string.
    #[must_use]
    pub fn meta_document(&self, order_id: u64, key: &str) -> Option<Value> {
        match self.meta(order_id, key)? {
            Value::String(s) => serde_json::from_str(&s).ok(),
            other => Some(other),
        }
    }

    #[must_use]
    pub fn refunds(&self) -> Vec<Recorded> {
        lock(&self.state.refunds).clone()
    }

    #[must_use]
    pub fn notes(&self) -> Vec<Recorded> {
        lock(&self.state.notes).clone()
    }

    #[must_use]
    pub fn jlo_created(&self) -> Vec<Value> {
        lock(&self.state.jlo_created).clone()
    }

    #[must_use]
    pub fn fez_requests(&self) -> Vec<Value> {
        lock(&self.state.fez_requests).clone()
    }

    #[must_use]
    pub fn charges(&self) -> Vec<Value> {
        lock(&self.state.charges).clone()
    }

    #[must_use]
    pub fn proxy_queries(&self) -> Vec<Option<String>> {
        lock(&self.state.proxy_queries).clone()
    }
}

fn upsert_meta(order: &mut Value, key: &str, value: Value) {
    let Some(meta) = order["meta_data"].as_array_mut() else {
        order["meta_data"] = json!([{ "id": 1, "key": key, "value": value }]);
        return;
    };
    if let Some(existing) = meta.iter_mut().find(|entry| entry["key"] == key) {
        existing["value"] = value;
    } else {
        let id = meta.len() + 1;
        meta.push(json!({ "id": id, "key": key, "value": value }));
    }
}

type Shared = State<Arc<MockState>>;

fn router(state: Arc<MockState>) -> Router {
    let woo = Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order).put(update_order))
        .route("/orders/{id}/refunds", post(create_refund))
        .route("/orders/{id}/notes", post(create_note))
        .route("/products", get(list_products));

    let jlo = Router::new()
        .route("/returns", get(list_returns).post(create_return))
        .route("/returns/{id}/tracking", get(return_tracking))
        .route("/return-shipments/{id}/tracking", post(shipment_tracking))
        .route("/shipping/calculate", post(shipping_fee));

    let paystack = Router::new()
        .route("/transaction/verify/{reference}", get(verify_transaction))
        .route("/transaction/charge_authorization", post(charge_authorization));

    Router::new()
        .nest("/woo/wp-json/wc/v3", woo)
        .nest("/jlo", jlo)
        .route("/fez/shipments/pickup", post(book_pickup))
        .nest("/paystack", paystack)
        .with_state(state)
}

// =============================================================================
// WooCommerce
// =============================================================================

fn invalid_order_id() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": "woocommerce_rest_shop_order_invalid_id",
            "message": "Invalid ID.",
            "data": { "status": 404 }
        })),
    )
        .into_response()
}

async fn get_order(State(state): Shared, Path(id): Path<u64>) -> Response {
    lock(&state.orders)
        .get(&id)
        .map_or_else(invalid_order_id, |order| Json(order.clone()).into_response())
}

async fn list_orders(
    State(state): Shared,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let customer = query.get("customer").and_then(|c| c.parse::<u64>().ok());
    let mut orders: Vec<Value> = lock(&state.orders)
        .values()
        .filter(|order| customer.is_none_or(|c| order["customer_id"] == c))
        .cloned()
        .collect();
    orders.sort_by_key(|order| std::cmp::Reverse(order["id"].as_u64()));
    Json(Value::Array(orders))
}

async fn update_order(
    State(state): Shared,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut orders = lock(&state.orders);
    let Some(order) = orders.get_mut(&id) else {
        return invalid_order_id();
    };
    for entry in body["meta_data"].as_array().into_iter().flatten() {
        if let Some(key) = entry["key"].as_str() {
            upsert_meta(order, key, entry["value"].clone());
        }
    }
    Json(order.clone()).into_response()
}

async fn create_refund(
    State(state): Shared,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if !lock(&state.orders).contains_key(&id) {
        return invalid_order_id();
    }
    let mut refunds = lock(&state.refunds);
    refunds.push(Recorded {
        order_id: id,
        body: body.clone(),
    });
    let refund_id = 900 + refunds.len();
    Json(json!({
        "id": refund_id,
        "amount": body["amount"],
        "reason": body["reason"],
        "date_created": "2026-03-02T09:30:00"
    }))
    .into_response()
}

async fn create_note(
    State(state): Shared,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if state.fail_notes.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "code": "internal_error", "message": "Could not add note" })),
        )
            .into_response();
    }
    let mut notes = lock(&state.notes);
    notes.push(Recorded {
        order_id: id,
        body: body.clone(),
    });
    Json(json!({
        "id": 700 + notes.len(),
        "note": body["note"],
        "customer_note": false
    }))
    .into_response()
}

async fn list_products(State(state): Shared, RawQuery(query): RawQuery) -> Json<Value> {
    lock(&state.proxy_queries).push(query);
    Json(json!([
        { "id": 101, "name": "Adire Shirt", "price": "4500" },
        { "id": 102, "name": "Ankara Cap", "price": "6000" }
    ]))
}

// =============================================================================
// JLO
// =============================================================================

async fn create_return(State(state): Shared, Json(body): Json<Value>) -> Response {
    if let Some((status, reject)) = lock(&state.jlo_reject).clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        return (status, Json(reject)).into_response();
    }
    let mut created = lock(&state.jlo_created);
    created.push(body.clone());
    let id = format!("ret_{}", created.len());

    // Later listings return the stored request, like JLO does
    let mut stored = body.clone();
    if let Some(map) = stored.as_object_mut() {
        map.insert("id".to_string(), json!(id));
        map.insert("status".to_string(), json!("requested"));
        map.insert(
            "created_at".to_string(),
            json!(format!("2026-03-01T10:{:02}:00Z", created.len())),
        );
    }
    lock(&state.jlo_returns).push(stored);

    Json(json!({
        "success": true,
        "data": {
            "id": id,
            "order_id": body["order_id"],
            "status": "requested"
        }
    }))
    .into_response()
}

async fn list_returns(
    State(state): Shared,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if state.fail_jlo_list.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "success": false, "message": "JLO is down for maintenance" })),
        )
            .into_response();
    }
    let order_id = query.get("order_id").and_then(|o| o.parse::<u64>().ok());
    let customer = query.get("wc_customer_id").and_then(|c| c.parse::<u64>().ok());
    let returns: Vec<Value> = lock(&state.jlo_returns)
        .iter()
        .filter(|r| order_id.is_none_or(|o| r["order_id"] == o))
        .filter(|r| customer.is_none_or(|c| r["wc_customer_id"] == c))
        .cloned()
        .collect();
    Json(json!({ "success": true, "data": returns })).into_response()
}

async fn return_tracking(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "return_id": id,
            "events": [{ "status": "requested", "at": "2026-03-01T10:00:00Z" }]
        }
    }))
}

async fn shipment_tracking(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "success": true, "data": { "shipment_id": id, "tracking": body } }))
}

async fn shipping_fee(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": { "fee": 2500, "currency": "NGN", "destination": body["state"] }
    }))
}

// =============================================================================
// Fez
// =============================================================================

async fn book_pickup(State(state): Shared, Json(body): Json<Value>) -> Response {
    lock(&state.fez_requests).push(body);
    match lock(&state.fez_tracking).clone() {
        Some(tracking) => Json(json!({
            "status": "Success",
            "data": { "tracking_number": tracking }
        }))
        .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "Pickup service unavailable" })),
        )
            .into_response(),
    }
}

// =============================================================================
// Paystack
// =============================================================================

async fn verify_transaction(Path(reference): Path<String>) -> Response {
    if reference == "unknown-ref" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": false, "message": "Transaction reference not found" })),
        )
            .into_response();
    }
    Json(json!({
        "status": true,
        "message": "Verification successful",
        "data": { "reference": reference, "status": "success", "amount": 250_050 }
    }))
    .into_response()
}

async fn charge_authorization(State(state): Shared, Json(body): Json<Value>) -> Json<Value> {
    lock(&state.charges).push(body.clone());
    Json(json!({
        "status": true,
        "message": "Charge attempted",
        "data": { "amount": body["amount"], "status": "success" }
    }))
}
