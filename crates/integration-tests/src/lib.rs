//! Integration tests for the Osun storefront API.
//!
//! The real storefront router runs in-process against [`MockUpstreams`], a
//! local axum server standing in for WooCommerce, JLO, Fez and Paystack. No
//! network access or external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p osun-integration-tests
//! ```

pub mod mock;

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use osun_storefront::config::{
    FezConfig, HubConfig, JloConfig, PaystackConfig, RetryConfig, StorefrontConfig,
    WooCommerceConfig,
};
use osun_storefront::extract::CUSTOMER_HEADER;
use osun_storefront::routes;
use osun_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

pub use mock::{MockUpstreams, Recorded};

/// The order most tests work on.
pub const ORDER_ID: u64 = 500;
/// Owner of [`ORDER_ID`].
pub const CUSTOMER_ID: u64 = 42;

/// Which upstream sections the app under test is configured with.
#[derive(Debug, Clone, Copy)]
pub struct Services {
    pub woocommerce: bool,
    pub jlo: bool,
    pub paystack: bool,
    pub fez: bool,
    /// Configure the default JLO returns hub.
    pub hub: bool,
}

impl Services {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            woocommerce: true,
            jlo: true,
            paystack: true,
            fez: true,
            hub: false,
        }
    }
}

/// The storefront router wired to a fresh set of mock upstreams.
pub struct TestApp {
    pub mocks: MockUpstreams,
    router: Router,
}

impl TestApp {
    /// Start with every upstream configured and [`sample_order`] seeded.
    pub async fn start() -> Self {
        Self::with_services(Services::all()).await
    }

    /// Start with the given upstream sections configured.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    pub async fn with_services(services: Services) -> Self {
        let mocks = MockUpstreams::start().await;
        mocks.insert_order(sample_order(ORDER_ID, CUSTOMER_ID));

        let state = AppState::new(config(&mocks, services))
            .expect("Failed to build application state");
        let router = routes::router().with_state(state);

        Self { mocks, router }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, uri: &str, customer: u64) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, Some(customer)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), None).await
    }

    /// Send a request and decode the response body as JSON (or a JSON string
    /// for plain-text bodies).
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        customer: Option<u64>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(customer) = customer {
            request = request.header(CUSTOMER_HEADER, customer.to_string());
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }
}

fn config(mocks: &MockUpstreams, services: Services) -> StorefrontConfig {
    let mut config = StorefrontConfig::unconfigured();

    config.woocommerce = services.woocommerce.then(|| WooCommerceConfig {
        base_url: mocks.url("woo"),
        consumer_key: "ck_integration".to_string(),
        consumer_secret: SecretString::from("cs_integration"),
        gateway_refunds: false,
    });
    config.jlo = services.jlo.then(|| JloConfig {
        base_url: mocks.url("jlo"),
        api_key: Some(SecretString::from("jlo_integration")),
        hub: services.hub.then(|| HubConfig {
            name: "Osun Returns Hub".to_string(),
            phone: "08000000000".to_string(),
            address: "5 Warehouse Rd, Apapa".to_string(),
            city: Some("Lagos".to_string()),
            state: Some("LA".to_string()),
        }),
    });
    config.paystack = services.paystack.then(|| PaystackConfig {
        base_url: mocks.url("paystack"),
        secret_key: SecretString::from("sk_integration"),
    });
    config.fez = services.fez.then(|| FezConfig {
        base_url: mocks.url("fez"),
        api_key: SecretString::from("fez_integration"),
    });
    config.proxy_retry = RetryConfig {
        max_retries: 0,
        initial_delay: Duration::from_millis(1),
    };

    config
}

/// A completed NGN order with two lines: 2 x 4500 and 1 x 6000.
#[must_use]
pub fn sample_order(id: u64, customer: u64) -> Value {
    json!({
        "id": id,
        "status": "completed",
        "currency": "NGN",
        "total": "15000.00",
        "customer_id": customer,
        "date_created": "2026-02-20T14:05:00",
        "billing": {
            "first_name": "Ada",
            "last_name": "Obi",
            "address_1": "1 Marina",
            "city": "Lagos",
            "state": "LA",
            "postcode": "",
            "country": "NG",
            "email": "ada@example.com",
            "phone": "08030000000"
        },
        "shipping": {
            "first_name": "Ada",
            "last_name": "Obi",
            "address_1": "12 Allen Avenue",
            "city": "Ikeja",
            "state": "LA",
            "postcode": "",
            "country": "NG"
        },
        "line_items": [
            {
                "id": 11,
                "name": "Adire Shirt",
                "product_id": 101,
                "variation_id": 0,
                "quantity": 2,
                "subtotal": "9000.00",
                "total": "9000.00",
                "price": 4500,
                "sku": "ADR-001"
            },
            {
                "id": 12,
                "name": "Ankara Cap",
                "product_id": 102,
                "variation_id": 0,
                "quantity": 1,
                "subtotal": "6000.00",
                "total": "6000.00",
                "price": 6000,
                "sku": "ANK-002"
            }
        ],
        "meta_data": []
    })
}
