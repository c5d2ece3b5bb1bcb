//! WooCommerce REST API v3 client.
//!
//! Authenticates with consumer key/secret over HTTP basic auth. Typed methods
//! cover the order operations the returns workflow needs; [`WooClient::proxy`]
//! passes allow-listed requests through for the browser.

mod types;

pub use types::{
    Address, LineItem, MetaEntry, MetaUpdate, Order, OrderNote, Refund, RefundCreate,
    RefundLineCreate,
};

use std::sync::Arc;
use std::time::Duration;

use osun_core::{CustomerId, OrderId};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use crate::config::{RetryConfig, WooCommerceConfig};
use crate::services::retry::retry_transient;
use crate::services::upstream::{self, UpstreamError};

const SERVICE: &str = "WooCommerce";
const TIMEOUT: Duration = Duration::from_secs(30);
const API_PATH: [&str; 3] = ["wp-json", "wc", "v3"];

/// First path segments the browser may reach through [`WooClient::proxy`].
pub const PROXY_ALLOWED_RESOURCES: &[&str] =
    &["products", "orders", "customers", "shipping_methods"];

/// Largest page size accepted when listing a customer's orders.
pub const MAX_PER_PAGE: u32 = 50;

// =============================================================================
// WooClient
// =============================================================================

/// Client for the WooCommerce REST API.
#[derive(Clone)]
pub struct WooClient {
    inner: Arc<WooClientInner>,
}

struct WooClientInner {
    client: reqwest::Client,
    base_url: Url,
    consumer_key: String,
    consumer_secret: SecretString,
    gateway_refunds: bool,
    proxy_retry: RetryConfig,
}

impl WooClient {
    /// Create a new WooCommerce client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &WooCommerceConfig, proxy_retry: RetryConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            inner: Arc::new(WooClientInner {
                client: upstream::http_client(SERVICE, TIMEOUT)?,
                base_url: config.base_url.clone(),
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
                gateway_refunds: config.gateway_refunds,
                proxy_retry,
            }),
        })
    }

    /// Whether refunds are pushed to the payment gateway.
    #[must_use]
    pub fn gateway_refunds(&self) -> bool {
        self.inner.gateway_refunds
    }

    /// Build `{base}/wp-json/wc/v3/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidUrl {
                service: SERVICE,
                path: segments.join("/"),
            })?
            .pop_if_empty()
            .extend(API_PATH)
            .extend(segments);
        Ok(url)
    }

    /// Send an authenticated request and normalize the response.
    async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Value, UpstreamError> {
        debug!(%method, path = url.path(), "WooCommerce request");
        let mut request = self
            .inner
            .client
            .request(method, url)
            .basic_auth(
                &self.inner.consumer_key,
                Some(self.inner.consumer_secret.expose_secret()),
            );
        if let Some(body) = body {
            request = request.json(body);
        }
        upstream::send(SERVICE, request).await
    }

    async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<T, UpstreamError> {
        let value = self.request(method, url, body).await?;
        serde_json::from_value(value).map_err(|e| UpstreamError::decode(SERVICE, &e))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Fetch a single order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, UpstreamError> {
        let url = self.endpoint(&["orders", &id.to_string()])?;
        self.request_as(Method::GET, url, None).await
    }

    /// List a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(customer_id = %customer))]
    pub async fn list_orders(
        &self,
        customer: CustomerId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Order>, UpstreamError> {
        let mut url = self.endpoint(&["orders"])?;
        url.query_pairs_mut()
            .append_pair("customer", &customer.to_string())
            .append_pair("page", &page.max(1).to_string())
            .append_pair("per_page", &per_page.clamp(1, MAX_PER_PAGE).to_string())
            .append_pair("orderby", "date")
            .append_pair("order", "desc");
        self.request_as(Method::GET, url, None).await
    }

    /// Replace the given meta keys on an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, entries), fields(order_id = %id, keys = entries.len()))]
    pub async fn update_order_meta(
        &self,
        id: OrderId,
        entries: &[MetaUpdate],
    ) -> Result<Order, UpstreamError> {
        let url = self.endpoint(&["orders", &id.to_string()])?;
        let body = json!({ "meta_data": entries });
        self.request_as(Method::PUT, url, Some(&body)).await
    }

    /// Create a refund on an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, e.g. when the amount exceeds
    /// what remains refundable.
    #[instrument(skip(self, refund), fields(order_id = %id, amount = %refund.amount))]
    pub async fn create_refund(
        &self,
        id: OrderId,
        refund: &RefundCreate,
    ) -> Result<Refund, UpstreamError> {
        let url = self.endpoint(&["orders", &id.to_string(), "refunds"])?;
        let body = serde_json::to_value(refund).map_err(|e| UpstreamError::decode(SERVICE, &e))?;
        self.request_as(Method::POST, url, Some(&body)).await
    }

    /// Add a private note to an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, note), fields(order_id = %id))]
    pub async fn add_order_note(&self, id: OrderId, note: &str) -> Result<OrderNote, UpstreamError> {
        let url = self.endpoint(&["orders", &id.to_string(), "notes"])?;
        let body = json!({ "note": note, "customer_note": false });
        self.request_as(Method::POST, url, Some(&body)).await
    }

    // =========================================================================
    // Proxy
    // =========================================================================

    /// Forward a request to `{api}/{path}?{query}`, retrying transient failures.
    ///
    /// `path` must start with one of [`PROXY_ALLOWED_RESOURCES`]; callers check
    /// this with [`proxy_path_allowed`] before calling.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries.
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn proxy(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value, UpstreamError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut url = self.endpoint(&segments)?;
        url.set_query(query.filter(|q| !q.is_empty()));

        retry_transient(self.inner.proxy_retry, "woocommerce_proxy", || {
            self.request(method.clone(), url.clone(), body.as_ref())
        })
        .await
    }
}

/// Whether `path` targets a resource the proxy exposes.
#[must_use]
pub fn proxy_path_allowed(path: &str) -> bool {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let Some(first) = segments.next() else {
        return false;
    };
    PROXY_ALLOWED_RESOURCES.contains(&first) && !path.split('/').any(|s| s == "..")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::services::retry::Transient;

    const FAST_RETRY: RetryConfig = RetryConfig {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
    };

    fn client_with(base: &str, proxy_retry: RetryConfig) -> WooClient {
        let config = WooCommerceConfig {
            base_url: Url::parse(base).unwrap(),
            consumer_key: "ck_test".to_string(),
            consumer_secret: SecretString::from("cs_test"),
            gateway_refunds: false,
        };
        WooClient::new(&config, proxy_retry).unwrap()
    }

    fn client(base: &str) -> WooClient {
        client_with(base, RetryConfig::default())
    }

    /// A server that reads each request and hangs up without answering.
    /// Returns its base URL and the number of connections it accepted.
    async fn hang_up_server() -> (String, Arc<AtomicU32>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
            }
        });
        (format!("http://{addr}"), accepted)
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let woo = client_with(&format!("http://{addr}"), FAST_RETRY);
        let err = woo.get_order(OrderId::new(500)).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport { .. }), "{err}");
        assert!(err.is_transient(), "{err}");
        assert_eq!(err.public_message(), "WooCommerce is unavailable");
    }

    #[tokio::test]
    async fn test_proxy_retries_dropped_connections() {
        let (base, accepted) = hang_up_server().await;
        let woo = client_with(&base, FAST_RETRY);

        let err = woo
            .proxy(Method::GET, "products", Some("per_page=5"), None)
            .await
            .unwrap_err();

        assert!(err.is_transient(), "{err}");
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_order_writes_are_not_retried() {
        let (base, accepted) = hang_up_server().await;
        let woo = client_with(&base, FAST_RETRY);

        let err = woo
            .update_order_meta(OrderId::new(500), &[])
            .await
            .unwrap_err();

        assert!(err.is_transient(), "{err}");
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_endpoint_joins_api_path() {
        let woo = client("https://shop.example.ng");
        assert_eq!(
            woo.endpoint(&["orders", "500"]).unwrap().as_str(),
            "https://shop.example.ng/wp-json/wc/v3/orders/500"
        );
    }

    #[test]
    fn test_endpoint_keeps_subdirectory_install() {
        let woo = client("https://example.ng/shop/");
        assert_eq!(
            woo.endpoint(&["orders"]).unwrap().as_str(),
            "https://example.ng/shop/wp-json/wc/v3/orders"
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let woo = client("https://shop.example.ng");
        let url = woo.endpoint(&["products", "a b?c"]).unwrap();
        assert_eq!(url.path(), "/wp-json/wc/v3/products/a%20b%3Fc");
    }

    #[test]
    fn test_proxy_path_allowed() {
        assert!(proxy_path_allowed("products"));
        assert!(proxy_path_allowed("products/12/variations"));
        assert!(proxy_path_allowed("/orders/5"));
        assert!(proxy_path_allowed("shipping_methods"));
        assert!(!proxy_path_allowed("settings/general"));
        assert!(!proxy_path_allowed(""));
        assert!(!proxy_path_allowed("products/../settings"));
        assert!(!proxy_path_allowed("system_status"));
    }
}
