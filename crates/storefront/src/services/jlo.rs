//! JLO returns and logistics API client.
//!
//! JLO owns the physical side of a return: pickup scheduling, transit, hub
//! inspection. It also prices outbound shipping. Responses are usually wrapped
//! in `{"success": true, "data": ...}` but not consistently, so callers read
//! them through [`upstream::unwrap_data`].

use std::sync::Arc;
use std::time::Duration;

use osun_core::{CustomerId, OrderId};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{HubConfig, JloConfig};
use crate::services::upstream::{self, UpstreamError};

const SERVICE: &str = "JLO";
const TIMEOUT: Duration = Duration::from_secs(20);
/// Fee calculation calls out to carriers and is much slower.
const FEE_TIMEOUT: Duration = Duration::from_secs(60);

/// Filter for listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReturnsFilter {
    pub wc_customer_id: Option<CustomerId>,
    pub order_id: Option<OrderId>,
}

/// Client for the JLO API.
#[derive(Clone)]
pub struct JloClient {
    inner: Arc<JloClientInner>,
}

struct JloClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
    hub: Option<HubConfig>,
}

impl JloClient {
    /// Create a new JLO client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &JloConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            inner: Arc::new(JloClientInner {
                client: upstream::http_client(SERVICE, TIMEOUT)?,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                hub: config.hub.clone(),
            }),
        })
    }

    /// Default returns hub, if configured.
    #[must_use]
    pub fn hub(&self) -> Option<&HubConfig> {
        self.inner.hub.as_ref()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidUrl {
                service: SERVICE,
                path: segments.join("/"),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, UpstreamError> {
        debug!(%method, path = url.path(), "JLO request");
        let mut request = self.inner.client.request(method, url);
        if let Some(key) = &self.inner.api_key {
            request = request.bearer_auth(key.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        upstream::send(SERVICE, request).await
    }

    /// Register a return.
    ///
    /// # Errors
    ///
    /// Returns an error if JLO rejects the return or is unreachable.
    #[instrument(skip(self, payload))]
    pub async fn create_return(&self, payload: &Value) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["returns"])?;
        self.request(Method::POST, url, Some(payload), None).await
    }

    /// List returns for a customer and/or order, as JLO returned them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_returns(&self, filter: ReturnsFilter) -> Result<Value, UpstreamError> {
        let mut url = self.endpoint(&["returns"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(customer) = filter.wc_customer_id {
                query.append_pair("wc_customer_id", &customer.to_string());
            }
            if let Some(order) = filter.order_id {
                query.append_pair("order_id", &order.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.request(Method::GET, url, None, None).await
    }

    /// Tracking timeline for a return.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn return_tracking(&self, return_id: &str) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["returns", return_id, "tracking"])?;
        self.request(Method::GET, url, None, None).await
    }

    /// Push a tracking update for a return shipment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_shipment_tracking(
        &self,
        shipment_id: &str,
        update: &Value,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["return-shipments", shipment_id, "tracking"])?;
        self.request(Method::POST, url, Some(update), None).await
    }

    /// Quote an outbound shipping fee.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or exceeds the fee timeout.
    #[instrument(skip(self, request))]
    pub async fn calculate_shipping_fee(&self, request: &Value) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["shipping", "calculate"])?;
        self.request(Method::POST, url, Some(request), Some(FEE_TIMEOUT))
            .await
    }
}

/// Extract the list of returns from a list response.
///
/// Accepts a bare array, `{"data": [...]}` and `{"data": {"returns": [...]}}`.
#[must_use]
pub fn returns_list(body: Value) -> Vec<Value> {
    match upstream::unwrap_data(body) {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("returns") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Extract a return id from a create or list response entry.
#[must_use]
pub fn return_id(body: &Value) -> Option<String> {
    let record = body.get("data").unwrap_or(body);
    ["id", "return_id", "_id"]
        .into_iter()
        .filter_map(|key| record.get(key))
        .chain(record.pointer("/return/id"))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
