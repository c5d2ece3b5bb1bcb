//! Fez Delivery client for booking return pickups.
//!
//! Booking is best effort: the returns workflow swallows every error from
//! here and falls back to drop-off instructions.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::FezConfig;
use crate::services::upstream::{self, UpstreamError};

const SERVICE: &str = "Fez";
const TIMEOUT: Duration = Duration::from_secs(20);

/// A pickup booking request.
#[derive(Debug, Clone, Serialize)]
pub struct PickupRequest {
    /// Return code, used as the carrier reference.
    pub reference: String,
    pub order_id: u64,
    pub pickup: PickupContact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropoff: Option<PickupContact>,
    pub description: String,
}

/// Contact and address for one end of a pickup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PickupContact {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Client for the Fez API.
#[derive(Clone)]
pub struct FezClient {
    inner: Arc<FezClientInner>,
}

struct FezClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl FezClient {
    /// Create a new Fez client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &FezConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            inner: Arc::new(FezClientInner {
                client: upstream::http_client(SERVICE, TIMEOUT)?,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    /// Book a pickup and return the carrier tracking number.
    ///
    /// # Errors
    ///
    /// Returns an error if the booking fails or the response carries no
    /// tracking number.
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    pub async fn create_pickup(&self, request: &PickupRequest) -> Result<String, UpstreamError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidUrl {
                service: SERVICE,
                path: "shipments/pickup".to_string(),
            })?
            .pop_if_empty()
            .extend(["shipments", "pickup"]);

        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(self.inner.api_key.expose_secret())
            .json(request);
        let body = upstream::send(SERVICE, response).await?;

        tracking_number(&body).ok_or_else(|| UpstreamError::Decode {
            service: SERVICE,
            message: "response has no tracking number".to_string(),
        })
    }
}

/// Find the tracking number in a booking response.
fn tracking_number(body: &Value) -> Option<String> {
    let record = body.get("data").unwrap_or(body);
    ["tracking_number", "trackingNumber", "orderNo", "tracking"]
        .into_iter()
        .filter_map(|key| record.get(key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_tracking_number_shapes() {
        assert_eq!(
            tracking_number(&json!({ "data": { "tracking_number": "FEZ123" } })).as_deref(),
            Some("FEZ123")
        );
        assert_eq!(
            tracking_number(&json!({ "orderNo": "JH-77" })).as_deref(),
            Some("JH-77")
        );
        assert_eq!(tracking_number(&json!({ "data": { "tracking_number": "" } })), None);
        assert_eq!(tracking_number(&json!({ "status": "ok" })), None);
    }
}
