//! Paystack transaction API client.
//!
//! Paystack reports failures as `{"status": false, "message": ...}`, which the
//! shared normalizer treats like `success: false`. Amounts on the wire are in
//! kobo (1/100 naira).

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::PaystackConfig;
use crate::services::upstream::{self, UpstreamError};

const SERVICE: &str = "Paystack";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Convert a major-unit amount (naira) to kobo, rounding half-up to the kobo.
///
/// Returns `None` for non-positive amounts or values that do not fit in `u64`.
#[must_use]
pub fn to_kobo(amount: Decimal) -> Option<u64> {
    if amount <= Decimal::ZERO {
        return None;
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .filter(|kobo| *kobo > 0)
}

/// Body for `POST /transaction/charge_authorization`.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeAuthorization {
    pub email: String,
    /// Amount in kobo.
    pub amount: u64,
    pub authorization_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Client for the Paystack API.
#[derive(Clone)]
pub struct PaystackClient {
    inner: Arc<PaystackClientInner>,
}

struct PaystackClientInner {
    client: reqwest::Client,
    base_url: Url,
    secret_key: SecretString,
}

impl PaystackClient {
    /// Create a new Paystack client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &PaystackConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            inner: Arc::new(PaystackClientInner {
                client: upstream::http_client(SERVICE, TIMEOUT)?,
                base_url: config.base_url.clone(),
                secret_key: config.secret_key.clone(),
            }),
        })
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
    ) -> Result<Value, UpstreamError> {
        let mut request = self
            .inner
            .client
            .request(method, url)
            .bearer_auth(self.inner.secret_key.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }
        upstream::send(SERVICE, request).await
    }

    /// Verify a transaction by reference.
    ///
    /// # Errors
    ///
    /// Returns an error if Paystack rejects the reference or is unreachable.
    #[instrument(skip(self))]
    pub async fn verify_transaction(&self, reference: &str) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["transaction", "verify", reference])?;
        self.request(Method::GET, url, None).await
    }

    /// Charge a saved card authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if the charge is declined or Paystack is unreachable.
    #[instrument(skip(self, charge), fields(amount_kobo = charge.amount))]
    pub async fn charge_authorization(
        &self,
        charge: &ChargeAuthorization,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(&["transaction", "charge_authorization"])?;
        let body = serde_json::to_value(charge).map_err(|e| UpstreamError::decode(SERVICE, &e))?;
        self.request(Method::POST, url, Some(&body)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_to_kobo() {
        assert_eq!(to_kobo(Decimal::from(1500)), Some(150_000));
        assert_eq!(to_kobo(Decimal::from_str("12.345").unwrap()), Some(1235));
        assert_eq!(to_kobo(Decimal::from_str("0.004").unwrap()), None);
        assert_eq!(to_kobo(Decimal::ZERO), None);
        assert_eq!(to_kobo(Decimal::from(-5)), None);
    }

    #[test]
    fn test_to_kobo_out_of_range() {
        assert_eq!(to_kobo(Decimal::MAX), None);
        // Fits in a Decimal, not in u64 kobo
        assert_eq!(to_kobo(Decimal::from(u64::MAX)), None);
    }

    #[test]
    fn test_verify_endpoint() {
        let client = PaystackClient::new(&PaystackConfig {
            base_url: Url::parse("https://api.paystack.co").unwrap(),
            secret_key: SecretString::from("sk_test"),
        })
        .unwrap();
        assert_eq!(
            client
                .endpoint(&["transaction", "verify", "ref 1"])
                .unwrap()
                .as_str(),
            "https://api.paystack.co/transaction/verify/ref%201"
        );
    }
}
