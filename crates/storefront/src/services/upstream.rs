//! Response normalization shared by every upstream client.
//!
//! WooCommerce, JLO, Paystack and Fez disagree on how they report failure:
//!
//! - WooCommerce: non-2xx with `{"code", "message", "data": {"status"}}`
//! - JLO: sometimes 200 with `{"success": false, "message"}`
//! - Paystack: `{"status": false, "message"}` (boolean `status`)
//! - Any of them: an HTML error page from a proxy in front of the API
//!
//! [`read_upstream`] folds all of that into `Result<Value, UpstreamError>` so
//! callers only ever see a parsed JSON body or a typed failure with a usable
//! message.

use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;

/// Errors that can occur when talking to an upstream HTTP API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("{service} client could not be built: {source}")]
    Build {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a failure status or an explicit failure body.
    #[error("{service} responded {status}: {message}")]
    Rejected {
        service: &'static str,
        status: u16,
        message: String,
        /// Parsed upstream body. Logged; only its `code` reaches callers.
        details: Value,
    },

    /// The body was valid JSON but not the expected shape.
    #[error("{service} returned an unexpected payload: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// A request URL could not be built from the configured base URL.
    #[error("{service} URL could not be built for {path}")]
    InvalidUrl {
        service: &'static str,
        path: String,
    },
}

impl UpstreamError {
    /// Name of the upstream service involved.
    #[must_use]
    pub const fn service(&self) -> &'static str {
        match self {
            Self::Build { service, .. }
            | Self::Transport { service, .. }
            | Self::Rejected { service, .. }
            | Self::Decode { service, .. }
            | Self::InvalidUrl { service, .. } => service,
        }
    }

    /// Upstream body for `Rejected` errors.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        match self {
            Self::Rejected { details, .. } => Some(details),
            _ => None,
        }
    }

    /// HTTP status reported by the upstream, if it responded at all.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message safe to show to an end user.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Transport { service, .. } => format!("{service} is unavailable"),
            Self::Build { service, .. }
            | Self::Decode { service, .. }
            | Self::InvalidUrl { service, .. } => format!("{service} request failed"),
        }
    }

    pub(crate) fn decode(service: &'static str, err: &serde_json::Error) -> Self {
        Self::Decode {
            service,
            message: err.to_string(),
        }
    }
}

/// Build a `reqwest` client with the given request timeout.
pub(crate) fn http_client(
    service: &'static str,
    timeout: Duration,
) -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("osun-storefront/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| UpstreamError::Build { service, source })
}

/// Send a request and normalize the response.
pub(crate) async fn send(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<Value, UpstreamError> {
    let response = request
        .send()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;
    read_upstream(service, response).await
}

/// Read an upstream response body and classify it.
///
/// # Errors
///
/// Returns [`UpstreamError::Rejected`] for non-2xx responses and for 2xx bodies
/// carrying `success: false` (or Paystack's `status: false`), and
/// [`UpstreamError::Transport`] if the body cannot be read.
pub async fn read_upstream(
    service: &'static str,
    response: reqwest::Response,
) -> Result<Value, UpstreamError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|source| UpstreamError::Transport { service, source })?;
    check_body(service, status, parse_body(&text))
}

/// Parse a response body as JSON, wrapping non-JSON text as `{"message": text}`.
#[must_use]
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "message": text.trim() }))
}

/// Decide whether a parsed body represents success.
///
/// # Errors
///
/// Returns [`UpstreamError::Rejected`] when the status is not 2xx or the body
/// explicitly reports failure.
pub fn check_body(service: &'static str, status: u16, body: Value) -> Result<Value, UpstreamError> {
    let http_ok = (200..300).contains(&status);
    if http_ok && !reports_failure(&body) {
        return Ok(body);
    }

    let message = extract_message(&body)
        .unwrap_or_else(|| format!("{service} request failed with status {status}"));
    tracing::warn!(
        service,
        status,
        body = %truncate(&body.to_string(), 2000),
        "Upstream request failed"
    );

    Err(UpstreamError::Rejected {
        service,
        status,
        message,
        details: body,
    })
}

/// Whether a 2xx body carries an explicit failure flag.
fn reports_failure(body: &Value) -> bool {
    matches!(body.get("success"), Some(Value::Bool(false)))
        || matches!(body.get("status"), Some(Value::Bool(false)))
}

/// Pull a human-readable message out of the common error body shapes.
#[must_use]
pub fn extract_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("error").filter(|v| v.is_string()),
        body.get("msg"),
        body.pointer("/error/message"),
        body.pointer("/data/message"),
        body.pointer("/errors/0/message"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

/// Unwrap a `{"data": ...}` envelope, returning the body unchanged otherwise.
#[must_use]
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.get(..end).unwrap_or(s)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_falls_back_to_message() {
        assert_eq!(parse_body("{\"a\":1}"), json!({ "a": 1 }));
        assert_eq!(
            parse_body("<html>Bad Gateway</html>"),
            json!({ "message": "<html>Bad Gateway</html>" })
        );
        assert_eq!(parse_body("   "), Value::Null);
    }

    #[test]
    fn test_check_body_success() {
        let body = json!({ "success": true, "data": { "id": 1 } });
        assert_eq!(check_body("JLO", 201, body.clone()).unwrap(), body);
        assert!(check_body("WooCommerce", 200, json!([])).is_ok());
    }

    #[test]
    fn test_check_body_http_failure_keeps_status_and_message() {
        let body = json!({
            "code": "woocommerce_rest_shop_order_invalid_id",
            "message": "Invalid ID.",
            "data": { "status": 404 }
        });
        match check_body("WooCommerce", 404, body).unwrap_err() {
            UpstreamError::Rejected {
                status,
                message,
                details,
                ..
            } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Invalid ID.");
                assert_eq!(details["code"], "woocommerce_rest_shop_order_invalid_id");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_check_body_explicit_failure_in_2xx() {
        let err = check_body("JLO", 200, json!({ "success": false, "message": "Order not eligible" }))
            .unwrap_err();
        assert_eq!(err.upstream_status(), Some(200));
        assert_eq!(err.public_message(), "Order not eligible");

        let err = check_body("Paystack", 200, json!({ "status": false, "message": "Invalid key" }))
            .unwrap_err();
        assert_eq!(err.public_message(), "Invalid key");
    }

    #[test]
    fn test_check_body_default_message() {
        let err = check_body("Fez", 503, Value::Null).unwrap_err();
        assert_eq!(err.public_message(), "Fez request failed with status 503");
    }

    #[test]
    fn test_extract_message_shapes() {
        assert_eq!(extract_message(&json!({ "error": "boom" })).as_deref(), Some("boom"));
        assert_eq!(
            extract_message(&json!({ "error": { "message": "nested" } })).as_deref(),
            Some("nested")
        );
        assert_eq!(
            extract_message(&json!({ "errors": [{ "message": "first" }] })).as_deref(),
            Some("first")
        );
        assert_eq!(extract_message(&json!({ "message": "  " })), None);
    }

    #[test]
    fn test_unwrap_data() {
        assert_eq!(unwrap_data(json!({ "data": [1, 2] })), json!([1, 2]));
        assert_eq!(unwrap_data(json!({ "id": 3 })), json!({ "id": 3 }));
        assert_eq!(unwrap_data(json!([1])), json!([1]));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
