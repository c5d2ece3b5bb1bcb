//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::services::fez::FezClient;
use crate::services::jlo::JloClient;
use crate::services::paystack::PaystackClient;
use crate::services::returns::ReturnsService;
use crate::services::upstream::UpstreamError;
use crate::services::woocommerce::WooClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Each upstream client is built
/// once from its config section; a missing section leaves the client unset and
/// the routes that need it answer "not configured".
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    woocommerce: Option<WooClient>,
    jlo: Option<JloClient>,
    paystack: Option<PaystackClient>,
    fez: Option<FezClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, UpstreamError> {
        let woocommerce = config
            .woocommerce
            .as_ref()
            .map(|c| WooClient::new(c, config.proxy_retry))
            .transpose()?;
        let jlo = config.jlo.as_ref().map(JloClient::new).transpose()?;
        let paystack = config.paystack.as_ref().map(PaystackClient::new).transpose()?;
        let fez = config.fez.as_ref().map(FezClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                woocommerce,
                jlo,
                paystack,
                fez,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the WooCommerce client.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotConfigured`] when WooCommerce is not configured.
    pub fn woocommerce(&self) -> Result<&WooClient, AppError> {
        self.inner
            .woocommerce
            .as_ref()
            .ok_or(AppError::NotConfigured("WooCommerce"))
    }

    /// Get the JLO client.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotConfigured`] when JLO is not configured.
    pub fn jlo(&self) -> Result<&JloClient, AppError> {
        self.inner.jlo.as_ref().ok_or(AppError::NotConfigured("JLO"))
    }

    /// Get the Paystack client.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotConfigured`] when Paystack is not configured.
    pub fn paystack(&self) -> Result<&PaystackClient, AppError> {
        self.inner
            .paystack
            .as_ref()
            .ok_or(AppError::NotConfigured("Paystack"))
    }

    /// Whether the server can serve order routes.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.woocommerce.is_some()
    }

    /// Returns workflow over the configured clients.
    ///
    /// JLO and Fez are optional here; the workflow reports or degrades around
    /// them per operation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotConfigured`] when WooCommerce is not configured.
    pub fn returns(&self) -> Result<ReturnsService<'_>, AppError> {
        Ok(ReturnsService::new(
            self.woocommerce()?,
            self.inner.jlo.as_ref(),
            self.inner.fez.as_ref(),
        ))
    }
}
