//! Returns workflow error types.

use osun_core::meta::MetaError;
use thiserror::Error;

use crate::services::upstream::UpstreamError;

/// Errors that can occur in the returns and refunds workflow.
#[derive(Debug, Error)]
pub enum ReturnsError {
    /// Request input failed validation.
    #[error("{0}")]
    Validation(String),

    /// A required upstream is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The resource does not exist (or must not be revealed).
    #[error("{0}")]
    NotFound(String),

    /// An upstream call failed before anything was written.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// An upstream call failed after an earlier write succeeded.
    ///
    /// WooCommerce and the order metadata now disagree until someone
    /// reconciles the order by hand.
    #[error("{failed} failed after {completed}: {source}")]
    Unreconciled {
        completed: &'static str,
        failed: &'static str,
        #[source]
        source: UpstreamError,
    },

    /// A metadata record could not be encoded.
    #[error(transparent)]
    Meta(#[from] MetaError),
}

impl ReturnsError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
