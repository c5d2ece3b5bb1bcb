//! CLI command implementations.

pub mod config;
pub mod order;
pub mod return_code;

use osun_storefront::config::ConfigError;
use osun_storefront::services::returns::ReturnsError;
use osun_storefront::services::upstream::UpstreamError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A command needs an upstream that is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// An upstream call failed.
    #[error("{0}")]
    Upstream(#[from] UpstreamError),

    /// The returns workflow failed.
    #[error("{0}")]
    Returns(#[from] ReturnsError),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Print a value as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
