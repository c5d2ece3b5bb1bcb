//! Osun Storefront API.
//!
//! This binary serves the storefront's order, returns and payments API on
//! port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - WooCommerce REST API for orders, refunds and order metadata
//! - JLO for return logistics and shipping fees
//! - Paystack for payments, Fez for return pickups
//!
//! There is no local database: all workflow state lives in WooCommerce order
//! metadata.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use osun_storefront::config::StorefrontConfig;
use osun_storefront::middleware::api_rate_limiter;
use osun_storefront::routes;
use osun_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber: env filter, text or JSON output, and the
/// Sentry layer.
fn init_tracing(config: &StorefrontConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "osun_storefront=info,tower_http=debug".into());

    let fmt_layer = if config.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Warn once per upstream section left unset or unusable.
fn warn_unconfigured(config: &StorefrontConfig) {
    for skipped in &config.skipped {
        tracing::warn!(
            section = skipped.section,
            reason = %skipped.reason,
            "Ignoring unusable configuration section"
        );
    }

    let sections = [
        ("WooCommerce", config.woocommerce.is_some()),
        ("JLO", config.jlo.is_some()),
        ("Paystack", config.paystack.is_some()),
        ("Fez", config.fez.is_some()),
    ];
    for (service, _) in sections.iter().filter(|(_, configured)| !configured) {
        tracing::warn!(service, "Upstream not configured; its routes will return 500");
    }
    if config.fez.is_none() {
        tracing::info!("Return pickups fall back to drop-off instructions without Fez");
    }
}

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry goes first so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);
    warn_unconfigured(&config);

    let addr = config.socket_addr();
    let state = AppState::new(config).expect("Failed to build upstream clients");
    let rate_limiter = api_rate_limiter().expect("API rate limiter quota is valid");

    let app = routes::router()
        .layer(rate_limiter)
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "storefront API listening");

    // Connect info feeds the rate limiter's peer-address fallback
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
