//! Configuration check.

use osun_storefront::config::{ConfigSummary, StorefrontConfig};

use super::{CommandError, print_json};

/// Load the configuration and print which upstreams are configured.
///
/// # Errors
///
/// Returns an error if a server setting is invalid. Unusable upstream
/// sections are reported in the output instead.
pub fn check() -> Result<(), CommandError> {
    let config = StorefrontConfig::from_env()?;
    let summary = ConfigSummary::from(&config);

    for skipped in &summary.skipped {
        tracing::warn!(section = skipped.section, reason = %skipped.reason, "Section ignored");
    }

    for (service, configured) in [
        ("WooCommerce", summary.woocommerce.is_some()),
        ("JLO", summary.jlo.is_some()),
        ("Paystack", summary.paystack.is_some()),
        ("Fez", summary.fez.is_some()),
    ] {
        if !configured {
            tracing::warn!(service, "Not configured");
        }
    }

    print_json(&summary)
}
