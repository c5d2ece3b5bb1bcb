//! Upstream clients and business logic.
//!
//! # Services
//!
//! - `upstream` - Shared HTTP client setup and response normalization
//! - `retry` - Retry of transient transport failures
//! - `woocommerce` - Orders, metadata, refunds, notes and the REST proxy
//! - `jlo` - Returns logistics and shipping fees
//! - `paystack` - Transaction verification and card charges
//! - `fez` - Return pickups
//! - `returns` - The returns and refunds workflow across all of the above

pub mod fez;
pub mod jlo;
pub mod paystack;
pub mod retry;
pub mod returns;
pub mod upstream;
pub mod woocommerce;
