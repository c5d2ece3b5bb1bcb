//! Osun Core - Shared types library.
//!
//! This crate provides common types used across all Osun components:
//! - `storefront` - JSON API in front of WooCommerce, JLO, Paystack and Fez
//! - `cli` - Operator tools for inspecting and syncing order return state
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses, amounts and return codes
//! - [`meta`] - Versioned schema for the order metadata blobs this system owns

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod meta;
pub mod types;

pub use types::*;
