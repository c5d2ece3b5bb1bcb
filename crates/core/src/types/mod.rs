//! Core types for Osun.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod id;
pub mod return_code;
pub mod status;

pub use amount::{
    AmountError, format_amount, parse_amount, parse_amount_str, parse_positive_amount,
};
pub use id::*;
pub use return_code::{ReturnCode, ReturnCodeError};
pub use status::*;
