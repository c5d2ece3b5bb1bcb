//! Osun storefront API library.
//!
//! This crate provides the storefront API as a library, allowing the binary,
//! the operator CLI and the integration tests to share it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
