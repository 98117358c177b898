//! Clacie Core - Shared types library.
//!
//! Types used by the storefront and its tests:
//! - entity IDs as returned by the commerce and auth APIs
//! - validated email addresses
//! - Rupiah prices backed by decimal arithmetic
//! - order status as reported by the backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O and no HTTP clients. Anything
//! that talks to the network lives in `clacie-storefront`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
