//! Business logic services for storefront.
//!
//! Route handlers stay thin: orchestration that spans several backend calls
//! or needs unit tests lives here.

pub mod cart;
pub mod checkout;
