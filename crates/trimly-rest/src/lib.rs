//! # Trimly REST
//!
//! HTTP surface of the salon backend built on Axum: staff-side accounts,
//! customer self-service, subscriptions, the salon back office, bookings,
//! and health probes.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;

pub use router::*;
pub use state::*;
