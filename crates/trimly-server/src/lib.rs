//! # Trimly Server Library
//!
//! Wiring of configuration, storage, services, and the REST router into a
//! runnable application, plus startup utilities.

pub mod app;
pub mod startup;

pub use app::{App, AppBuilder};
