//! # Trimly Config
//!
//! Layered configuration from TOML files and `TRIMLY__`-prefixed environment
//! variables.

mod app_config;
mod loader;

pub use app_config::*;
pub use loader::*;
