//! # Trimly Repository
//!
//! Data access for the booking backend.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn SalonRepository>   (traits.rs)
//! PgSalonRepository               (postgres/, SQLx)
//!   ↓
//! PostgreSQL                      (migrations/)
//! ```
//!
//! With the `test-util` feature, [`InMemoryDatabase`] implements every trait
//! for service and REST tests.

pub mod pool;
pub mod postgres;
pub mod registry;
pub mod traits;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryDatabase;
pub use pool::*;
pub use postgres::*;
pub use registry::Repositories;
pub use traits::*;
