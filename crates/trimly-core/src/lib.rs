//! # Trimly Core
//!
//! Core types, traits, and error definitions for the Trimly salon backend.
//! Every other crate in the workspace builds on the error type, typed ids,
//! pagination, and the domain model defined here.

pub mod domain;
pub mod error;
pub mod id;
pub mod pagination;
pub mod result;
pub mod traits;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;
pub use validation::*;

// Re-export shaku's interface bound used by service and repository traits
pub use shaku::Interface;
