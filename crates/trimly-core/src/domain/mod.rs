//! Domain entities and value objects for the salon back office.

pub mod access;
pub mod entities;
pub mod value_objects;

pub use access::*;
pub use entities::*;
pub use value_objects::*;
