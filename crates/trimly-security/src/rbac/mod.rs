//! Role-based access control and tenant scoping.

mod checker;

pub use checker::*;
