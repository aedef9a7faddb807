//! Request middleware.

mod access;
mod auth;
mod logging;

pub use access::*;
pub use auth::*;
pub use logging::*;
