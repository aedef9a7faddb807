//! Result type aliases for Trimly.

use crate::TrimlyError;

/// A specialized `Result` type for Trimly operations.
pub type TrimlyResult<T> = Result<T, TrimlyError>;
