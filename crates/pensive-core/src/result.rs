//! Convenience result type alias for Pensive.

use crate::error::AppError;

/// A specialized `Result` type for Pensive operations.
pub type AppResult<T> = Result<T, AppError>;
