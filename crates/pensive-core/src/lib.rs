//! # pensive-core
//!
//! Core crate for Pensive. Contains the configuration schema, the shared
//! sample and channel types, window arithmetic, the collaborator traits
//! implemented by the source and render crates, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Pensive crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
