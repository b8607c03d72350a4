//! Shared building blocks for the disk-usage tools.
//!
//! Holds the error taxonomy, configuration records, the snapshot and report
//! data models, and JSON helpers used by every other crate.

pub mod config;
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{AppError, AppResult};
