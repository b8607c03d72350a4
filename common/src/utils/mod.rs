//! Utility functions and helpers.

pub mod json;
pub mod numbers;

// Re-export commonly used helpers
pub use json::{from_json, to_sorted_json};
pub use numbers::round2;
