//! Shared data models for collection and analysis.

pub mod report;
pub mod snapshot;
pub mod unit;

// Re-export commonly used types
pub use report::{DatabaseUsage, FlaggedCollection, UsageReport};
pub use snapshot::{CollectionRawStats, DatabaseRawStats, DatabaseStatus, Snapshot};
pub use unit::Unit;
