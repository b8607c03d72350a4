//! Raw storage statistics collection.
//!
//! Connects to the data source, enumerates the target databases and records
//! database-level and collection-level size statistics into a [`Snapshot`].

pub mod mongo;
pub mod service;
pub mod source;

use common::config::{CollectorOptions, ConnectionSettings};
use common::errors::AppResult;
use common::models::Snapshot;

pub use mongo::MongoStatsSource;
pub use service::Collector;
pub use source::StatsSource;

/// Collects a snapshot from the MongoDB deployment described by `settings`.
///
/// # Errors
/// * `AppError::Authentication` if the credentials are rejected.
/// * `AppError::Connectivity` if the deployment cannot be reached.
/// * `AppError::StatsUnavailable` if any stats command fails.
pub async fn collect(
    settings: &ConnectionSettings,
    options: CollectorOptions,
    target: Option<&str>,
) -> AppResult<Snapshot> {
    tracing::info!(host = %settings.host, port = settings.port, "Connecting to data source");
    let source = MongoStatsSource::connect(settings)?;
    Collector::new(source, options).collect(target).await
}
