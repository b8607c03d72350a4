//! Data source abstraction for raw statistics.

use async_trait::async_trait;
use mongodb::bson::Document;

use common::errors::AppResult;

/// Read-only access to a data source that can report storage statistics.
///
/// Implementations map their failures onto the shared taxonomy:
/// rejected credentials are `Authentication`, an unreachable server is
/// `Connectivity` and a failing stats command is `StatsUnavailable`.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Verifies the credentials before any stats are requested.
    async fn authenticate(&self) -> AppResult<()>;

    /// Names of every database visible to the connection.
    async fn database_names(&self) -> AppResult<Vec<String>>;

    /// Raw `dbStats` reply for a database.
    async fn database_stats(&self, database: &str) -> AppResult<Document>;

    /// Names of the collections in a database.
    async fn collection_names(&self, database: &str) -> AppResult<Vec<String>>;

    /// Raw `collStats` reply for a collection.
    async fn collection_stats(&self, database: &str, collection: &str) -> AppResult<Document>;

    /// Releases the connection. Called once at the end of every run.
    async fn close(&self);
}
