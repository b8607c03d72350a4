//! Collection pipeline.
//!
//! Walks the target databases and their collections one at a time and turns
//! the raw stats replies into a [`Snapshot`]. Any failure aborts the run; a
//! partial snapshot is never returned.
//!
//! Replies must carry the MMAPv1 fields (`fileSize`, `paddingFactor`,
//! `lastExtentSize`). Engines that omit them, such as WiredTiger, fail with
//! `StatsUnavailable` naming the first missing field.

use std::collections::BTreeMap;

use mongodb::bson::{Bson, Document};

use common::config::CollectorOptions;
use common::errors::{AppError, AppResult};
use common::models::snapshot::{CollectionRawStats, DatabaseRawStats, DatabaseStatus, Snapshot};

use crate::source::StatsSource;

/// Collects raw storage statistics from a [`StatsSource`].
pub struct Collector<S> {
    source: S,
    options: CollectorOptions,
}

impl<S: StatsSource> Collector<S> {
    pub fn new(source: S, options: CollectorOptions) -> Self {
        Self { source, options }
    }

    /// Runs one collection pass.
    ///
    /// Collects `target` only, or every visible database when `None`. The
    /// source is closed before returning, whatever the outcome.
    pub async fn collect(&self, target: Option<&str>) -> AppResult<Snapshot> {
        let result = self.run(target).await;
        self.source.close().await;

        match &result {
            Ok(snapshot) => tracing::info!(databases = snapshot.len(), "Collection finished"),
            Err(e) => tracing::error!(code = e.code(), error = %e, "Collection aborted"),
        }
        result
    }

    async fn run(&self, target: Option<&str>) -> AppResult<Snapshot> {
        self.source.authenticate().await?;

        let databases = match target {
            Some(name) => vec![name.to_string()],
            None => self.source.database_names().await?,
        };
        tracing::info!(count = databases.len(), "Collecting database stats");

        let mut snapshot = BTreeMap::new();
        for name in databases {
            let stats = self.database(&name).await?;
            snapshot.insert(name, stats);
        }
        Ok(Snapshot::new(snapshot))
    }

    async fn database(&self, database: &str) -> AppResult<DatabaseRawStats> {
        let reply = self.source.database_stats(database).await?;
        let status = DatabaseStatus {
            data_size: required_bytes(&reply, "dataSize", database)?,
            storage_size: required_bytes(&reply, "storageSize", database)?,
            index_size: required_bytes(&reply, "indexSize", database)?,
            file_size: required_bytes(&reply, "fileSize", database)?,
        };

        let mut collections = BTreeMap::new();
        for name in self.source.collection_names(database).await? {
            let reply = self.source.collection_stats(database, &name).await?;
            let target = format!("{}.{}", database, name);
            let stats = self.collection(&reply, &target)?;
            tracing::debug!(
                collection = %target,
                storage_size = stats.storage_size,
                total_index_size = stats.total_index_size,
                padding_factor = stats.padding_factor,
                "Collection stats"
            );
            collections.insert(name, stats);
        }

        let stats = DatabaseRawStats::new(status, collections);
        tracing::info!(
            database = %database,
            collections = stats.collections().len(),
            storage_total = stats.storage_total(),
            index_total = stats.index_total().unwrap_or_default(),
            "Database collected"
        );
        Ok(stats)
    }

    fn collection(&self, reply: &Document, target: &str) -> AppResult<CollectionRawStats> {
        let padding_factor = required_number(reply, "paddingFactor", target)?;
        if !(padding_factor.is_finite() && padding_factor > 0.0) {
            return Err(AppError::stats_unavailable(
                target,
                format!("invalid paddingFactor {}", padding_factor),
            ));
        }
        let last_extent_size = required_bytes(reply, "lastExtentSize", target)?;

        let mut stats = CollectionRawStats::new(
            required_bytes(reply, "storageSize", target)?,
            required_bytes(reply, "totalIndexSize", target)?,
            padding_factor,
        )
        .with_last_extent_size(last_extent_size);

        if self.options.index_breakdown {
            stats = stats.with_index_sizes(index_sizes(reply, target)?);
        }
        Ok(stats)
    }
}

/// Reads a numeric field regardless of its BSON width.
fn number(doc: &Document, key: &str) -> Option<f64> {
    match doc.get(key)? {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn to_bytes(value: f64, key: &str, target: &str) -> AppResult<u64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value as u64)
    } else {
        Err(AppError::stats_unavailable(
            target,
            format!("invalid '{}' value {}", key, value),
        ))
    }
}

fn required_number(doc: &Document, key: &str, target: &str) -> AppResult<f64> {
    number(doc, key).ok_or_else(|| {
        AppError::stats_unavailable(target, format!("missing numeric field '{}'", key))
    })
}

fn required_bytes(doc: &Document, key: &str, target: &str) -> AppResult<u64> {
    to_bytes(required_number(doc, key, target)?, key, target)
}

fn index_sizes(reply: &Document, target: &str) -> AppResult<BTreeMap<String, u64>> {
    let sizes = match reply.get("indexSizes") {
        Some(Bson::Document(sizes)) => sizes,
        Some(_) => {
            return Err(AppError::stats_unavailable(
                target,
                "'indexSizes' is not a document",
            ))
        }
        None => return Ok(BTreeMap::new()),
    };

    sizes
        .keys()
        .map(|index| required_bytes(sizes, index, target).map(|size| (index.clone(), size)))
        .collect()
}
