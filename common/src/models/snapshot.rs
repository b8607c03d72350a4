//! Raw storage statistics snapshot.
//!
//! A [`Snapshot`] is the only hand-off between collection and analysis. It is
//! built once per collection run and never mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::utils::json::{from_json, to_sorted_json};
use crate::utils::numbers::{de_bytes, de_opt_bytes, de_opt_bytes_map};

/// Fixed size fields taken from the database-level `dbStats` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    /// Uncompressed size of all documents.
    #[serde(deserialize_with = "de_bytes")]
    pub data_size: u64,
    /// Bytes allocated for document storage.
    #[serde(deserialize_with = "de_bytes")]
    pub storage_size: u64,
    /// Bytes allocated for indexes.
    #[serde(deserialize_with = "de_bytes")]
    pub index_size: u64,
    /// Bytes occupied by the database files, including unused space.
    #[serde(deserialize_with = "de_bytes")]
    pub file_size: u64,
}

/// Fixed fields taken from the collection-level `collStats` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRawStats {
    /// Bytes allocated for the collection's documents.
    #[serde(deserialize_with = "de_bytes")]
    pub storage_size: u64,
    /// Size of the most recently allocated extent.
    #[serde(deserialize_with = "de_bytes")]
    pub last_extent_size: u64,
    /// Bytes allocated for all indexes of the collection.
    #[serde(deserialize_with = "de_bytes")]
    pub total_index_size: u64,
    /// Ratio of allocated record space to document size.
    pub padding_factor: f64,
    /// Per-index sizes, present only when collected with index breakdown.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_opt_bytes_map"
    )]
    pub index_sizes: Option<BTreeMap<String, u64>>,
}

impl CollectionRawStats {
    /// Creates collection stats without a per-index breakdown.
    pub fn new(storage_size: u64, total_index_size: u64, padding_factor: f64) -> Self {
        Self {
            storage_size,
            last_extent_size: 0,
            total_index_size,
            padding_factor,
            index_sizes: None,
        }
    }

    /// Sets the last extent size.
    pub fn with_last_extent_size(mut self, last_extent_size: u64) -> Self {
        self.last_extent_size = last_extent_size;
        self
    }

    /// Attaches a per-index size breakdown.
    pub fn with_index_sizes(mut self, index_sizes: BTreeMap<String, u64>) -> Self {
        self.index_sizes = Some(index_sizes);
        self
    }
}

/// Raw statistics for one database and all of its collections.
///
/// The aggregate totals always equal the sums over `collections`; the
/// constructor computes them and restoring a snapshot checks them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRawStats {
    status: DatabaseStatus,
    collections: BTreeMap<String, CollectionRawStats>,
    #[serde(rename = "duStorageSize", deserialize_with = "de_bytes")]
    storage_total: u64,
    #[serde(
        rename = "duIndexSize",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_opt_bytes"
    )]
    index_total: Option<u64>,
}

impl DatabaseRawStats {
    /// Builds the record and computes both aggregate totals.
    pub fn new(status: DatabaseStatus, collections: BTreeMap<String, CollectionRawStats>) -> Self {
        let storage_total = collections.values().map(|c| c.storage_size).sum();
        let index_total = collections.values().map(|c| c.total_index_size).sum();
        Self {
            status,
            collections,
            storage_total,
            index_total: Some(index_total),
        }
    }

    /// Drops the index aggregate, as recorded by collectors that do not track it.
    pub fn without_index_total(mut self) -> Self {
        self.index_total = None;
        self
    }

    pub fn status(&self) -> &DatabaseStatus {
        &self.status
    }

    pub fn collections(&self) -> &BTreeMap<String, CollectionRawStats> {
        &self.collections
    }

    /// Sum of `storageSize` over all collections.
    pub fn storage_total(&self) -> u64 {
        self.storage_total
    }

    /// Sum of `totalIndexSize` over all collections, when recorded.
    pub fn index_total(&self) -> Option<u64> {
        self.index_total
    }

    /// Checks the aggregate invariant and per-collection value ranges.
    fn validate(&self, name: &str) -> AppResult<()> {
        let storage_sum: u128 = self.collections.values().map(|c| c.storage_size as u128).sum();
        if storage_sum != self.storage_total as u128 {
            return Err(AppError::MalformedSnapshot(format!(
                "database '{}': duStorageSize {} does not match collection sum {}",
                name, self.storage_total, storage_sum
            )));
        }

        if let Some(index_total) = self.index_total {
            let index_sum: u128 = self
                .collections
                .values()
                .map(|c| c.total_index_size as u128)
                .sum();
            if index_sum != index_total as u128 {
                return Err(AppError::MalformedSnapshot(format!(
                    "database '{}': duIndexSize {} does not match collection sum {}",
                    name, index_total, index_sum
                )));
            }
        }

        for (coll, stats) in &self.collections {
            if !stats.padding_factor.is_finite() || stats.padding_factor <= 0.0 {
                return Err(AppError::MalformedSnapshot(format!(
                    "collection '{}.{}': invalid paddingFactor {}",
                    name, coll, stats.padding_factor
                )));
            }
        }
        Ok(())
    }
}

/// Point-in-time mapping from database name to its raw statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    databases: BTreeMap<String, DatabaseRawStats>,
}

impl Snapshot {
    pub fn new(databases: BTreeMap<String, DatabaseRawStats>) -> Self {
        Self { databases }
    }

    /// Iterates databases in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DatabaseRawStats)> {
        self.databases.iter()
    }

    pub fn get(&self, database: &str) -> Option<&DatabaseRawStats> {
        self.databases.get(database)
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Whether every database records its index aggregate.
    pub fn has_index_totals(&self) -> bool {
        self.databases.values().all(|db| db.index_total.is_some())
    }

    /// Renders the snapshot as sorted, indented JSON.
    pub fn to_json(&self) -> AppResult<String> {
        to_sorted_json(self)
    }

    /// Restores a persisted snapshot and checks its invariants.
    ///
    /// # Errors
    /// Returns `AppError::MalformedSnapshot` if fields are missing, values are
    /// out of range, or aggregate totals disagree with the collections.
    pub fn from_json(text: &str) -> AppResult<Self> {
        let snapshot: Snapshot = from_json(text)?;
        for (name, db) in &snapshot.databases {
            db.validate(name)?;
        }
        tracing::debug!(databases = snapshot.len(), "Snapshot restored");
        Ok(snapshot)
    }
}

impl FromIterator<(String, DatabaseRawStats)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, DatabaseRawStats)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        let mut collections = BTreeMap::new();
        collections.insert(
            "orders".to_string(),
            CollectionRawStats::new(600, 100, 1.0).with_last_extent_size(64),
        );
        collections.insert(
            "users".to_string(),
            CollectionRawStats::new(200, 50, 1.8)
                .with_index_sizes(BTreeMap::from([("_id_".to_string(), 50)])),
        );
        let status = DatabaseStatus {
            data_size: 500,
            storage_size: 800,
            index_size: 150,
            file_size: 1000,
        };
        [("shop".to_string(), DatabaseRawStats::new(status, collections))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_totals_computed() {
        let snapshot = sample();
        let db = snapshot.get("shop").unwrap();
        assert_eq!(db.storage_total(), 800);
        assert_eq!(db.index_total(), Some(150));
        assert!(snapshot.has_index_totals());
    }

    #[test]
    fn test_json_round_trip() {
        let snapshot = sample();
        let text = snapshot.to_json().unwrap();
        assert!(text.contains("\"duStorageSize\": 800"));
        assert!(text.contains("\"paddingFactor\": 1.8"));
        let restored = Snapshot::from_json(&text).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_restore_accepts_float_totals() {
        let text = r#"{
            "db": {
                "status": {"dataSize": 1, "storageSize": 10, "indexSize": 2, "fileSize": 20},
                "collections": {
                    "c": {"storageSize": 10, "lastExtentSize": 4, "totalIndexSize": 2,
                          "paddingFactor": 1.0, "indexSizes": {"_id_": 2}}
                },
                "duStorageSize": 10.0,
                "duIndexSize": 2.0
            }
        }"#;
        let snapshot = Snapshot::from_json(text).unwrap();
        let db = snapshot.get("db").unwrap();
        assert_eq!(db.storage_total(), 10);
        assert_eq!(db.collections()["c"].index_sizes.as_ref().unwrap()["_id_"], 2);
    }

    #[test]
    fn test_restore_without_index_total() {
        let text = r#"{
            "db": {
                "status": {"dataSize": 1, "storageSize": 10, "indexSize": 2, "fileSize": 20},
                "collections": {
                    "c": {"storageSize": 10, "lastExtentSize": 4, "totalIndexSize": 2, "paddingFactor": 1.0}
                },
                "duStorageSize": 10
            }
        }"#;
        let snapshot = Snapshot::from_json(text).unwrap();
        assert_eq!(snapshot.get("db").unwrap().index_total(), None);
        assert!(!snapshot.has_index_totals());
    }

    #[test]
    fn test_restore_rejects_mismatched_totals() {
        let text = r#"{
            "db": {
                "status": {"dataSize": 1, "storageSize": 10, "indexSize": 2, "fileSize": 20},
                "collections": {
                    "c": {"storageSize": 10, "lastExtentSize": 4, "totalIndexSize": 2, "paddingFactor": 1.0}
                },
                "duStorageSize": 11,
                "duIndexSize": 2
            }
        }"#;
        let err = Snapshot::from_json(text).unwrap_err();
        assert!(matches!(err, AppError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_restore_rejects_missing_field() {
        let text = r#"{
            "db": {
                "status": {"dataSize": 1, "storageSize": 10, "indexSize": 2},
                "collections": {},
                "duStorageSize": 0
            }
        }"#;
        let err = Snapshot::from_json(text).unwrap_err();
        assert!(matches!(err, AppError::MalformedSnapshot(_)));
    }

    #[test]
    fn test_restore_rejects_negative_size() {
        let text = r#"{
            "db": {
                "status": {"dataSize": 1, "storageSize": -10, "indexSize": 2, "fileSize": 20},
                "collections": {},
                "duStorageSize": 0
            }
        }"#;
        assert!(Snapshot::from_json(text).is_err());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::from_json("{}").unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.to_json().unwrap(), "{}");
    }
}
