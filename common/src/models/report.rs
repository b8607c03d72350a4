//! Usage report models produced by the analyzer.
//!
//! Values are kept at full precision; serialization rounds them to two
//! decimal places.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::AppResult;
use crate::utils::json::to_sorted_json;
use crate::utils::numbers::{ser_opt_round2, ser_round2};

/// Threshold-crossing details for one collection.
///
/// Only the fields that triggered the flag are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedCollection {
    /// Space lost to padding, in the report unit.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "ser_opt_round2")]
    pub padding_size: Option<f64>,
    /// Share of the grand storage total.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "ser_opt_round2")]
    pub percent_of_storage: Option<f64>,
    /// Share of the grand index total.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "ser_opt_round2")]
    pub percent_of_index: Option<f64>,
}

impl FlaggedCollection {
    pub fn is_empty(&self) -> bool {
        self.padding_size.is_none()
            && self.percent_of_storage.is_none()
            && self.percent_of_index.is_none()
    }
}

/// Normalized usage of one database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseUsage {
    /// File size in the report unit.
    #[serde(serialize_with = "ser_round2")]
    pub size: f64,
    /// Storage allocated across collections.
    #[serde(serialize_with = "ser_round2")]
    pub allocated_storage: f64,
    /// Index space allocated across collections, when recorded.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "ser_opt_round2")]
    pub allocated_index: Option<f64>,
    /// File size minus storage size.
    #[serde(serialize_with = "ser_round2")]
    pub empty_size: f64,
    /// Share of the grand storage total.
    #[serde(serialize_with = "ser_round2")]
    pub percent_of_storage: f64,
    /// Share of the grand index total, when index tracking is on.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "ser_opt_round2")]
    pub percent_of_index: Option<f64>,
    /// Collections over a padding or share threshold.
    pub flagged_collections: BTreeMap<String, FlaggedCollection>,
}

/// Usage report keyed by database name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UsageReport {
    databases: BTreeMap<String, DatabaseUsage>,
}

impl UsageReport {
    pub fn new(databases: BTreeMap<String, DatabaseUsage>) -> Self {
        Self { databases }
    }

    pub fn get(&self, database: &str) -> Option<&DatabaseUsage> {
        self.databases.get(database)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DatabaseUsage)> {
        self.databases.iter()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Total number of flagged collections across all databases.
    pub fn flagged_count(&self) -> usize {
        self.databases
            .values()
            .map(|db| db.flagged_collections.len())
            .sum()
    }

    /// Renders the report as sorted, indented JSON with rounded values.
    pub fn to_json(&self) -> AppResult<String> {
        to_sorted_json(self)
    }
}

impl FromIterator<(String, DatabaseUsage)> for UsageReport {
    fn from_iter<I: IntoIterator<Item = (String, DatabaseUsage)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
