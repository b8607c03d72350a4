//! Usage metric derivation and threshold filtering.

use std::collections::BTreeMap;

use validator::Validate;

use common::config::{AnalyzeOptions, IndexTracking};
use common::errors::{AppError, AppResult};
use common::models::report::{DatabaseUsage, FlaggedCollection, UsageReport};
use common::models::snapshot::{CollectionRawStats, DatabaseRawStats, Snapshot};
use common::models::unit::Unit;

/// Padding factors strictly above this indicate fragmentation.
pub const PADDING_FACTOR_LIMIT: f64 = 1.5;

/// Grand totals every percentage is computed against.
#[derive(Debug, Clone, Copy)]
struct Totals {
    storage: f64,
    /// `None` when index shares are not tracked.
    index: Option<f64>,
}

/// Derives the usage report for a snapshot.
///
/// A grand total of zero yields `0.0` for every percentage taken against it.
///
/// # Errors
/// * `AppError::Configuration` if the options fail validation.
/// * `AppError::MalformedSnapshot` if index tracking is forced on but a
///   database lacks its index total.
pub fn analyze(snapshot: &Snapshot, options: &AnalyzeOptions) -> AppResult<UsageReport> {
    options.validate()?;

    let track_index = match options.index_tracking {
        IndexTracking::Auto => snapshot.has_index_totals(),
        IndexTracking::Off => false,
        IndexTracking::On => {
            if let Some((name, _)) = snapshot.iter().find(|(_, db)| db.index_total().is_none()) {
                return Err(AppError::MalformedSnapshot(format!(
                    "database '{}' has no duIndexSize but index tracking is on",
                    name
                )));
            }
            true
        }
    };

    let totals = Totals {
        storage: snapshot.iter().map(|(_, db)| db.storage_total() as f64).sum(),
        index: track_index.then(|| {
            snapshot
                .iter()
                .map(|(_, db)| db.index_total().unwrap_or_default() as f64)
                .sum()
        }),
    };
    tracing::debug!(
        databases = snapshot.len(),
        total_storage = totals.storage,
        total_index = totals.index.unwrap_or_default(),
        unit = %options.unit,
        limit = options.limit_percent,
        "Analyzing snapshot"
    );

    let report: UsageReport = snapshot
        .iter()
        .map(|(name, db)| (name.clone(), database_usage(db, totals, options)))
        .collect();

    tracing::info!(
        databases = report.len(),
        flagged = report.flagged_count(),
        "Usage report ready"
    );
    Ok(report)
}

fn database_usage(db: &DatabaseRawStats, totals: Totals, options: &AnalyzeOptions) -> DatabaseUsage {
    let unit = options.unit;
    let status = db.status();
    let storage_total = db.storage_total() as f64;

    let flagged_collections = db
        .collections()
        .iter()
        .filter_map(|(name, coll)| {
            flag_collection(coll, totals, unit, options.limit_percent).map(|f| (name.clone(), f))
        })
        .collect::<BTreeMap<_, _>>();

    DatabaseUsage {
        size: unit.convert(status.file_size as f64),
        allocated_storage: unit.convert(storage_total),
        allocated_index: db.index_total().map(|i| unit.convert(i as f64)),
        empty_size: unit.convert(status.file_size as f64 - status.storage_size as f64),
        percent_of_storage: percent(storage_total, totals.storage),
        percent_of_index: totals
            .index
            .map(|total| percent(db.index_total().unwrap_or_default() as f64, total)),
        flagged_collections,
    }
}

/// Returns the sparse flag record, or `None` when nothing crossed a threshold.
fn flag_collection(
    coll: &CollectionRawStats,
    totals: Totals,
    unit: Unit,
    limit_percent: f64,
) -> Option<FlaggedCollection> {
    let storage = coll.storage_size as f64;
    let index = coll.total_index_size as f64;
    let mut flagged = FlaggedCollection::default();

    if coll.padding_factor > PADDING_FACTOR_LIMIT {
        flagged.padding_size = Some(unit.convert(storage * coll.padding_factor - storage));
    }

    let share = percent(storage + index, totals.storage);
    if share > limit_percent {
        flagged.percent_of_storage = Some(share);
    }

    if let Some(index_total) = totals.index {
        let share = percent(index, index_total);
        if share > limit_percent {
            flagged.percent_of_index = Some(share);
        }
    }

    (!flagged.is_empty()).then_some(flagged)
}

fn percent(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        100.0 * part / total
    } else {
        0.0
    }
}
