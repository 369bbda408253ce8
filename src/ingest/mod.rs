//! Normalizer boundary
//!
//! Raw rows arrive already flattened from the broker format. This module
//! validates them into [`Execution`]s, skipping (never failing on) rows that
//! cannot be trusted, and removes repeated executions.

mod dates;
mod dedup;
mod raw;
mod source;

pub use dates::{date_from_description, parse_time, parse_trade_datetime};
pub use dedup::{dedup, dedup_with_manifest, DedupOutcome};
pub use raw::RawExecution;
pub use source::JsonFileSource;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::common::errors::ReconError;
use crate::common::types::Execution;

/// A row rejected at the boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// Position of the row in the input batch
    pub index: usize,
    pub reason: String,
}

/// Everything dropped on the way from raw rows to deduplicated executions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipManifest {
    /// Null entries in the input batch
    pub missing: usize,
    /// Rows that failed to deserialize or validate
    pub malformed: Vec<SkippedRow>,
    /// Ids dropped as repeats
    pub duplicate_ids: Vec<String>,
}

impl SkipManifest {
    pub fn skipped_count(&self) -> usize {
        self.missing + self.malformed.len() + self.duplicate_ids.len()
    }
}

/// Normalized rows, one slot per input row (`None` for skipped rows)
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub slots: Vec<Option<Execution>>,
    pub malformed: Vec<SkippedRow>,
}

/// Validate raw rows; nulls and malformed rows become empty slots
pub fn normalize_rows(rows: Vec<Value>, lenient_dates: bool) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, row) in rows.into_iter().enumerate() {
        if row.is_null() {
            batch.slots.push(None);
            continue;
        }

        let converted = serde_json::from_value::<RawExecution>(row)
            .map_err(ReconError::from)
            .and_then(|raw| raw.into_execution(lenient_dates));

        match converted {
            Ok(execution) => batch.slots.push(Some(execution)),
            Err(err) => {
                debug!(index, error = %err, "Skipping malformed execution row");
                batch.malformed.push(SkippedRow {
                    index,
                    reason: err.to_string(),
                });
                batch.slots.push(None);
            }
        }
    }

    batch
}

/// Normalize and dedup in one go, reporting every dropped row
pub fn ingest_rows(rows: Vec<Value>, lenient_dates: bool) -> (Vec<Execution>, SkipManifest) {
    let total = rows.len();
    let batch = normalize_rows(rows, lenient_dates);
    let malformed_count = batch.malformed.len();

    let outcome = dedup_with_manifest(batch.slots);
    let manifest = SkipManifest {
        missing: outcome.missing - malformed_count,
        malformed: batch.malformed,
        duplicate_ids: outcome.duplicate_ids,
    };

    debug!(
        total,
        kept = outcome.executions.len(),
        skipped = manifest.skipped_count(),
        "Ingested execution rows"
    );

    (outcome.executions, manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ingest_reports_every_drop() {
        let rows = vec![
            json!({"id": "1", "date": "2026-01-05", "symbol": "AAPL", "assetClass": "STK", "quantity": 10, "price": 100}),
            Value::Null,
            json!({"id": "2", "date": "2026-01-05", "symbol": "AAPL", "assetClass": "STK", "quantity": "abc"}),
            json!({"id": "1", "date": "2026-01-06", "symbol": "AAPL", "assetClass": "STK", "quantity": -10, "price": 110}),
            json!({"id": "3", "date": "2026-01-06", "symbol": "AAPL", "assetClass": "FUT", "quantity": 1}),
        ];

        let (executions, manifest) = ingest_rows(rows, false);

        assert_eq!(executions.len(), 1);
        assert_eq!(manifest.missing, 1);
        assert_eq!(manifest.malformed.len(), 2);
        assert_eq!(manifest.malformed[0].index, 2);
        assert_eq!(manifest.malformed[1].index, 4);
        assert_eq!(manifest.duplicate_ids, vec!["1".to_string()]);
        assert_eq!(manifest.skipped_count(), 4);
    }

    #[test]
    fn test_overflowing_row_skipped_rest_survives() {
        let rows = vec![
            json!({"id": "ok", "date": "2026-01-05", "symbol": "AAPL", "assetClass": "STK", "quantity": 10, "price": 100}),
            json!({
                "id": "huge",
                "date": "2026-01-05",
                "symbol": "SPY",
                "assetClass": "OPT",
                "quantity": "1000000000000000",
                "price": "1000000000000000"
            }),
        ];

        let (executions, manifest) = ingest_rows(rows, false);

        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].id, "ok");
        assert_eq!(manifest.malformed.len(), 1);
        assert_eq!(manifest.malformed[0].index, 1);
        assert!(manifest.malformed[0].reason.contains("proceeds overflow"));
    }
}
