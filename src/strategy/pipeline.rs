//! End-to-end reconciliation
//!
//! Wires the stages together: ingest → dedup → daily classification →
//! compaction → naming → iron condor fusion. The engine itself never does
//! I/O; [`Reconciler::reconcile_source`] finishes fetching before it starts.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::compaction::{apply_naming_rules, compact, fuse_iron_condors, sort_newest_first};
use super::daily::DailyClassifier;
use super::grouping::{ContractGrouper, GroupReport};
use super::types::ClassifiedPosition;
use crate::common::errors::Result;
use crate::common::traits::ExecutionSource;
use crate::common::types::Execution;
use crate::config::EngineSettings;
use crate::ingest::{dedup, ingest_rows, SkipManifest};

/// Output of a full reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub positions: Vec<ClassifiedPosition>,
    pub groups: Vec<GroupReport>,
    pub manifest: SkipManifest,
}

/// Classification engine configured with [`EngineSettings`]
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    settings: EngineSettings,
}

impl Reconciler {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Classify executions into labeled positions, newest first
    ///
    /// Repeated ids are dropped first-seen-wins. Deterministic: the same input
    /// always yields the same records in the same order.
    pub fn classify(&self, executions: &[Execution]) -> Vec<ClassifiedPosition> {
        let executions = dedup(executions.iter().cloned());
        self.classify_unique(&executions)
    }

    fn classify_unique(&self, executions: &[Execution]) -> Vec<ClassifiedPosition> {
        let daily = DailyClassifier::new(self.settings.close_tolerance).classify(executions);
        let fragments = daily.len();

        let compacted = compact(daily);
        let compacted_len = compacted.len();

        let positions = sort_newest_first(fuse_iron_condors(apply_naming_rules(compacted)));
        debug!(
            executions = executions.len(),
            fragments,
            compacted = compacted_len,
            positions = positions.len(),
            "Classification complete"
        );
        positions
    }

    /// Contract groups for already deduplicated executions
    pub fn groups(&self, executions: &[Execution]) -> Vec<GroupReport> {
        ContractGrouper::new(self.settings.close_tolerance)
            .build(executions)
            .iter()
            .map(|group| group.report())
            .collect()
    }

    /// Normalize raw rows, then classify and group them
    pub fn reconcile(&self, rows: Vec<Value>) -> Reconciliation {
        let (executions, manifest) = ingest_rows(rows, self.settings.lenient_dates);
        let positions = self.classify_unique(&executions);
        let groups = self.groups(&executions);

        Reconciliation {
            positions,
            groups,
            manifest,
        }
    }

    /// Fetch every row from `source`, then reconcile
    #[instrument(skip_all, fields(source = %source.source_name()))]
    pub async fn reconcile_source(&self, source: &dyn ExecutionSource) -> Result<Reconciliation> {
        let rows = source.fetch().await?;
        let reconciliation = self.reconcile(rows);
        info!(
            positions = reconciliation.positions.len(),
            skipped = reconciliation.manifest.skipped_count(),
            "Reconciled source"
        );
        Ok(reconciliation)
    }
}

/// Classify with default settings
pub fn classify(executions: &[Execution]) -> Vec<ClassifiedPosition> {
    Reconciler::default().classify(executions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::ReconError;
    use crate::common::traits::MockExecutionSource;
    use crate::strategy::types::StrategyLabel;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test_log::test]
    fn test_classify_drops_repeated_ids() {
        let executions = vec![
            Execution::stock("1", day(1), "AAPL", dec!(10), dec!(100)),
            Execution::stock("1", day(1), "AAPL", dec!(10), dec!(100)),
        ];

        let positions = classify(&executions);

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].legs.len(), 1);
        assert_eq!(positions[0].detected_strategy, StrategyLabel::Rockets);
    }

    #[test_log::test]
    fn test_reconcile_raw_rows() {
        let rows = vec![
            json!({"id": "1", "date": "20260501", "symbol": "AAPL", "assetClass": "STK", "side": "BOT", "quantity": 100, "price": 10}),
            json!({"id": "2", "date": "20260502", "symbol": "AAPL", "assetClass": "STK", "side": "SLD", "quantity": 100, "price": 12, "realizedPnl": 200}),
            json!({"id": "2", "date": "20260502", "symbol": "AAPL", "assetClass": "STK", "side": "SLD", "quantity": 100, "price": 12}),
            Value::Null,
        ];

        let reconciliation = Reconciler::default().reconcile(rows);

        assert_eq!(reconciliation.positions.len(), 1);
        let rocket = &reconciliation.positions[0];
        assert_eq!(rocket.realized_pnl, dec!(200));
        assert_eq!(rocket.description, "Rockets AAPL (Closed)");
        assert_eq!(reconciliation.groups.len(), 1);
        assert_eq!(reconciliation.manifest.duplicate_ids, vec!["2".to_string()]);
        assert_eq!(reconciliation.manifest.missing, 1);
    }

    #[tokio::test]
    async fn test_reconcile_source_uses_fetched_rows() {
        let mut source = MockExecutionSource::new();
        source.expect_source_name().return_const("mock".to_string());
        source.expect_fetch().times(1).returning(|| {
            Ok(vec![json!({
                "id": "1", "date": "2026-05-01", "symbol": "SPY", "putCall": "P",
                "strike": 500, "expiry": "2026-06-19", "quantity": -1, "price": 3
            })])
        });

        let reconciliation = Reconciler::default().reconcile_source(&source).await.unwrap();

        assert_eq!(reconciliation.positions.len(), 1);
        assert_eq!(reconciliation.positions[0].detected_strategy, StrategyLabel::Wheel);
        assert_eq!(reconciliation.positions[0].structure, StrategyLabel::ShortPut);
    }

    #[tokio::test]
    async fn test_reconcile_source_propagates_fetch_errors() {
        let mut source = MockExecutionSource::new();
        source.expect_source_name().return_const("broken".to_string());
        source.expect_fetch().returning(|| {
            Err(ReconError::Source {
                source_name: "broken".to_string(),
                message: "gateway offline".to_string(),
            })
        });

        let result = Reconciler::default().reconcile_source(&source).await;
        assert!(matches!(result, Err(ReconError::Source { .. })));
    }
}
