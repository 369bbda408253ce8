//! Execution deduplication by broker id

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::common::types::Execution;

/// Result of a dedup pass, including what was dropped
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupOutcome {
    /// Surviving executions, first occurrence of each id, input order kept
    pub executions: Vec<Execution>,
    /// Ids of every dropped repeat, in the order they were seen
    pub duplicate_ids: Vec<String>,
    /// Missing entries (null rows or executions without an id)
    pub missing: usize,
}

/// Drop missing entries and repeated ids, first-seen wins
///
/// Accepts either plain executions or `Option<Execution>` slots. Duplicates
/// are dropped silently; use [`dedup_with_manifest`] to see them.
pub fn dedup<I>(items: I) -> Vec<Execution>
where
    I: IntoIterator,
    I::Item: Into<Option<Execution>>,
{
    dedup_with_manifest(items).executions
}

/// Same as [`dedup`], also reporting what was dropped
pub fn dedup_with_manifest<I>(items: I) -> DedupOutcome
where
    I: IntoIterator,
    I::Item: Into<Option<Execution>>,
{
    let mut seen = HashSet::new();
    let mut outcome = DedupOutcome::default();

    for item in items {
        let Some(execution) = item.into() else {
            outcome.missing += 1;
            continue;
        };
        if execution.id.trim().is_empty() {
            outcome.missing += 1;
            continue;
        }
        if seen.insert(execution.id.clone()) {
            outcome.executions.push(execution);
        } else {
            outcome.duplicate_ids.push(execution.id);
        }
    }

    if !outcome.duplicate_ids.is_empty() || outcome.missing > 0 {
        debug!(
            kept = outcome.executions.len(),
            duplicates = outcome.duplicate_ids.len(),
            missing = outcome.missing,
            "Dropped executions during dedup"
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn stock(id: &str, qty: rust_decimal::Decimal) -> Execution {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        Execution::stock(id, date, "AAPL", qty, dec!(100))
    }

    #[test]
    fn test_first_seen_wins() {
        let result = dedup(vec![stock("a", dec!(1)), stock("b", dec!(2)), stock("a", dec!(3))]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "a");
        assert_eq!(result[0].quantity, dec!(1));
        assert_eq!(result[1].id, "b");
    }

    #[test]
    fn test_missing_slots_are_dropped() {
        let outcome = dedup_with_manifest(vec![
            None,
            Some(stock("a", dec!(1))),
            Some(stock(" ", dec!(1))),
            Some(stock("a", dec!(5))),
        ]);

        assert_eq!(outcome.executions.len(), 1);
        assert_eq!(outcome.missing, 2);
        assert_eq!(outcome.duplicate_ids, vec!["a".to_string()]);
    }
}
