//! Daily strategy classification
//!
//! Executions are bucketed per (trade day, underlying). Each bucket is tested
//! for a covered call, then each (expiry, right) slice of its option legs for
//! a vertical spread; whatever is left becomes a single-leg record. Stock legs
//! not absorbed by a covered call are pooled across the whole input and
//! replayed through the [`EquityLifecycleTracker`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::lifecycle::EquityLifecycleTracker;
use super::types::{position_id, ClassifiedPosition, PositionSide, StrategyLabel};
use crate::common::collections::OrderedGroups;
use crate::common::types::{display_decimal, AssetClass, Execution, PutCall, Side};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DayKey {
    date: NaiveDate,
    underlying: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SliceKey {
    expiry: Option<NaiveDate>,
    put_call: Option<PutCall>,
}

fn total(legs: &[&Execution], field: fn(&Execution) -> Decimal) -> Decimal {
    legs.iter().map(|leg| field(leg)).sum()
}

fn owned(legs: &[&Execution]) -> Vec<Execution> {
    legs.iter().map(|leg| (*leg).clone()).collect()
}

/// Per-day multi-leg detection with single-leg fallback
#[derive(Debug, Clone, Default)]
pub struct DailyClassifier {
    tracker: EquityLifecycleTracker,
}

impl DailyClassifier {
    pub fn new(close_tolerance: Decimal) -> Self {
        Self {
            tracker: EquityLifecycleTracker::new(close_tolerance),
        }
    }

    /// Classify a deduplicated execution list
    ///
    /// Every input execution ends up in the legs of exactly one record.
    pub fn classify(&self, executions: &[Execution]) -> Vec<ClassifiedPosition> {
        let buckets: OrderedGroups<DayKey, &Execution> = executions
            .iter()
            .map(|e| {
                (
                    DayKey {
                        date: e.date,
                        underlying: e.underlying.clone(),
                    },
                    e,
                )
            })
            .collect();

        let mut positions = Vec::new();
        let mut stock_pool: Vec<Execution> = Vec::new();

        for (key, bucket) in buckets.into_groups() {
            let (stocks, rest): (Vec<&Execution>, Vec<&Execution>) =
                bucket.into_iter().partition(|e| e.is_stock());
            let (options, others): (Vec<&Execution>, Vec<&Execution>) =
                rest.into_iter().partition(|e| e.is_option());

            positions.extend(others.into_iter().map(single_other));

            if let Some(covered_call) = covered_call(&key, &stocks, &options) {
                trace!(date = %key.date, symbol = %key.underlying, "Covered call");
                positions.push(covered_call);
                continue;
            }

            stock_pool.extend(stocks.into_iter().cloned());

            let slices: OrderedGroups<SliceKey, &Execution> = options
                .into_iter()
                .map(|e| {
                    (
                        SliceKey {
                            expiry: e.expiry,
                            put_call: e.put_call,
                        },
                        e,
                    )
                })
                .collect();

            for (slice, legs) in slices.into_groups() {
                match vertical_spread(&key, slice, &legs) {
                    Some(vertical) => {
                        trace!(date = %key.date, symbol = %key.underlying, "Vertical spread");
                        positions.push(vertical);
                    }
                    None => positions.extend(legs.into_iter().map(single_option)),
                }
            }
        }

        let rockets = self.tracker.process(&stock_pool);
        debug!(
            records = positions.len(),
            rockets = rockets.len(),
            pooled_stock = stock_pool.len(),
            "Daily classification done"
        );
        positions.extend(rockets.into_iter().map(|rocket| rocket.into_classified()));

        positions
    }
}

fn covered_call(
    key: &DayKey,
    stocks: &[&Execution],
    options: &[&Execution],
) -> Option<ClassifiedPosition> {
    if stocks.is_empty() || options.is_empty() {
        return None;
    }
    let long_stock = stocks.iter().filter(|e| e.is_long_stock()).count();
    let short_calls: Vec<&Execution> = options.iter().copied().filter(|e| e.is_short_call()).collect();
    let first_call = *short_calls.first()?;
    if long_stock == 0 {
        return None;
    }

    let legs: Vec<&Execution> = stocks.iter().chain(options.iter()).copied().collect();
    Some(ClassifiedPosition {
        id: position_id("cc", key.date, &key.underlying, legs.iter().map(|e| e.id.as_str())),
        date: key.date,
        symbol: key.underlying.clone(),
        detected_strategy: StrategyLabel::CoveredCall,
        structure: StrategyLabel::CoveredCall,
        description: format!("Covered Call {}", key.underlying),
        quantity: Decimal::from(long_stock.min(short_calls.len())),
        proceeds: total(&legs, |e| e.proceeds),
        commission: total(&legs, |e| e.commission),
        realized_pnl: total(&legs, |e| e.realized_pnl),
        strike: first_call.strike.map(display_decimal).unwrap_or_default(),
        expiry: first_call.expiry,
        side: PositionSide::Complex,
        asset_class: AssetClass::Option,
        option_type: Some(PutCall::Call),
        status: None,
        legs: owned(&legs),
    })
}

/// Two legs of one (expiry, right) slice at different strikes, opposite sides
fn vertical_spread(key: &DayKey, slice: SliceKey, legs: &[&Execution]) -> Option<ClassifiedPosition> {
    let put_call = slice.put_call?;
    let [first, second] = legs else {
        return None;
    };
    let (low, high) = match (first.strike, second.strike) {
        (Some(a), Some(b)) if a != b => (a.min(b), a.max(b)),
        _ => return None,
    };
    if !first.side.is_opposite(second.side) {
        return None;
    }

    let proceeds = first.proceeds + second.proceeds;
    let expiry = slice
        .expiry
        .map(|d| d.to_string())
        .unwrap_or_default();
    Some(ClassifiedPosition {
        id: position_id("vs", key.date, &key.underlying, [first.id.as_str(), second.id.as_str()]),
        date: key.date,
        symbol: key.underlying.clone(),
        detected_strategy: StrategyLabel::VerticalSpread,
        structure: StrategyLabel::VerticalSpread,
        description: format!("Vertical Spread {} {}", put_call, expiry).trim_end().to_string(),
        quantity: first.quantity.abs().min(second.quantity.abs()),
        proceeds,
        commission: first.commission + second.commission,
        realized_pnl: first.realized_pnl + second.realized_pnl,
        strike: format!("{} / {}", display_decimal(low), display_decimal(high)),
        expiry: slice.expiry,
        side: PositionSide::from_proceeds(proceeds),
        asset_class: AssetClass::Option,
        option_type: Some(put_call),
        status: None,
        legs: owned(legs),
    })
}

fn single_leg(execution: &Execution, prefix: &str, label: StrategyLabel) -> ClassifiedPosition {
    let description = if execution.description.trim().is_empty() {
        format!("{} {}", label, execution.symbol)
    } else {
        execution.description.clone()
    };
    ClassifiedPosition {
        id: position_id(prefix, execution.date, &execution.underlying, [execution.id.as_str()]),
        date: execution.date,
        symbol: execution.underlying.clone(),
        detected_strategy: label,
        structure: label,
        description,
        quantity: execution.quantity.abs(),
        proceeds: execution.proceeds,
        commission: execution.commission,
        realized_pnl: execution.realized_pnl,
        strike: execution.strike.map(display_decimal).unwrap_or_default(),
        expiry: execution.expiry,
        side: PositionSide::from_proceeds(execution.proceeds),
        asset_class: execution.asset_class,
        option_type: execution.put_call,
        status: None,
        legs: vec![execution.clone()],
    }
}

fn single_option(execution: &Execution) -> ClassifiedPosition {
    let label = match (execution.put_call, execution.side) {
        (Some(PutCall::Put), Side::Sell) => StrategyLabel::ShortPut,
        (Some(PutCall::Put), Side::Buy) => StrategyLabel::LongPut,
        (Some(PutCall::Call), Side::Sell) => StrategyLabel::ShortCall,
        (Some(PutCall::Call), Side::Buy) => StrategyLabel::LongCall,
        (None, _) => StrategyLabel::Other,
    };
    single_leg(execution, "opt", label)
}

fn single_other(execution: &Execution) -> ClassifiedPosition {
    single_leg(execution, "cash", StrategyLabel::Other)
}
