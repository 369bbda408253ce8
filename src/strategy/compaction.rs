//! Compaction and business naming
//!
//! Three pure passes over the daily classifier output:
//!
//! 1. [`compact`] folds fragments of the same strategy on the same day and
//!    underlying into one record. All vertical spreads of one right on a
//!    day merge together.
//! 2. [`apply_naming_rules`] maps structural labels to the names users see.
//! 3. [`fuse_iron_condors`] pairs a put spread with a call credit spread of
//!    the same day and underlying.

use chrono::NaiveDate;
use tracing::trace;

use super::grouping::has_assignment_code;
use super::types::{position_id, ClassifiedPosition, PositionSide, PositionStatus, StrategyLabel};
use crate::common::collections::OrderedGroups;
use crate::common::types::{AssetClass, PutCall};

const ASSIGNMENT_WORDS: &[&str] = &["assign", "exercise", "expiration"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MergeKind {
    Strategy(StrategyLabel),
    /// Every vertical spread of one right; direction is not part of the key
    AllSpreads(Option<PutCall>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    date: NaiveDate,
    symbol: String,
    kind: MergeKind,
}

impl MergeKey {
    fn of(position: &ClassifiedPosition) -> Self {
        let kind = if position.detected_strategy == StrategyLabel::VerticalSpread {
            MergeKind::AllSpreads(position.option_type)
        } else {
            MergeKind::Strategy(position.detected_strategy)
        };
        Self {
            date: position.date,
            symbol: position.symbol.clone(),
            kind,
        }
    }
}

/// Prefix of a `<prefix>-<date>-<symbol>-<digest>` id
fn id_prefix(position: &ClassifiedPosition) -> &str {
    let marker = format!("-{}-", position.date);
    position
        .id
        .split_once(marker.as_str())
        .map(|(prefix, _)| prefix)
        .unwrap_or("pos")
}

/// Union of two display strike strings
fn union_strikes(acc: &str, next: &str) -> String {
    if next.is_empty() || acc.contains(next) {
        acc.to_string()
    } else if acc.is_empty() {
        next.to_string()
    } else {
        format!("{}, {}", acc, next)
    }
}

fn merge_status(a: Option<PositionStatus>, b: Option<PositionStatus>) -> Option<PositionStatus> {
    match (a, b) {
        (Some(PositionStatus::Open), _) | (_, Some(PositionStatus::Open)) => Some(PositionStatus::Open),
        (Some(status), _) | (None, Some(status)) => Some(status),
        (None, None) => None,
    }
}

/// Fold `next` into `acc`, returning the combined record
fn merge_pair(acc: ClassifiedPosition, next: ClassifiedPosition) -> ClassifiedPosition {
    let proceeds = acc.proceeds + next.proceeds;
    let side = match acc.side {
        PositionSide::Complex => PositionSide::Complex,
        _ => PositionSide::from_proceeds(proceeds),
    };
    let mut legs = acc.legs;
    legs.extend(next.legs);

    ClassifiedPosition {
        quantity: acc.quantity + next.quantity,
        proceeds,
        commission: acc.commission + next.commission,
        realized_pnl: acc.realized_pnl + next.realized_pnl,
        strike: union_strikes(&acc.strike, &next.strike),
        side,
        status: merge_status(acc.status, next.status),
        legs,
        ..acc
    }
}

/// One record per (day, underlying, strategy); vertical spreads per (day, underlying, right)
pub fn compact(positions: Vec<ClassifiedPosition>) -> Vec<ClassifiedPosition> {
    let groups: OrderedGroups<MergeKey, ClassifiedPosition> = positions
        .into_iter()
        .map(|p| (MergeKey::of(&p), p))
        .collect();

    groups
        .into_groups()
        .into_iter()
        .filter_map(|(key, members)| {
            let fragments = members.len();
            let mut merged = members.into_iter().reduce(merge_pair)?;

            if fragments > 1 {
                trace!(date = %key.date, symbol = %key.symbol, fragments, "Merged fragments");
                merged.id = position_id(
                    id_prefix(&merged),
                    merged.date,
                    &merged.symbol,
                    merged.legs.iter().map(|leg| leg.id.as_str()),
                );
            }
            if let MergeKind::AllSpreads(Some(put_call)) = key.kind {
                merged.structure = StrategyLabel::vertical(put_call, merged.proceeds);
            }
            Some(merged)
        })
        .collect()
}

fn mentions_assignment(text: &str) -> bool {
    let lower = text.to_lowercase();
    ASSIGNMENT_WORDS.iter().any(|word| lower.contains(word))
}

/// Stock record that came out of an assignment, exercise or expiration
fn shows_assignment(position: &ClassifiedPosition) -> bool {
    mentions_assignment(&position.description)
        || position.has_option_leg()
        || position.legs.iter().any(|leg| {
            mentions_assignment(&leg.description)
                || mentions_assignment(&leg.notes)
                || has_assignment_code(&leg.notes)
        })
}

/// User-facing name of a compacted record, first matching rule wins
pub fn business_name(position: &ClassifiedPosition) -> StrategyLabel {
    let label = position.detected_strategy;
    match label {
        _ if label.is_wheel_leg() => StrategyLabel::Wheel,
        StrategyLabel::Rockets if shows_assignment(position) => StrategyLabel::Wheel,
        StrategyLabel::Rockets => StrategyLabel::Rockets,
        _ if label.is_vertical() => StrategyLabel::PcsStandard,
        StrategyLabel::Other
            if position.asset_class == AssetClass::Cash || position.symbol.contains('.') =>
        {
            StrategyLabel::ChangeDevise
        }
        other => other,
    }
}

pub fn apply_naming_rules(positions: Vec<ClassifiedPosition>) -> Vec<ClassifiedPosition> {
    positions
        .into_iter()
        .map(|position| ClassifiedPosition {
            detected_strategy: business_name(&position),
            ..position
        })
        .collect()
}

fn is_put_spread(position: &ClassifiedPosition) -> bool {
    position.detected_strategy == StrategyLabel::PcsStandard
        && matches!(
            position.structure,
            StrategyLabel::PutCreditSpread | StrategyLabel::PutDebitSpread
        )
}

fn is_call_credit_spread(position: &ClassifiedPosition) -> bool {
    position.structure == StrategyLabel::CallCreditSpread
}

fn iron_condor(put: ClassifiedPosition, call: ClassifiedPosition) -> ClassifiedPosition {
    let proceeds = put.proceeds + call.proceeds;
    let mut legs = put.legs;
    legs.extend(call.legs);

    ClassifiedPosition {
        id: position_id("ic", put.date, &put.symbol, legs.iter().map(|leg| leg.id.as_str())),
        detected_strategy: StrategyLabel::PcsIronCondor,
        structure: StrategyLabel::IronCondor,
        description: format!("Iron Condor {}", put.symbol),
        proceeds,
        commission: put.commission + call.commission,
        realized_pnl: put.realized_pnl + call.realized_pnl,
        strike: format!("{} / {}", put.strike, call.strike),
        side: PositionSide::from_proceeds(proceeds),
        option_type: None,
        legs,
        ..put
    }
}

/// Replace a put spread and a call credit spread of one (day, underlying) with an iron condor
pub fn fuse_iron_condors(positions: Vec<ClassifiedPosition>) -> Vec<ClassifiedPosition> {
    let groups: OrderedGroups<(NaiveDate, String), ClassifiedPosition> = positions
        .into_iter()
        .map(|p| ((p.date, p.symbol.clone()), p))
        .collect();

    let mut fused = Vec::new();
    for ((date, symbol), mut members) in groups.into_groups() {
        let put = members.iter().position(is_put_spread);
        let call = members.iter().position(is_call_credit_spread);

        let (Some(put), Some(call)) = (put, call) else {
            fused.extend(members);
            continue;
        };

        trace!(%date, %symbol, "Iron condor");
        // Remove the higher index first so the lower one stays valid
        let (put_spread, call_spread) = if put > call {
            let put_spread = members.remove(put);
            (put_spread, members.remove(call))
        } else {
            let call_spread = members.remove(call);
            (members.remove(put), call_spread)
        };
        fused.push(iron_condor(put_spread, call_spread));
        fused.extend(members);
    }
    fused
}

/// Newest first; records of one day keep their relative order
pub fn sort_newest_first(mut positions: Vec<ClassifiedPosition>) -> Vec<ClassifiedPosition> {
    positions.sort_by(|a, b| b.date.cmp(&a.date));
    positions
}
