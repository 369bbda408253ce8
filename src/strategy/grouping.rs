//! Contract grouping
//!
//! Two passes over the execution history:
//!
//! 1. Stock fills are matched FIFO per symbol into buy-to-flat cycles.
//!    Option fills are bucketed per contract (underlying, strike, expiry),
//!    which collects the full open/close round trip of each contract.
//! 2. Option contract buckets sharing underlying and expiry are fused into
//!    one spread candidate.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use super::types::StrategyLabel;
use crate::common::collections::OrderedGroups;
use crate::common::types::{display_decimal, AssetClass, Execution, PutCall, Side};

static NOTE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;/\s]+").expect("static regex"));

const ASSIGNMENT_CODES: &[&str] = &["A", "EX", "ASGN"];

/// True when broker notes carry an assignment or exercise code
pub fn has_assignment_code(notes: &str) -> bool {
    NOTE_SEPARATORS
        .split(notes)
        .map(|token| token.trim().to_uppercase())
        .any(|token| ASSIGNMENT_CODES.contains(&token.as_str()))
}

/// How a group came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Buy-to-flat stock cycle (possibly still open)
    StockCycle,
    /// Stock sell with no open cycle
    StockOrphan,
    /// Non-stock, non-option bucket (underlying, expiry, date)
    Contract,
    /// Option contracts fused on (underlying, expiry)
    SpreadCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ContractKey {
    Option {
        underlying: String,
        strike: Option<Decimal>,
        expiry: Option<NaiveDate>,
    },
    Other {
        asset_class: AssetClass,
        underlying: String,
        expiry: Option<NaiveDate>,
        date: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FusionKey {
    underlying: String,
    expiry: Option<NaiveDate>,
}

/// Aggregated side of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupSide {
    Buy,
    Sell,
    Mixed,
}

/// A bucket of executions sharing an identity key
///
/// Borrows its executions; no execution belongs to two groups of a pass.
#[derive(Debug, Clone)]
pub struct ContractGroup<'a> {
    pub kind: GroupKind,
    pub underlying: String,
    pub asset_class: AssetClass,
    pub expiry: Option<NaiveDate>,
    /// Earliest trade date in the group
    pub date: NaiveDate,
    pub executions: Vec<&'a Execution>,
}

/// Derived totals for a group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub legs: usize,
    /// Distinct strikes, ascending, joined with `" / "`
    pub strikes: String,
    pub strike_count: usize,
    /// Distinct put/call letters in first-seen order
    pub put_call: String,
    pub side: GroupSide,
    pub total_quantity: Decimal,
    pub total_proceeds: Decimal,
    pub total_commission: Decimal,
    pub total_cost_basis: Decimal,
    pub total_pnl: Decimal,
    pub avg_price: Decimal,
    /// First two distinct notes values
    pub notes: String,
    pub is_assigned: bool,
}

/// Owned, serializable view of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub kind: GroupKind,
    pub underlying: String,
    pub asset_class: AssetClass,
    pub expiry: Option<NaiveDate>,
    pub date: NaiveDate,
    pub execution_ids: Vec<String>,
    pub summary: GroupSummary,
    pub default_strategy: StrategyLabel,
}

impl<'a> ContractGroup<'a> {
    fn new(kind: GroupKind, execution: &'a Execution) -> Self {
        Self {
            kind,
            underlying: execution.underlying.clone(),
            asset_class: execution.asset_class,
            expiry: execution.expiry,
            date: execution.date,
            executions: vec![execution],
        }
    }

    pub fn summary(&self) -> GroupSummary {
        let executions = &self.executions;

        let mut strikes: Vec<Decimal> = executions
            .iter()
            .filter_map(|e| e.strike)
            .filter(|s| *s > Decimal::ZERO)
            .collect();
        strikes.sort();
        strikes.dedup();

        let mut put_calls: Vec<PutCall> = Vec::new();
        for put_call in executions.iter().filter_map(|e| e.put_call) {
            if !put_calls.contains(&put_call) {
                put_calls.push(put_call);
            }
        }

        let side = match (
            executions.iter().any(|e| e.side == Side::Buy),
            executions.iter().any(|e| e.side == Side::Sell),
        ) {
            (true, false) => GroupSide::Buy,
            (false, true) => GroupSide::Sell,
            _ => GroupSide::Mixed,
        };

        let mut notes: Vec<&str> = Vec::new();
        for note in executions.iter().map(|e| e.notes.trim()).filter(|n| !n.is_empty()) {
            if !notes.contains(&note) {
                notes.push(note);
            }
        }

        let sum = |f: fn(&Execution) -> Decimal| executions.iter().map(|e| f(e)).sum::<Decimal>();
        let avg_price = if executions.is_empty() {
            Decimal::ZERO
        } else {
            sum(|e| e.price) / Decimal::from(executions.len())
        };

        GroupSummary {
            legs: executions.len(),
            strikes: strikes
                .iter()
                .map(|s| display_decimal(*s))
                .collect::<Vec<_>>()
                .join(" / "),
            strike_count: strikes.len(),
            put_call: put_calls
                .iter()
                .map(|pc| pc.to_string())
                .collect::<Vec<_>>()
                .join("/"),
            side,
            total_quantity: sum(|e| e.quantity),
            total_proceeds: sum(|e| e.proceeds),
            total_commission: sum(|e| e.commission),
            total_cost_basis: sum(|e| e.cost_basis),
            total_pnl: sum(|e| e.realized_pnl),
            avg_price,
            notes: notes.iter().take(2).copied().collect::<Vec<_>>().join(", "),
            is_assigned: executions.iter().any(|e| has_assignment_code(&e.notes)),
        }
    }

    /// Strategy inferred from the group alone
    pub fn default_strategy(&self) -> StrategyLabel {
        let summary = self.summary();
        match self.asset_class {
            AssetClass::Cash => StrategyLabel::Other,
            AssetClass::Option => match summary.strike_count {
                0 => StrategyLabel::Other,
                1 => StrategyLabel::Wheel,
                _ => StrategyLabel::PutCreditSpread,
            },
            AssetClass::Stock if summary.is_assigned => StrategyLabel::Wheel,
            AssetClass::Stock => StrategyLabel::Rockets,
        }
    }

    /// User override keyed by the group's first execution id, else the default
    pub fn strategy(&self, overrides: &HashMap<String, StrategyLabel>) -> StrategyLabel {
        let Some(first) = self.executions.first() else {
            return StrategyLabel::Other;
        };
        overrides
            .get(&first.id)
            .copied()
            .unwrap_or_else(|| self.default_strategy())
    }

    pub fn report(&self) -> GroupReport {
        GroupReport {
            kind: self.kind,
            underlying: self.underlying.clone(),
            asset_class: self.asset_class,
            expiry: self.expiry,
            date: self.date,
            execution_ids: self.executions.iter().map(|e| e.id.clone()).collect(),
            summary: self.summary(),
            default_strategy: self.default_strategy(),
        }
    }
}

/// Builds contract groups from an execution history
#[derive(Debug, Clone)]
pub struct ContractGrouper {
    close_tolerance: Decimal,
}

impl ContractGrouper {
    pub fn new(close_tolerance: Decimal) -> Self {
        Self { close_tolerance }
    }

    /// Stock cycles, then other non-option buckets, then fused option spreads
    pub fn build<'a>(&self, executions: &'a [Execution]) -> Vec<ContractGroup<'a>> {
        let mut sorted: Vec<&Execution> = executions.iter().collect();
        sorted.sort_by_key(|e| e.timestamp());

        let mut stock_groups: Vec<ContractGroup<'a>> = Vec::new();
        let mut pending: Vec<Option<(ContractGroup<'a>, Decimal)>> = Vec::new();
        let mut open: HashMap<String, usize> = HashMap::new();
        let mut contracts: OrderedGroups<ContractKey, &'a Execution> = OrderedGroups::new();

        // Pass 1
        for execution in sorted {
            match execution.asset_class {
                AssetClass::Stock => {
                    let symbol = execution.underlying.clone();
                    let quantity = execution.quantity.abs();
                    let open_slot = open.get(&symbol).copied();

                    match (execution.side, open_slot) {
                        (Side::Buy, Some(slot)) => {
                            if let Some((group, balance)) = pending[slot].as_mut() {
                                group.executions.push(execution);
                                *balance += quantity;
                            }
                        }
                        (Side::Buy, None) => {
                            open.insert(symbol, pending.len());
                            pending.push(Some((
                                ContractGroup::new(GroupKind::StockCycle, execution),
                                quantity,
                            )));
                        }
                        (Side::Sell, Some(slot)) => {
                            let flat = match pending[slot].as_mut() {
                                Some((group, balance)) => {
                                    group.executions.push(execution);
                                    *balance -= quantity;
                                    *balance <= self.close_tolerance
                                }
                                None => false,
                            };
                            if flat {
                                if let Some((group, _)) = pending[slot].take() {
                                    stock_groups.push(group);
                                }
                                open.remove(&symbol);
                            }
                        }
                        (Side::Sell, None) => {
                            stock_groups.push(ContractGroup::new(GroupKind::StockOrphan, execution));
                        }
                    }
                }
                AssetClass::Option => contracts.push(
                    ContractKey::Option {
                        underlying: execution.underlying.clone(),
                        strike: execution.strike,
                        expiry: execution.expiry,
                    },
                    execution,
                ),
                AssetClass::Cash => contracts.push(
                    ContractKey::Other {
                        asset_class: execution.asset_class,
                        underlying: execution.underlying.clone(),
                        expiry: execution.expiry,
                        date: execution.date,
                    },
                    execution,
                ),
            }
        }
        stock_groups.extend(pending.into_iter().flatten().map(|(group, _)| group));

        // Pass 2
        let mut other_groups: Vec<ContractGroup<'a>> = Vec::new();
        let mut fused: OrderedGroups<FusionKey, Vec<&'a Execution>> = OrderedGroups::new();
        for (key, members) in contracts.into_groups() {
            match key {
                ContractKey::Option {
                    underlying, expiry, ..
                } => fused.push(FusionKey { underlying, expiry }, members),
                ContractKey::Other { .. } => {
                    let mut group = ContractGroup::new(GroupKind::Contract, members[0]);
                    group.executions = members;
                    other_groups.push(group);
                }
            }
        }

        let spread_groups = fused.into_groups().into_iter().filter_map(|(key, buckets)| {
            let executions: Vec<&'a Execution> = buckets.into_iter().flatten().collect();
            let first = *executions.first()?;
            let date = executions.iter().map(|e| e.date).min().unwrap_or(first.date);
            Some(ContractGroup {
                kind: GroupKind::SpreadCandidate,
                underlying: key.underlying,
                asset_class: AssetClass::Option,
                expiry: key.expiry,
                date,
                executions,
            })
        });

        stock_groups
            .into_iter()
            .chain(other_groups)
            .chain(spread_groups)
            .collect()
    }
}

impl Default for ContractGrouper {
    fn default() -> Self {
        Self::new(rust_decimal_macros::dec!(0.01))
    }
}
