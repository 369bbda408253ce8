//! Equity lifecycle tracking ("Rockets")
//!
//! Replays stock fills in chronological order and folds each buy-to-flat
//! cycle of a symbol into one position. Additional buys pyramid into the open
//! position; sells reduce it and accumulate realized P/L.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

use super::types::{position_id, ClassifiedPosition, PositionSide, PositionStatus, StrategyLabel};
use crate::common::types::{AssetClass, Execution};

/// One buy-to-flat cycle of a stock, or an orphan sell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RocketPosition {
    pub id: String,
    pub symbol: String,
    /// Date of the opening fill
    pub date: NaiveDate,
    pub original_quantity: Decimal,
    /// Shares still held, never negative
    pub current_quantity: Decimal,
    pub total_realized_pnl: Decimal,
    pub proceeds: Decimal,
    pub commission: Decimal,
    pub status: PositionStatus,
    /// A sell with no tracked open position
    pub orphan: bool,
    pub sub_trades: Vec<Execution>,
}

impl RocketPosition {
    fn open(execution: &Execution) -> Self {
        Self {
            id: String::new(),
            symbol: execution.underlying.clone(),
            date: execution.date,
            original_quantity: execution.quantity,
            current_quantity: execution.quantity,
            total_realized_pnl: Decimal::ZERO,
            proceeds: execution.proceeds,
            commission: execution.commission,
            status: PositionStatus::Open,
            orphan: false,
            sub_trades: vec![execution.clone()],
        }
    }

    fn orphan(execution: &Execution) -> Self {
        Self {
            id: String::new(),
            symbol: execution.underlying.clone(),
            date: execution.date,
            original_quantity: execution.quantity.abs(),
            current_quantity: Decimal::ZERO,
            total_realized_pnl: execution.realized_pnl,
            proceeds: execution.proceeds,
            commission: execution.commission,
            status: PositionStatus::Closed,
            orphan: true,
            sub_trades: vec![execution.clone()],
        }
    }

    fn pyramid(&mut self, execution: &Execution) {
        self.original_quantity += execution.quantity;
        self.current_quantity += execution.quantity;
        self.proceeds += execution.proceeds;
        self.commission += execution.commission;
        self.sub_trades.push(execution.clone());
    }

    /// Apply a sell; returns true when the position went flat
    fn reduce(&mut self, execution: &Execution, tolerance: Decimal) -> bool {
        self.current_quantity += execution.quantity;
        self.total_realized_pnl += execution.realized_pnl;
        self.proceeds += execution.proceeds;
        self.commission += execution.commission;
        self.sub_trades.push(execution.clone());

        if self.current_quantity <= tolerance {
            self.status = PositionStatus::Closed;
            self.current_quantity = Decimal::ZERO;
            true
        } else {
            false
        }
    }

    pub fn is_partially_closed(&self) -> bool {
        self.status == PositionStatus::Open && self.current_quantity < self.original_quantity
    }

    pub fn description(&self) -> String {
        let suffix = if self.orphan {
            " (Orphan)"
        } else if self.status == PositionStatus::Closed {
            " (Closed)"
        } else if self.is_partially_closed() {
            " (Partial)"
        } else {
            ""
        };
        format!("Rockets {}{}", self.symbol, suffix)
    }

    /// Fold into the engine's output shape
    pub fn into_classified(self) -> ClassifiedPosition {
        let description = self.description();
        ClassifiedPosition {
            id: self.id,
            date: self.date,
            symbol: self.symbol,
            detected_strategy: StrategyLabel::Rockets,
            structure: StrategyLabel::Rockets,
            description,
            legs: self.sub_trades,
            quantity: self.original_quantity,
            proceeds: self.proceeds,
            commission: self.commission,
            realized_pnl: self.total_realized_pnl,
            strike: String::new(),
            expiry: None,
            side: PositionSide::from_proceeds(self.proceeds),
            asset_class: AssetClass::Stock,
            option_type: None,
            status: Some(self.status),
        }
    }
}

/// FIFO state machine over stock fills
///
/// The open-position index lives only for the duration of one
/// [`process`](Self::process) call.
#[derive(Debug, Clone)]
pub struct EquityLifecycleTracker {
    close_tolerance: Decimal,
}

impl EquityLifecycleTracker {
    pub fn new(close_tolerance: Decimal) -> Self {
        Self { close_tolerance }
    }

    /// Every position ever opened (open or closed) plus orphans, in creation order
    pub fn process(&self, executions: &[Execution]) -> Vec<RocketPosition> {
        let mut stocks: Vec<&Execution> = executions.iter().filter(|e| e.is_stock()).collect();
        stocks.sort_by_key(|e| e.timestamp());

        let mut rockets: Vec<RocketPosition> = Vec::new();
        let mut open: HashMap<String, usize> = HashMap::new();

        for execution in stocks {
            let symbol = execution.underlying.as_str();

            if execution.quantity > Decimal::ZERO {
                match open.get(symbol) {
                    Some(&slot) => {
                        trace!(symbol, id = %execution.id, "Pyramiding into open position");
                        rockets[slot].pyramid(execution);
                    }
                    None => {
                        trace!(symbol, id = %execution.id, "Opening position");
                        open.insert(symbol.to_string(), rockets.len());
                        rockets.push(RocketPosition::open(execution));
                    }
                }
                continue;
            }

            match open.get(symbol).copied() {
                Some(slot) if rockets[slot].current_quantity > Decimal::ZERO => {
                    if rockets[slot].reduce(execution, self.close_tolerance) {
                        trace!(symbol, id = %execution.id, "Position closed");
                        open.remove(symbol);
                    }
                }
                _ => {
                    trace!(symbol, id = %execution.id, "Orphan sell");
                    rockets.push(RocketPosition::orphan(execution));
                }
            }
        }

        for rocket in &mut rockets {
            let prefix = if rocket.orphan { "roc-orphan" } else { "roc" };
            rocket.id = position_id(
                prefix,
                rocket.date,
                &rocket.symbol,
                rocket.sub_trades.iter().map(|e| e.id.as_str()),
            );
        }

        rockets
    }
}

impl Default for EquityLifecycleTracker {
    fn default() -> Self {
        Self::new(rust_decimal_macros::dec!(0.01))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_buy_then_sell_closes_one_position() {
        let executions = vec![
            Execution::stock("b1", day(1), "AAPL", dec!(100), dec!(10)),
            Execution::stock("s1", day(2), "AAPL", dec!(-100), dec!(12)).with_realized_pnl(dec!(200)),
        ];

        let rockets = EquityLifecycleTracker::default().process(&executions);

        assert_eq!(rockets.len(), 1);
        let rocket = &rockets[0];
        assert_eq!(rocket.status, PositionStatus::Closed);
        assert_eq!(rocket.total_realized_pnl, dec!(200));
        assert_eq!(rocket.current_quantity, Decimal::ZERO);
        assert_eq!(rocket.proceeds, dec!(200));
        assert_eq!(rocket.description(), "Rockets AAPL (Closed)");
    }

    #[test]
    fn test_pyramiding_and_partial_close() {
        let executions = vec![
            Execution::stock("b1", day(1), "NVDA", dec!(50), dec!(100)),
            Execution::stock("b2", day(2), "NVDA", dec!(50), dec!(110)),
            Execution::stock("s1", day(3), "NVDA", dec!(-40), dec!(120)).with_realized_pnl(dec!(680)),
        ];

        let rockets = EquityLifecycleTracker::default().process(&executions);

        assert_eq!(rockets.len(), 1);
        let rocket = &rockets[0];
        assert_eq!(rocket.status, PositionStatus::Open);
        assert_eq!(rocket.original_quantity, dec!(100));
        assert_eq!(rocket.current_quantity, dec!(60));
        assert_eq!(rocket.sub_trades.len(), 3);
        assert!(rocket.is_partially_closed());
        assert_eq!(rocket.description(), "Rockets NVDA (Partial)");
    }

    #[test]
    fn test_orphan_sell_does_not_touch_state() {
        let executions = vec![
            Execution::stock("s0", day(1), "TSLA", dec!(-10), dec!(200)).with_realized_pnl(dec!(55)),
            Execution::stock("b1", day(2), "TSLA", dec!(10), dec!(190)),
        ];

        let rockets = EquityLifecycleTracker::default().process(&executions);

        assert_eq!(rockets.len(), 2);
        assert!(rockets[0].orphan);
        assert_eq!(rockets[0].status, PositionStatus::Closed);
        assert_eq!(rockets[0].total_realized_pnl, dec!(55));
        assert_eq!(rockets[1].status, PositionStatus::Open);
        assert_eq!(rockets[1].current_quantity, dec!(10));
    }

    #[test]
    fn test_out_of_order_input_is_sorted() {
        let executions = vec![
            Execution::stock("s1", day(5), "AMD", dec!(-10), dec!(120)),
            Execution::stock("b1", day(1), "AMD", dec!(10), dec!(100)),
        ];

        let rockets = EquityLifecycleTracker::default().process(&executions);

        assert_eq!(rockets.len(), 1);
        assert_eq!(rockets[0].date, day(1));
        assert_eq!(rockets[0].status, PositionStatus::Closed);
    }

    #[test]
    fn test_float_drift_within_tolerance_closes() {
        let executions = vec![
            Execution::stock("b1", day(1), "BTC", dec!(1.005), dec!(60000)),
            Execution::stock("s1", day(2), "BTC", dec!(-1.0), dec!(61000)),
        ];

        let rockets = EquityLifecycleTracker::default().process(&executions);

        assert_eq!(rockets[0].status, PositionStatus::Closed);
        assert_eq!(rockets[0].current_quantity, Decimal::ZERO);
    }

    #[test]
    fn test_new_cycle_after_close() {
        let executions = vec![
            Execution::stock("b1", day(1), "MSFT", dec!(10), dec!(400)),
            Execution::stock("s1", day(2), "MSFT", dec!(-10), dec!(410)),
            Execution::stock("b2", day(3), "MSFT", dec!(5), dec!(405)),
        ];

        let rockets = EquityLifecycleTracker::default().process(&executions);

        assert_eq!(rockets.len(), 2);
        assert_eq!(rockets[0].status, PositionStatus::Closed);
        assert_eq!(rockets[1].status, PositionStatus::Open);
        assert_ne!(rockets[0].id, rockets[1].id);
    }

    #[test]
    fn test_ignores_non_stock_executions() {
        let option = Execution::option(
            "o1",
            day(1),
            "AAPL",
            crate::common::types::PutCall::Put,
            dec!(150),
            day(20),
            dec!(-1),
            dec!(2),
        );

        assert!(EquityLifecycleTracker::default().process(&[option]).is_empty());
    }
}
