//! Common test utilities and fixtures

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strategy_reconciler::common::types::{Execution, PutCall};

pub const SYMBOL: &str = "AAPL";

/// Trade date used by the single-day fixtures
pub fn trade_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()
}

pub fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

/// Option fill on [`SYMBOL`] expiring at [`expiry`]
pub fn option(id: &str, put_call: PutCall, strike: Decimal, quantity: Decimal, price: Decimal) -> Execution {
    Execution::option(id, trade_day(), SYMBOL, put_call, strike, expiry(), quantity, price)
}

/// Short 150 / long 145 put spread, net credit 300
pub fn put_credit_spread() -> Vec<Execution> {
    vec![
        option("pcs-short", PutCall::Put, dec!(150), dec!(-1), dec!(5)),
        option("pcs-long", PutCall::Put, dec!(145), dec!(1), dec!(2)),
    ]
}

/// Short 450 / long 455 call spread, net credit 250
pub fn call_credit_spread() -> Vec<Execution> {
    vec![
        option("ccs-short", PutCall::Call, dec!(450), dec!(-1), dec!(4)),
        option("ccs-long", PutCall::Call, dec!(455), dec!(1), dec!(1.5)),
    ]
}

/// Long 100 shares plus a short 210 call on the same day
pub fn covered_call() -> Vec<Execution> {
    vec![
        Execution::stock("cc-stock", trade_day(), SYMBOL, dec!(100), dec!(200)),
        option("cc-call", PutCall::Call, dec!(210), dec!(-1), dec!(3)),
    ]
}

/// A month of mixed activity across several underlyings
pub fn mixed_history() -> Vec<Execution> {
    let mut executions = vec![
        Execution::stock("nvda-1", day(2), "NVDA", dec!(50), dec!(100)),
        Execution::stock("nvda-2", day(5), "NVDA", dec!(50), dec!(110)),
        Execution::stock("nvda-3", day(9), "NVDA", dec!(-100), dec!(120)).with_realized_pnl(dec!(1500)),
        Execution::stock("tsla-1", day(7), "TSLA", dec!(-10), dec!(250)).with_realized_pnl(dec!(40)),
        Execution::option("spy-1", day(12), "SPY", PutCall::Put, dec!(500), day(30), dec!(-2), dec!(3)),
        Execution::stock("msft-1", day(20), "MSFT", dec!(100), dec!(400)).with_notes("A"),
    ];
    executions.extend(put_credit_spread());
    executions.extend(call_credit_spread());
    executions.extend(covered_call().into_iter().map(|e| {
        let id = format!("{}-b", e.id);
        Execution { id, date: day(22), ..e }
    }));
    executions
}

/// Raw broker rows in the normalizer's flattened shape
pub mod raw_rows {
    pub const MIXED_BATCH: &str = r#"[
        {"tradeId": "1001", "dateTime": "20260105;093000", "symbol": "AAPL", "assetClass": "STK",
         "side": "BOT", "quantity": "100", "price": "190.5", "commission": "-1.00"},
        {"tradeId": "1002", "dateTime": "2026-01-09 151500", "symbol": "AAPL", "assetClass": "STK",
         "side": "SLD", "quantity": "100", "price": "195", "commission": "-1.00", "fifoPnlRealized": "448"},
        {"tradeId": "1003", "tradeDate": "2026-01-09", "symbol": "AAPL  260220P00180000", "assetClass": "OPT",
         "side": "SLD", "quantity": "1", "price": "2.35", "strike": "180", "expiry": "20260220", "putCall": "P"},
        null,
        {"tradeId": "1001", "dateTime": "20260105;093000", "symbol": "AAPL", "assetClass": "STK",
         "side": "BOT", "quantity": "100", "price": "190.5"},
        {"tradeId": "1004", "symbol": "AAPL", "assetClass": "STK", "quantity": "10", "price": "1"},
        {"tradeId": "1005", "dateTime": "2026-01-12", "symbol": "EUR.USD", "assetClass": "CASH",
         "side": "BUY", "quantity": "1000", "price": "1.09", "proceeds": "-1090"}
    ]"#;
}
