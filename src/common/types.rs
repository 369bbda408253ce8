//! Canonical execution types shared by every stage of the engine

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::ReconError;

/// Asset class of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    #[serde(rename = "STK")]
    Stock,
    #[serde(rename = "OPT")]
    Option,
    #[serde(rename = "CASH")]
    Cash,
}

impl AssetClass {
    /// Default contract multiplier when the broker row does not carry one
    pub fn default_multiplier(&self) -> Decimal {
        match self {
            AssetClass::Stock => Decimal::ONE,
            AssetClass::Option | AssetClass::Cash => Decimal::ONE_HUNDRED,
        }
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Stock => write!(f, "STK"),
            AssetClass::Option => write!(f, "OPT"),
            AssetClass::Cash => write!(f, "CASH"),
        }
    }
}

impl FromStr for AssetClass {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STK" | "STOCK" => Ok(AssetClass::Stock),
            "OPT" | "OPTION" => Ok(AssetClass::Option),
            "CASH" => Ok(AssetClass::Cash),
            other => Err(ReconError::UnknownToken {
                kind: "asset class",
                token: other.to_string(),
            }),
        }
    }
}

/// Execution side (BOT/SLD are normalized to Buy/Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side implied by a signed quantity
    pub fn from_quantity(quantity: Decimal) -> Self {
        if quantity.is_sign_negative() {
            Side::Sell
        } else {
            Side::Buy
        }
    }

    pub fn is_opposite(&self, other: Side) -> bool {
        *self != other
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "BOT" => Ok(Side::Buy),
            "SELL" | "SLD" => Ok(Side::Sell),
            other => Err(ReconError::UnknownToken {
                kind: "side",
                token: other.to_string(),
            }),
        }
    }
}

/// Option right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PutCall {
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl std::fmt::Display for PutCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PutCall::Call => write!(f, "C"),
            PutCall::Put => write!(f, "P"),
        }
    }
}

impl FromStr for PutCall {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "C" | "CALL" => Ok(PutCall::Call),
            "P" | "PUT" => Ok(PutCall::Put),
            other => Err(ReconError::UnknownToken {
                kind: "put/call",
                token: other.to_string(),
            }),
        }
    }
}

/// A single brokerage fill, as produced by the normalizer boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Broker execution id, unique across a batch
    pub id: String,
    /// Trade date
    pub date: NaiveDate,
    /// Execution time, when the broker reports one
    #[serde(default)]
    pub time: Option<NaiveTime>,
    /// Symbol as reported (OCC code for options)
    pub symbol: String,
    /// Underlying ticker (equal to `symbol` for stock and cash)
    pub underlying: String,
    pub asset_class: AssetClass,
    pub side: Side,
    /// Signed quantity: positive = bought, negative = sold
    pub quantity: Decimal,
    pub price: Decimal,
    /// Commission magnitude, never negative
    pub commission: Decimal,
    /// Signed cash flow
    pub proceeds: Decimal,
    /// Broker-reported realized P/L (zero when absent)
    #[serde(default)]
    pub realized_pnl: Decimal,
    #[serde(default)]
    pub cost_basis: Decimal,
    #[serde(default)]
    pub strike: Option<Decimal>,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
    #[serde(default)]
    pub put_call: Option<PutCall>,
    #[serde(default)]
    pub description: String,
    /// Free-text broker codes (assignment, exercise, ...)
    #[serde(default)]
    pub notes: String,
}

impl Execution {
    /// Create an execution with proceeds derived from price and quantity.
    ///
    /// The side follows the sign of `quantity`.
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        symbol: impl Into<String>,
        asset_class: AssetClass,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        let symbol = symbol.into();
        let underlying = derive_underlying(&symbol, asset_class);
        Self {
            id: id.into(),
            date,
            time: None,
            symbol,
            underlying,
            asset_class,
            side: Side::from_quantity(quantity),
            quantity,
            price,
            commission: Decimal::ZERO,
            proceeds: -quantity * price * asset_class.default_multiplier(),
            realized_pnl: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            strike: None,
            expiry: None,
            put_call: None,
            description: String::new(),
            notes: String::new(),
        }
    }

    /// Shorthand for a stock fill
    pub fn stock(
        id: impl Into<String>,
        date: NaiveDate,
        symbol: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(id, date, symbol, AssetClass::Stock, quantity, price)
    }

    /// Shorthand for an option fill on `underlying`
    #[allow(clippy::too_many_arguments)]
    pub fn option(
        id: impl Into<String>,
        date: NaiveDate,
        underlying: impl Into<String>,
        put_call: PutCall,
        strike: Decimal,
        expiry: NaiveDate,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        let underlying = underlying.into();
        let mut execution = Self::new(id, date, underlying, AssetClass::Option, quantity, price);
        execution.put_call = Some(put_call);
        execution.strike = Some(strike);
        execution.expiry = Some(expiry);
        execution
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_proceeds(mut self, proceeds: Decimal) -> Self {
        self.proceeds = proceeds;
        self
    }

    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.commission = commission.abs();
        self
    }

    pub fn with_realized_pnl(mut self, realized_pnl: Decimal) -> Self {
        self.realized_pnl = realized_pnl;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_underlying(mut self, underlying: impl Into<String>) -> Self {
        self.underlying = underlying.into();
        self
    }

    /// Chronological sort key; a missing time sorts at the start of the day
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    pub fn is_stock(&self) -> bool {
        self.asset_class == AssetClass::Stock
    }

    pub fn is_option(&self) -> bool {
        self.asset_class == AssetClass::Option
    }

    pub fn is_short_call(&self) -> bool {
        self.is_option() && self.side == Side::Sell && self.put_call == Some(PutCall::Call)
    }

    pub fn is_long_stock(&self) -> bool {
        self.is_stock() && self.side == Side::Buy
    }
}

/// Underlying ticker for a symbol: the first whitespace token of an OCC option code
pub fn derive_underlying(symbol: &str, asset_class: AssetClass) -> String {
    let trimmed = symbol.trim();
    match asset_class {
        AssetClass::Option => trimmed
            .split_whitespace()
            .next()
            .unwrap_or(trimmed)
            .to_string(),
        AssetClass::Stock | AssetClass::Cash => trimmed.to_string(),
    }
}

/// Render a decimal without trailing zeros (`150.00` -> `150`)
pub fn display_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}
