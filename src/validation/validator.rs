//! Pre-persistence trade integrity checks

use chrono::{NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::common::types::{AssetClass, Side};
use crate::config::EngineSettings;
use crate::ingest::parse_trade_datetime;

/// OCC option code tail: YYMMDD, right, strike
static OPTION_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{6}[CP]\d+").expect("static regex"));

/// A trade as it is about to be persisted
///
/// Every field is optional so that incomplete records still deserialize and
/// get reported instead of rejected by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    #[serde(default, alias = "trade_id", alias = "tradeId")]
    pub id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default, alias = "open_price", alias = "price")]
    pub open_price: Option<Decimal>,
    #[serde(default, alias = "close_price")]
    pub close_price: Option<Decimal>,
    #[serde(default)]
    pub commission: Option<Decimal>,
    #[serde(default, alias = "open_date")]
    pub open_date: Option<String>,
    #[serde(default, alias = "close_date")]
    pub close_date: Option<String>,
    #[serde(default, alias = "realized_pnl")]
    pub realized_pnl: Option<Decimal>,
    #[serde(default, alias = "asset_class", alias = "assetType")]
    pub asset_class: Option<String>,
}

/// Hard integrity failures; any one makes the trade invalid
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing trade id")]
    MissingId,

    #[error("Missing symbol")]
    MissingSymbol,

    #[error("Quantity must be positive, got {}", display_opt(.0))]
    NonPositiveQuantity(Option<Decimal>),

    #[error("Open price and close price are both missing or not positive")]
    NonPositivePrice,

    #[error("Commission cannot be negative, got {0}")]
    NegativeCommission(Decimal),

    #[error("Missing open date")]
    MissingOpenDate,

    #[error("Unparseable {field}: {raw:?}")]
    InvalidDate { field: &'static str, raw: String },

    #[error("Close date {close} is earlier than open date {open}")]
    CloseBeforeOpen {
        open: NaiveDateTime,
        close: NaiveDateTime,
    },

    #[error("Invalid side: {0:?}")]
    InvalidSide(String),
}

/// Soft findings that do not affect validity
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    #[error("Computed P/L {computed} differs from reported {reported} by {difference}")]
    PnlMismatch {
        computed: Decimal,
        reported: Decimal,
        difference: Decimal,
    },
}

fn display_opt(value: &Option<Decimal>) -> String {
    value.map_or_else(|| "nothing".to_string(), |v| v.to_string())
}

fn as_messages<S, T>(items: &[T], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    T: std::fmt::Display,
{
    serializer.collect_seq(items.iter().map(|item| item.to_string()))
}

/// Outcome of validating one trade
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(serialize_with = "as_messages")]
    pub errors: Vec<ValidationError>,
    #[serde(serialize_with = "as_messages")]
    pub warnings: Vec<ValidationWarning>,
}

/// Trade validator bound to engine settings
#[derive(Debug, Clone, Default)]
pub struct TradeValidator {
    settings: EngineSettings,
}

impl TradeValidator {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn validate(&self, trade: &TradeRecord) -> ValidationReport {
        validate_trade(trade, &self.settings)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn parse_date_field(
    field: &'static str,
    raw: &Option<String>,
    errors: &mut Vec<ValidationError>,
) -> Option<NaiveDateTime> {
    let raw = raw.as_deref().filter(|r| !r.trim().is_empty())?;
    match parse_trade_datetime(raw) {
        Some((date, time)) => Some(date.and_time(time.unwrap_or(NaiveTime::MIN))),
        None => {
            errors.push(ValidationError::InvalidDate {
                field,
                raw: raw.to_string(),
            });
            None
        }
    }
}

/// Contract multiplier for the trade's P/L
fn multiplier(trade: &TradeRecord, settings: &EngineSettings) -> Decimal {
    let class_is_option = trade
        .asset_class
        .as_deref()
        .and_then(|token| token.parse::<AssetClass>().ok())
        == Some(AssetClass::Option);
    let symbol_is_option = trade
        .symbol
        .as_deref()
        .map_or(false, |symbol| OPTION_CODE.is_match(symbol));

    if class_is_option || symbol_is_option {
        settings.option_multiplier
    } else {
        Decimal::ONE
    }
}

/// Check a trade; never fails, problems land in the report
pub fn validate_trade(trade: &TradeRecord, settings: &EngineSettings) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if is_blank(&trade.id) {
        errors.push(ValidationError::MissingId);
    }
    if is_blank(&trade.symbol) {
        errors.push(ValidationError::MissingSymbol);
    }
    if trade.quantity.map_or(true, |q| q <= Decimal::ZERO) {
        errors.push(ValidationError::NonPositiveQuantity(trade.quantity));
    }

    let open_price = trade.open_price.unwrap_or_default();
    let close_price = trade.close_price.unwrap_or_default();
    if open_price <= Decimal::ZERO && close_price <= Decimal::ZERO {
        errors.push(ValidationError::NonPositivePrice);
    }

    let commission = trade.commission.unwrap_or_default();
    if commission < Decimal::ZERO {
        errors.push(ValidationError::NegativeCommission(commission));
    }

    if is_blank(&trade.open_date) {
        errors.push(ValidationError::MissingOpenDate);
    }
    let opened = parse_date_field("open date", &trade.open_date, &mut errors);
    let closed = parse_date_field("close date", &trade.close_date, &mut errors);
    if let (Some(open), Some(close)) = (opened, closed) {
        if close < open {
            errors.push(ValidationError::CloseBeforeOpen { open, close });
        }
    }

    let side = trade.side.clone().unwrap_or_default();
    if side.parse::<Side>().is_err() {
        errors.push(ValidationError::InvalidSide(side));
    }

    if let (Some(close), Some(reported), Some(quantity)) =
        (trade.close_price, trade.realized_pnl, trade.quantity)
    {
        let computed = (close - open_price) * quantity * multiplier(trade, settings) - commission;
        let difference = (computed - reported).abs();
        if difference > settings.pnl_warning_threshold {
            warnings.push(ValidationWarning::PnlMismatch {
                computed,
                reported,
                difference,
            });
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}
