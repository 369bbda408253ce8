//! Loose execution rows as handed over by the normalizer, and their
//! conversion into canonical [`Execution`]s

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

use super::dates::{date_from_description, epoch_date, parse_time, parse_trade_datetime};
use crate::common::errors::{ReconError, Result};
use crate::common::types::{derive_underlying, AssetClass, Execution, PutCall, Side};

/// A broker execution row before validation
///
/// Every field is optional; numbers may arrive as JSON numbers or numeric
/// strings, ids as strings or integers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExecution {
    #[serde(default, alias = "trade_id", alias = "tradeId", deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, alias = "dateTime", alias = "date_time", alias = "tradeDate")]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub underlying: Option<String>,
    #[serde(default, alias = "asset_class", alias = "assetType", alias = "asset_type")]
    pub asset_class: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub commission: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub proceeds: Option<Decimal>,
    #[serde(default, alias = "realized_pnl", alias = "fifoPnlRealized", deserialize_with = "lenient_decimal")]
    pub realized_pnl: Option<Decimal>,
    #[serde(default, alias = "cost_basis", deserialize_with = "lenient_decimal")]
    pub cost_basis: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub multiplier: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub strike: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub expiry: Option<String>,
    #[serde(default, alias = "put_call", alias = "type", alias = "right")]
    pub put_call: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RawExecution {
    /// Validate and convert into a canonical execution
    ///
    /// With `lenient_dates`, a row whose date cannot be recovered is dated
    /// at the epoch instead of being rejected.
    pub fn into_execution(self, lenient_dates: bool) -> Result<Execution> {
        let id = non_empty(self.id).ok_or_else(|| ReconError::missing("<unknown>", "id"))?;

        let description = self.description.unwrap_or_default();
        let put_call = non_empty(self.put_call)
            .map(|token| PutCall::from_str(&token))
            .transpose()?;

        let asset_class = match non_empty(self.asset_class) {
            Some(token) => AssetClass::from_str(&token)?,
            None if put_call.is_some() => AssetClass::Option,
            None => return Err(ReconError::missing(&id, "assetClass")),
        };

        let symbol = non_empty(self.symbol)
            .or_else(|| non_empty(self.underlying.clone()))
            .ok_or_else(|| ReconError::missing(&id, "symbol"))?;
        let underlying = non_empty(self.underlying)
            .unwrap_or_else(|| derive_underlying(&symbol, asset_class));

        let raw_quantity = self
            .quantity
            .ok_or_else(|| ReconError::missing(&id, "quantity"))?;
        if raw_quantity.is_zero() {
            return Err(ReconError::invalid(&id, "quantity", "quantity must be non-zero"));
        }

        let side = match non_empty(self.side) {
            Some(token) => Side::from_str(&token)?,
            None => Side::from_quantity(raw_quantity),
        };
        let quantity = match side {
            Side::Buy => raw_quantity.abs(),
            Side::Sell => -raw_quantity.abs(),
        };

        let parsed_date = self.date.as_deref().and_then(parse_trade_datetime);
        let (date, date_time) = match parsed_date {
            Some(parsed) => parsed,
            None => match date_from_description(&description) {
                Some(date) => (date, None),
                None if lenient_dates => (epoch_date(), None),
                None => {
                    return Err(ReconError::InvalidDate {
                        id,
                        raw: self.date.unwrap_or_default(),
                    })
                }
            },
        };
        let time = self.time.as_deref().and_then(parse_time).or(date_time);

        let price = self.price.unwrap_or_default();
        let multiplier = self
            .multiplier
            .filter(|m| !m.is_zero())
            .unwrap_or_else(|| asset_class.default_multiplier());
        let proceeds = match self.proceeds {
            Some(proceeds) if !proceeds.is_zero() => proceeds,
            _ => quantity
                .checked_mul(price)
                .and_then(|v| v.checked_mul(multiplier))
                .map(|v| -v)
                .ok_or_else(|| ReconError::invalid(&id, "proceeds", "proceeds overflow"))?,
        };

        Ok(Execution {
            id,
            date,
            time,
            symbol,
            underlying,
            asset_class,
            side,
            quantity,
            price,
            commission: self.commission.unwrap_or_default().abs(),
            proceeds,
            realized_pnl: self.realized_pnl.unwrap_or_default(),
            cost_basis: self.cost_basis.unwrap_or_default(),
            strike: self.strike.filter(|s| !s.is_zero()),
            expiry: self
                .expiry
                .as_deref()
                .and_then(parse_trade_datetime)
                .map(|(date, _)| date),
            put_call,
            description,
            notes: self.notes.unwrap_or_default(),
        })
    }
}

impl TryFrom<RawExecution> for Execution {
    type Error = ReconError;

    fn try_from(raw: RawExecution) -> Result<Self> {
        raw.into_execution(false)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept a decimal as a JSON number, a numeric string, an empty string or null
fn lenient_decimal<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => strip_thousands(s.trim()).ok_or_else(|| {
            serde::de::Error::custom(format!("ambiguous decimal separator in {:?}", s))
        })?,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a number, found {}",
                other
            )))
        }
    };
    if text.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid number {:?}: {}", text, e)))
}

/// Drop thousands separators; a comma is only accepted before a group of
/// exactly three digits, so `"2,35"` is rejected instead of read as 235
fn strip_thousands(text: &str) -> Option<String> {
    let integer_part = text.split('.').next().unwrap_or_default();
    let mut groups = integer_part.split(',');
    groups.next();
    if groups.any(|group| group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    Some(text.replace(',', ""))
}

/// Accept a string or an integer (broker trade ids are often numeric)
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw(value: Value) -> RawExecution {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_option_row_conversion() {
        let execution = raw(json!({
            "tradeId": 123456,
            "dateTime": "20260105;101500",
            "symbol": "SPY   260220P00400000",
            "assetClass": "OPT",
            "side": "SLD",
            "quantity": "1",
            "price": 5,
            "commission": -0.65,
            "proceeds": 500,
            "strike": "400",
            "expiry": "20260220",
            "putCall": "P",
            "notes": "O"
        }))
        .into_execution(false)
        .unwrap();

        assert_eq!(execution.id, "123456");
        assert_eq!(execution.underlying, "SPY");
        assert_eq!(execution.side, Side::Sell);
        assert_eq!(execution.quantity, dec!(-1));
        assert_eq!(execution.commission, dec!(0.65));
        assert_eq!(execution.strike, Some(dec!(400)));
        assert_eq!(execution.expiry, NaiveDate::from_ymd_opt(2026, 2, 20));
        assert_eq!(execution.put_call, Some(PutCall::Put));
        assert_eq!(execution.time, NaiveTime::from_hms_opt(10, 15, 0));
    }

    #[test]
    fn test_proceeds_derived_when_absent() {
        let execution = raw(json!({
            "id": "s1",
            "date": "2026-01-05",
            "symbol": "AAPL",
            "assetClass": "STK",
            "quantity": 10,
            "price": "150.5"
        }))
        .into_execution(false)
        .unwrap();

        assert_eq!(execution.side, Side::Buy);
        assert_eq!(execution.proceeds, dec!(-1505.0));
    }

    #[test]
    fn test_side_wins_over_quantity_sign() {
        let execution = raw(json!({
            "id": "s2",
            "date": "2026-01-05",
            "symbol": "AAPL",
            "assetClass": "STK",
            "side": "SELL",
            "quantity": 10,
            "price": 150
        }))
        .into_execution(false)
        .unwrap();

        assert_eq!(execution.quantity, dec!(-10));
        assert_eq!(execution.proceeds, dec!(1500));
    }

    #[test]
    fn test_rejects_missing_id_and_zero_quantity() {
        let no_id = raw(json!({"date": "2026-01-05", "symbol": "AAPL", "assetClass": "STK", "quantity": 1}));
        assert!(matches!(
            no_id.into_execution(false),
            Err(ReconError::MissingField { field: "id", .. })
        ));

        let zero = raw(json!({"id": "z", "date": "2026-01-05", "symbol": "AAPL", "assetClass": "STK", "quantity": 0}));
        assert!(matches!(
            zero.into_execution(false),
            Err(ReconError::InvalidValue { field: "quantity", .. })
        ));
    }

    #[test]
    fn test_bad_date_strict_and_lenient() {
        let row = json!({"id": "d", "date": "someday", "symbol": "AAPL", "assetClass": "STK", "quantity": 1});

        assert!(matches!(
            raw(row.clone()).into_execution(false),
            Err(ReconError::InvalidDate { .. })
        ));

        let lenient = raw(row).into_execution(true).unwrap();
        assert_eq!(lenient.date, epoch_date());
    }

    #[test]
    fn test_date_recovered_from_description() {
        let execution = raw(json!({
            "id": "d2",
            "symbol": "SPY",
            "assetClass": "OPT",
            "putCall": "C",
            "quantity": -1,
            "description": "SPY 19JUL24 540 C"
        }))
        .into_execution(false)
        .unwrap();

        assert_eq!(execution.date, NaiveDate::from_ymd_opt(2024, 7, 19).unwrap());
    }

    #[test]
    fn test_overflowing_proceeds_is_rejected() {
        let row = raw(json!({
            "id": "huge",
            "date": "2026-01-05",
            "symbol": "SPY",
            "assetClass": "OPT",
            "quantity": "1000000000000000",
            "price": "1000000000000000"
        }));

        assert!(matches!(
            row.into_execution(false),
            Err(ReconError::InvalidValue { field: "proceeds", .. })
        ));
    }

    #[test]
    fn test_thousands_separators() {
        let row = raw(json!({"id": "t", "quantity": "1,000", "price": "1,234,567.5"}));
        assert_eq!(row.quantity, Some(dec!(1000)));
        assert_eq!(row.price, Some(dec!(1234567.5)));

        let comma_decimal: std::result::Result<RawExecution, _> =
            serde_json::from_value(json!({"id": "c", "price": "2,35"}));
        assert!(comma_decimal.is_err());
    }

    #[test]
    fn test_non_numeric_quantity_fails_deserialization() {
        let result: std::result::Result<RawExecution, _> =
            serde_json::from_value(json!({"id": "q", "quantity": "lots"}));
        assert!(result.is_err());
    }
}
