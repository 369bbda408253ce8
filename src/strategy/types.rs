use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::common::types::{AssetClass, Execution, PutCall};

/// Strategy vocabulary
///
/// The first group are structural labels emitted by the daily classifier;
/// the second group are the user-facing names applied by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyLabel {
    #[serde(rename = "Covered Call")]
    CoveredCall,
    #[serde(rename = "Vertical Spread")]
    VerticalSpread,
    #[serde(rename = "Put Credit Spread")]
    PutCreditSpread,
    #[serde(rename = "Put Debit Spread")]
    PutDebitSpread,
    #[serde(rename = "Call Credit Spread")]
    CallCreditSpread,
    #[serde(rename = "Call Debit Spread")]
    CallDebitSpread,
    #[serde(rename = "Iron Condor")]
    IronCondor,
    #[serde(rename = "Short Put")]
    ShortPut,
    #[serde(rename = "Long Put")]
    LongPut,
    #[serde(rename = "Short Call")]
    ShortCall,
    #[serde(rename = "Long Call")]
    LongCall,
    #[serde(rename = "Rockets")]
    Rockets,
    #[serde(rename = "Wheel")]
    Wheel,
    #[serde(rename = "pcs standard")]
    PcsStandard,
    #[serde(rename = "pcs iron condor")]
    PcsIronCondor,
    #[serde(rename = "Change devise")]
    ChangeDevise,
    #[serde(rename = "Other")]
    Other,
}

impl StrategyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyLabel::CoveredCall => "Covered Call",
            StrategyLabel::VerticalSpread => "Vertical Spread",
            StrategyLabel::PutCreditSpread => "Put Credit Spread",
            StrategyLabel::PutDebitSpread => "Put Debit Spread",
            StrategyLabel::CallCreditSpread => "Call Credit Spread",
            StrategyLabel::CallDebitSpread => "Call Debit Spread",
            StrategyLabel::IronCondor => "Iron Condor",
            StrategyLabel::ShortPut => "Short Put",
            StrategyLabel::LongPut => "Long Put",
            StrategyLabel::ShortCall => "Short Call",
            StrategyLabel::LongCall => "Long Call",
            StrategyLabel::Rockets => "Rockets",
            StrategyLabel::Wheel => "Wheel",
            StrategyLabel::PcsStandard => "pcs standard",
            StrategyLabel::PcsIronCondor => "pcs iron condor",
            StrategyLabel::ChangeDevise => "Change devise",
            StrategyLabel::Other => "Other",
        }
    }

    /// Single option legs and covered calls all belong to the wheel rotation
    pub fn is_wheel_leg(&self) -> bool {
        matches!(
            self,
            StrategyLabel::ShortPut
                | StrategyLabel::CoveredCall
                | StrategyLabel::ShortCall
                | StrategyLabel::LongCall
                | StrategyLabel::LongPut
        )
    }

    pub fn is_vertical(&self) -> bool {
        matches!(
            self,
            StrategyLabel::VerticalSpread
                | StrategyLabel::PutCreditSpread
                | StrategyLabel::PutDebitSpread
                | StrategyLabel::CallCreditSpread
                | StrategyLabel::CallDebitSpread
        )
    }

    /// Vertical spread name from its option right and net cash flow
    pub fn vertical(put_call: PutCall, proceeds: Decimal) -> Self {
        let credit = proceeds > Decimal::ZERO;
        match (put_call, credit) {
            (PutCall::Put, true) => StrategyLabel::PutCreditSpread,
            (PutCall::Put, false) => StrategyLabel::PutDebitSpread,
            (PutCall::Call, true) => StrategyLabel::CallCreditSpread,
            (PutCall::Call, false) => StrategyLabel::CallDebitSpread,
        }
    }
}

impl std::fmt::Display for StrategyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Net cash direction of a classified position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    #[serde(rename = "CREDIT")]
    Credit,
    #[serde(rename = "DEBIT")]
    Debit,
    Complex,
}

impl PositionSide {
    pub fn from_proceeds(proceeds: Decimal) -> Self {
        if proceeds > Decimal::ZERO {
            PositionSide::Credit
        } else {
            PositionSide::Debit
        }
    }
}

/// Lifecycle status of an equity position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// One economically-labeled position, the engine's output unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedPosition {
    /// Deterministic id derived from the contributing executions
    pub id: String,
    pub date: NaiveDate,
    /// Underlying ticker
    pub symbol: String,
    /// User-facing strategy name
    pub detected_strategy: StrategyLabel,
    /// Economic structure detected before business naming
    pub structure: StrategyLabel,
    pub description: String,
    /// Contributing executions
    pub legs: Vec<Execution>,
    pub quantity: Decimal,
    pub proceeds: Decimal,
    pub commission: Decimal,
    pub realized_pnl: Decimal,
    /// Display strike, possibly composite (`"145 / 150"`)
    pub strike: String,
    pub expiry: Option<NaiveDate>,
    pub side: PositionSide,
    pub asset_class: AssetClass,
    /// Option right of a vertical spread or single option leg
    pub option_type: Option<PutCall>,
    /// Equity lifecycle status, for stock-derived positions
    pub status: Option<PositionStatus>,
}

impl ClassifiedPosition {
    /// Ids of every contributing execution
    pub fn leg_ids(&self) -> impl Iterator<Item = &str> {
        self.legs.iter().map(|leg| leg.id.as_str())
    }

    pub fn has_option_leg(&self) -> bool {
        self.legs.iter().any(Execution::is_option)
    }
}

/// Deterministic position id: `<prefix>-<date>-<symbol>-<digest>`
///
/// The digest covers the contributing execution ids, so ids are stable
/// across re-runs on the same input.
pub fn position_id<'a, I>(prefix: &str, date: NaiveDate, symbol: &str, leg_ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for id in leg_ids {
        hasher.update(id.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}-{}-{}", prefix, date, symbol, &digest[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_vertical_naming() {
        assert_eq!(
            StrategyLabel::vertical(PutCall::Put, dec!(300)),
            StrategyLabel::PutCreditSpread
        );
        assert_eq!(
            StrategyLabel::vertical(PutCall::Call, dec!(-50)),
            StrategyLabel::CallDebitSpread
        );
        assert_eq!(
            StrategyLabel::vertical(PutCall::Put, Decimal::ZERO),
            StrategyLabel::PutDebitSpread
        );
    }

    #[test]
    fn test_label_serializes_as_display_name() {
        let json = serde_json::to_string(&StrategyLabel::PcsIronCondor).unwrap();
        assert_eq!(json, "\"pcs iron condor\"");
        assert_eq!(StrategyLabel::PcsStandard.to_string(), "pcs standard");
    }

    #[test]
    fn test_position_id_is_stable_and_leg_sensitive() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let a = position_id("vs", date, "SPY", ["1", "2"]);
        let b = position_id("vs", date, "SPY", ["1", "2"]);
        let c = position_id("vs", date, "SPY", ["12"]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("vs-2026-01-05-SPY-"));
        assert_eq!(a.len(), "vs-2026-01-05-SPY-".len() + 12);
    }
}
