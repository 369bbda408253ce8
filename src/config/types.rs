//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Classification engine tunables
    #[serde(default)]
    pub engine: EngineSettings,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Tunables for the classification engine and the trade validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Remaining quantity at or below which an equity position counts as flat
    #[serde(default = "default_close_tolerance")]
    pub close_tolerance: Decimal,
    /// Absolute P/L difference that raises a validator warning
    #[serde(default = "default_pnl_warning_threshold")]
    pub pnl_warning_threshold: Decimal,
    /// Contract multiplier applied to option P/L
    #[serde(default = "default_option_multiplier")]
    pub option_multiplier: Decimal,
    /// Map unparseable execution dates to the epoch instead of skipping the row
    #[serde(default)]
    pub lenient_dates: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            close_tolerance: default_close_tolerance(),
            pnl_warning_threshold: default_pnl_warning_threshold(),
            option_multiplier: default_option_multiplier(),
            lenient_dates: false,
        }
    }
}

fn default_close_tolerance() -> Decimal {
    dec!(0.01)
}

fn default_pnl_warning_threshold() -> Decimal {
    dec!(1.0)
}

fn default_option_multiplier() -> Decimal {
    dec!(100)
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
