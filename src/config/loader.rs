//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{ReconError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with RECON__, e.g. `RECON__ENGINE__LENIENT_DATES`)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("RECON")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ReconError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ReconError::Configuration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config(Some("does-not-exist.toml")).unwrap();
        assert_eq!(config.engine.option_multiplier, dec!(100));
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let path = std::env::temp_dir().join("strategy_reconciler_loader_test.toml");
        std::fs::write(
            &path,
            "[engine]\nclose_tolerance = \"0.5\"\n\n[settings]\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.engine.close_tolerance, dec!(0.5));
        assert_eq!(config.settings.log_level, "debug");

        std::fs::remove_file(&path).ok();
    }
}
