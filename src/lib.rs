//! Strategy Reconciler Library
//!
//! Reconciles raw brokerage executions (stock and option fills) into
//! deduplicated, economically labeled positions: wheel legs, covered calls,
//! vertical spreads, iron condors and directional stock cycles ("Rockets").

pub mod common;
pub mod config;
pub mod ingest;
pub mod strategy;
pub mod validation;

// Re-export commonly used types
pub use common::errors::{ReconError, Result};
pub use common::traits::ExecutionSource;
pub use common::types::{AssetClass, Execution, PutCall, Side};
pub use config::{load_config, AppConfig, EngineSettings};
pub use ingest::{dedup, dedup_with_manifest, ingest_rows, JsonFileSource, RawExecution, SkipManifest};

// Strategy types
pub use strategy::{
    classify, ClassifiedPosition, ContractGrouper, DailyClassifier, EquityLifecycleTracker,
    GroupReport, PositionSide, PositionStatus, Reconciler, Reconciliation, RocketPosition,
    StrategyLabel,
};

// Validation
pub use validation::{validate_trade, TradeRecord, TradeValidator, ValidationReport};
