//! Strategy classification engine
//!
//! Turns deduplicated brokerage executions into economically labeled
//! positions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    INGEST (boundary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  raw rows ──► RawExecution ──► Execution ──► dedup          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CLASSIFY (pure, sync)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DailyClassifier  per (day, underlying)                     │
//! │    - covered call ─► vertical spread ─► single legs         │
//! │    - leftover stock ─► EquityLifecycleTracker (FIFO)        │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  compact ─► apply_naming_rules ─► fuse_iron_condors         │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  Vec<ClassifiedPosition>, newest first                      │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REPORTING                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ContractGrouper                                            │
//! │    - stock buy→flat cycles, per-contract option buckets     │
//! │    - (underlying, expiry) spread candidates + summaries     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Reconciler`]: entry point tying every stage together
//! - [`DailyClassifier`]: per-day multi-leg detection
//! - [`EquityLifecycleTracker`]: FIFO stock positions ([`RocketPosition`])
//! - [`ContractGrouper`]: contract groups and their summaries
//! - [`compact`], [`apply_naming_rules`], [`fuse_iron_condors`]: rule engine
//!
//! # Example
//!
//! ```ignore
//! use strategy_reconciler::{classify, Execution, PutCall, StrategyLabel};
//!
//! let positions = classify(&[
//!     Execution::option("1", day, "SPY", PutCall::Put, dec!(150), expiry, dec!(-1), dec!(5)),
//!     Execution::option("2", day, "SPY", PutCall::Put, dec!(145), expiry, dec!(1), dec!(2)),
//! ]);
//! assert_eq!(positions[0].detected_strategy, StrategyLabel::PcsStandard);
//! ```

mod compaction;
mod daily;
mod grouping;
mod lifecycle;
mod pipeline;
mod types;

pub use types::{position_id, ClassifiedPosition, PositionSide, PositionStatus, StrategyLabel};

pub use lifecycle::{EquityLifecycleTracker, RocketPosition};

pub use grouping::{
    has_assignment_code,
    ContractGroup,
    ContractGrouper,
    GroupKind,
    GroupReport,
    GroupSide,
    GroupSummary,
};

pub use daily::DailyClassifier;

pub use compaction::{apply_naming_rules, business_name, compact, fuse_iron_condors, sort_newest_first};

pub use pipeline::{classify, Reconciler, Reconciliation};
