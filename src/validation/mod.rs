//! Trade validation
//!
//! Independent of the classification pipeline: callers run it on single
//! records before persisting them and decide what to do with the report.

mod validator;

pub use validator::{
    validate_trade,
    TradeRecord,
    TradeValidator,
    ValidationError,
    ValidationReport,
    ValidationWarning,
};
