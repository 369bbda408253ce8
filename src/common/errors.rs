//! Error types for the reconciler

use thiserror::Error;

/// Result type alias using our ReconError
pub type Result<T> = std::result::Result<T, ReconError>;

/// Main error type for reconciliation operations
#[derive(Error, Debug)]
pub enum ReconError {
    /// A required execution field is absent or empty
    #[error("Missing field `{field}` on execution {id}")]
    MissingField { id: String, field: &'static str },

    /// A numeric field could not be used (zero quantity, negative where forbidden)
    #[error("Invalid value for `{field}` on execution {id}: {reason}")]
    InvalidValue {
        id: String,
        field: &'static str,
        reason: String,
    },

    /// A date could not be parsed from any supported broker format
    #[error("Unparseable date on execution {id}: {raw:?}")]
    InvalidDate { id: String, raw: String },

    /// An enumerated token (side, asset class, put/call) was not recognized
    #[error("Unknown {kind} token: {token:?}")]
    UnknownToken { kind: &'static str, token: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// File system errors while loading inputs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Execution source could not deliver rows
    #[error("Execution source error ({source_name}): {message}")]
    Source {
        source_name: String,
        message: String,
    },
}

impl ReconError {
    pub(crate) fn missing(id: &str, field: &'static str) -> Self {
        ReconError::MissingField {
            id: id.to_string(),
            field,
        }
    }

    pub(crate) fn invalid(id: &str, field: &'static str, reason: impl Into<String>) -> Self {
        ReconError::InvalidValue {
            id: id.to_string(),
            field,
            reason: reason.into(),
        }
    }
}
