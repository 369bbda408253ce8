//! Trait definitions for execution inputs

use async_trait::async_trait;

use super::errors::Result;

/// Trait for anything that can deliver raw execution rows
///
/// Implementations perform whatever I/O they need (files, broker
/// gateways, flex queries) and hand back the rows untouched. Row-level
/// validation happens afterwards in [`crate::ingest::normalize_rows`], so a
/// single malformed row never fails the whole fetch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionSource: Send + Sync {
    /// Fetch every available raw execution row
    async fn fetch(&self) -> Result<Vec<serde_json::Value>>;

    /// Human-readable name used in logs and errors
    fn source_name(&self) -> String;
}
