//! File-backed execution source

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::common::errors::{ReconError, Result};
use crate::common::traits::ExecutionSource;

/// Reads a JSON array of raw execution rows from disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExecutionSource for JsonFileSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Vec<Value>> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let document: Value = serde_json::from_str(&text)?;

        match document {
            Value::Array(rows) => {
                debug!("Loaded {} raw rows", rows.len());
                Ok(rows)
            }
            other => Err(ReconError::Source {
                source_name: self.source_name(),
                message: format!("expected a JSON array of executions, found {}", json_kind(&other)),
            }),
        }
    }

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
