pub mod classify;
pub mod mock;
pub mod supabase;

use crate::config::DatabaseConfig;
use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// A result row: column name to scalar/JSON value, schema-less from the
/// service's point of view.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug)]
pub enum ExecError {
    ConnectionError(String),
    QueryError(String),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::ConnectionError(msg) => write!(f, "database connection error: {}", msg),
            ExecError::QueryError(msg) => write!(f, "database query error: {}", msg),
        }
    }
}

impl Error for ExecError {}

/// Executes a resolved SQL statement and returns ordered row-maps.
///
/// Two implementations exist: `SupabaseExecutor` against a live PostgREST
/// endpoint, and `MockExecutor` with deterministic canned data. Both share
/// the keyword classification in [`classify`].
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str, limit: usize) -> Result<Vec<Row>, ExecError>;
}

/// Picks the executor implementation at construction time: live when the
/// Supabase URL and service-role key are both configured, mock otherwise.
pub fn build_executor(config: &DatabaseConfig) -> Arc<dyn QueryExecutor> {
    match (&config.url, &config.service_role_key) {
        (Some(url), Some(key)) => {
            info!("Using live Supabase executor at {}", url);
            Arc::new(supabase::SupabaseExecutor::new(url.clone(), key.clone()))
        }
        _ => {
            warn!("Supabase credentials not found, using mock executor");
            Arc::new(mock::MockExecutor::new())
        }
    }
}

/// Builds a row-map from string keys and JSON values.
pub(crate) fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
