//! Query resolution: translate -> validate/fallback -> execute -> explain.
//!
//! Every request terminates in a response envelope. Translation and
//! execution faults are distinct error kinds with distinct messages;
//! explanation faults are always swallowed. Nothing here retries and
//! nothing here is fatal to the process.

use crate::context::QueryContext;
use crate::exec::{row, QueryExecutor, Row};
use crate::fallback::match_fallback;
use crate::llm::{is_quota_error, SqlTranslator};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Substituted when neither the model nor the rule table produced SQL for a
/// non-quota failure; still routable by the executor's raw path.
pub const PLACEHOLDER_SQL: &str =
    "SELECT 'Could not generate SQL for this question' AS message";

const EXPLANATION_UNAVAILABLE: &str = "AI explanation temporarily unavailable";

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub max_results: usize,
    pub explain: bool,
}

/// Where the resolved SQL came from. Carried in the envelope so callers can
/// tell model output apart from canned fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlSource {
    Model,
    Fallback,
    Placeholder,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub query: String,
    pub generated_sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_source: Option<SqlSource>,
    pub results: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub execution_time: f64,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct QueryPipeline {
    translator: SqlTranslator,
    executor: Arc<dyn QueryExecutor>,
    ctx: QueryContext,
}

impl QueryPipeline {
    pub fn new(
        translator: SqlTranslator,
        executor: Arc<dyn QueryExecutor>,
        ctx: QueryContext,
    ) -> Self {
        Self {
            translator,
            executor,
            ctx,
        }
    }

    pub async fn resolve(&self, request: QueryRequest) -> QueryResponse {
        let start = Instant::now();
        info!("Resolving query: {}", request.query);

        let raw_sql = self.translator.translate(&request.query, &self.ctx).await;

        let (sql, source) = match validate_translation(&raw_sql) {
            Ok(()) => (raw_sql.clone(), SqlSource::Model),
            Err(()) => match match_fallback(&request.query) {
                Some(canned) => {
                    info!("Translation unusable, fallback rule matched");
                    (canned.to_string(), SqlSource::Fallback)
                }
                None if is_quota_error(&raw_sql) => {
                    warn!("Model quota exhausted and no fallback rule matched");
                    return self.quota_response(&request, start);
                }
                None => {
                    warn!("Translation unusable and no fallback rule matched");
                    (PLACEHOLDER_SQL.to_string(), SqlSource::Placeholder)
                }
            },
        };

        match self.executor.execute(&sql, request.max_results).await {
            Ok(results) => {
                let explanation = if request.explain {
                    Some(self.explain(&sql).await)
                } else {
                    None
                };

                let row_count = results.len();
                info!(
                    "Query resolved: {} rows in {:.3}s",
                    row_count,
                    start.elapsed().as_secs_f64()
                );

                QueryResponse {
                    success: true,
                    query: request.query,
                    generated_sql: sql,
                    sql_source: Some(source),
                    results,
                    explanation,
                    execution_time: start.elapsed().as_secs_f64(),
                    row_count,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Execution failed: {}", e);
                let message = format!("Database query failed: {}", e);
                let results = vec![row(&[
                    ("error", json!(message)),
                    ("sql", json!(sql)),
                    ("note", json!("Check your database tables and permissions")),
                ])];

                QueryResponse {
                    success: false,
                    query: request.query,
                    generated_sql: sql,
                    sql_source: Some(source),
                    row_count: results.len(),
                    results,
                    explanation: None,
                    execution_time: start.elapsed().as_secs_f64(),
                    error: Some(message),
                }
            }
        }
    }

    /// Quota failures are masked from the caller: no provider diagnostics,
    /// just a retry hint and literal queries the rule table can answer.
    fn quota_response(&self, request: &QueryRequest, start: Instant) -> QueryResponse {
        let results = vec![row(&[
            ("error", json!("AI service temporarily unavailable")),
            ("message", json!("Please try again in a moment")),
            (
                "fallback_options",
                json!(["Try: 'show customers'", "Try: 'count orders'"]),
            ),
        ])];

        QueryResponse {
            success: false,
            query: request.query.clone(),
            generated_sql: String::new(),
            sql_source: None,
            row_count: results.len(),
            results,
            explanation: None,
            execution_time: start.elapsed().as_secs_f64(),
            error: Some("LLM quota exhausted - please try again shortly".to_string()),
        }
    }

    async fn explain(&self, sql: &str) -> String {
        let explanation = self.translator.explain(sql, &self.ctx).await;
        if explanation.starts_with("ERROR:") || explanation.is_empty() {
            EXPLANATION_UNAVAILABLE.to_string()
        } else {
            explanation
        }
    }
}

/// A usable translation is non-empty, does not carry the `ERROR:` prefix and
/// does not embed a generation-failure message.
fn validate_translation(sql: &str) -> Result<(), ()> {
    if sql.trim().is_empty() || sql.starts_with("ERROR:") || sql.contains("Failed to generate") {
        Err(())
    } else {
        Ok(())
    }
}
