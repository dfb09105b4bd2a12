pub mod providers;

use crate::config::LlmConfig;
use crate::context::QueryContext;
use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use tracing::{debug, warn};

/// Sentinel the model is instructed to emit for unanswerable questions.
pub const UNANSWERABLE_SENTINEL: &str = "ERROR: Cannot generate SQL for this question";

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
        }
    }
}

impl Error for LlmError {}

/// A hosted model with a single "generate text from a prompt" capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Wraps the model behind the translate/explain contract. Never returns an
/// error: every provider failure is folded into an `ERROR:`-prefixed string
/// so callers have a single failure convention to check.
pub struct SqlTranslator {
    generator: Box<dyn TextGenerator + Send + Sync>,
}

/// Stands in when no API key is configured: every call fails, which sends
/// the pipeline to its fallback rules instead of aborting startup.
struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::ConfigError(
            "GEMINI_API_KEY is not configured".to_string(),
        ))
    }
}

impl SqlTranslator {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            warn!("GEMINI_API_KEY not set, translation will rely on fallback rules");
            return Ok(Self {
                generator: Box::new(UnconfiguredGenerator),
            });
        }

        let generator: Box<dyn TextGenerator + Send + Sync> = match config.backend.as_str() {
            "gemini" => Box::new(providers::gemini::GeminiProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )));
            }
        };

        Ok(Self { generator })
    }

    pub fn with_generator(generator: Box<dyn TextGenerator + Send + Sync>) -> Self {
        Self { generator }
    }

    /// Translates a natural-language question into SQL. On any provider
    /// failure the result starts with `ERROR:`.
    pub async fn translate(&self, question: &str, ctx: &QueryContext) -> String {
        let prompt = format!(
            "You are an expert SQL query generator. Convert the natural language question to SQL.\n\n\
             {}\n\
             RULES:\n\
             1. Generate only valid SQL queries\n\
             2. Use the exact table and column names from the schema\n\
             3. Return only the SQL query, no explanations\n\
             4. Use proper SQL syntax and best practices\n\
             5. If the question cannot be answered with the given schema, return \"{}\"\n\n\
             Question: {}\n\n\
             SQL Query:",
            build_context_block(ctx),
            UNANSWERABLE_SENTINEL,
            question
        );

        match self.generator.generate(&prompt).await {
            Ok(text) => {
                let sql = strip_code_fences(&text);
                debug!("Translated question into SQL: {}", sql);
                sql
            }
            Err(e) => {
                warn!("SQL generation failed: {}", e);
                format!("ERROR: Failed to generate SQL - {}", e)
            }
        }
    }

    /// Explains a SQL statement in business terms. Failures come back as
    /// `ERROR:` strings and are treated as non-fatal by the pipeline.
    pub async fn explain(&self, sql: &str, ctx: &QueryContext) -> String {
        let prompt = format!(
            "Explain this SQL query in simple business terms.\n\n{}\nSQL Query: {}\n\nExplanation:",
            build_context_block(ctx),
            sql
        );

        match self.generator.generate(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("SQL explanation failed: {}", e);
                format!("ERROR: Failed to explain SQL - {}", e)
            }
        }
    }
}

/// Quota exhaustion is only distinguishable by message text: the provider
/// reports it as a 429 or mentions "quota" somewhere in the body.
pub fn is_quota_error(text: &str) -> bool {
    text.to_lowercase().contains("quota") || text.contains("429")
}

/// Renders the schema, business notes and worked examples into the shared
/// context block used by both prompts.
fn build_context_block(ctx: &QueryContext) -> String {
    let mut parts = Vec::new();

    parts.push("DATABASE SCHEMA:".to_string());
    for table in &ctx.schema.tables {
        let col_defs = table
            .columns
            .iter()
            .map(|col| format!("{} {}", col.name, col.ty))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("CREATE TABLE {} ({});", table.name, col_defs));
    }
    parts.push(String::new());

    if !ctx.business_notes.is_empty() {
        parts.push("BUSINESS CONTEXT:".to_string());
        parts.extend(ctx.business_notes.iter().cloned());
        parts.push(String::new());
    }

    if !ctx.examples.is_empty() {
        parts.push("EXAMPLE QUERIES:".to_string());
        for example in &ctx.examples {
            parts.push(format!("Question: {}", example.question));
            parts.push(format!("SQL: {}", example.sql));
            if let Some(explanation) = &example.explanation {
                parts.push(format!("Explanation: {}", explanation));
            }
            parts.push(String::new());
        }
    }

    parts.join("\n")
}

/// Strips a leading/trailing triple-backtick fence, with or without a
/// language tag, from a model reply.
fn strip_code_fences(text: &str) -> String {
    let mut sql = text.trim();

    if let Some(rest) = sql.strip_prefix("```sql") {
        sql = rest;
    } else if let Some(rest) = sql.strip_prefix("```") {
        sql = rest;
    }
    if let Some(rest) = sql.strip_suffix("```") {
        sql = rest;
    }

    sql.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedGenerator {
        reply: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(msg) => Err(LlmError::ResponseError(msg.to_string())),
            }
        }
    }

    struct PromptCapture;

    #[async_trait]
    impl TextGenerator for PromptCapture {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            Ok(prompt.to_string())
        }
    }

    fn translator(reply: Result<&'static str, &'static str>) -> SqlTranslator {
        SqlTranslator::with_generator(Box::new(CannedGenerator { reply }))
    }

    #[test]
    fn code_fences_are_stripped_with_and_without_language_tag() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT * FROM customers\n```"),
            "SELECT * FROM customers"
        );
        assert_eq!(strip_code_fences("```\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_code_fences("SELECT 1"), "SELECT 1");
    }

    #[tokio::test]
    async fn provider_failures_become_error_sentinels() {
        let t = translator(Err("boom"));
        let ctx = QueryContext::seed();

        let sql = t.translate("show customers", &ctx).await;
        assert!(sql.starts_with("ERROR: Failed to generate SQL - "));
        assert!(sql.contains("boom"));

        let explanation = t.explain("SELECT 1", &ctx).await;
        assert!(explanation.starts_with("ERROR: Failed to explain SQL - "));
    }

    #[tokio::test]
    async fn translate_returns_cleaned_sql() {
        let t = translator(Ok("```sql\nSELECT * FROM orders LIMIT 10\n```"));
        let ctx = QueryContext::seed();

        let sql = t.translate("show orders", &ctx).await;
        assert_eq!(sql, "SELECT * FROM orders LIMIT 10");
    }

    #[tokio::test]
    async fn prompt_carries_schema_notes_and_examples() {
        let t = SqlTranslator::with_generator(Box::new(PromptCapture));
        let ctx = QueryContext::seed();

        let prompt = t.translate("show customers", &ctx).await;
        assert!(prompt.contains("CREATE TABLE customers (id TEXT PRIMARY KEY"));
        assert!(prompt.contains("CREATE TABLE orders ("));
        assert!(prompt.contains("BUSINESS CONTEXT:"));
        assert!(prompt.contains("Question: Who are my top 5 customers?"));
        assert!(prompt.contains(UNANSWERABLE_SENTINEL));
        assert!(prompt.contains("Question: show customers"));
    }

    #[test]
    fn quota_detection_matches_message_and_status_code() {
        assert!(is_quota_error("Quota exceeded for model"));
        assert!(is_quota_error("API responded with status code: 429"));
        assert!(!is_quota_error("connection reset by peer"));
    }
}
