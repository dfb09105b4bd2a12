use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::pipeline::{QueryRequest, QueryResponse};
use crate::web::state::AppState;

const SERVICE_NAME: &str = "text2query";

#[derive(Debug, Deserialize)]
pub struct QueryApiRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: i64,
    #[serde(default = "default_explain")]
    pub explain: bool,
}

fn default_max_results() -> i64 {
    10
}

fn default_explain() -> bool {
    true
}

/// Converts the wire request into a pipeline request. Negative limits are
/// clamped to zero rather than rejected.
fn to_query_request(payload: QueryApiRequest) -> QueryRequest {
    QueryRequest {
        query: payload.query,
        max_results: payload.max_results.max(0) as usize,
        explain: payload.explain,
    }
}

pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database_mode = if state.config.database.url.is_some() {
        "live"
    } else {
        "mock"
    };

    Json(json!({
        "message": "Text-to-Query API is running",
        "endpoints": ["/health", "/query", "/simple-query"],
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
        "llm_backend": state.config.llm.backend,
        "database_mode": database_mode,
    }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds();

    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
        "uptime_seconds": uptime,
    }))
}

async fn process_text_query(
    state: &Arc<AppState>,
    payload: QueryApiRequest,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    if payload.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query must not be empty".to_string()));
    }

    info!("Processing query: {}", payload.query);

    Ok(Json(state.pipeline.resolve(to_query_request(payload)).await))
}

pub async fn text_to_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryApiRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    process_text_query(&state, payload).await
}

/// Identical to `/query`; kept as a separate route for compatibility.
pub async fn simple_text_to_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryApiRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    process_text_query(&state, payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::context::QueryContext;
    use crate::exec::mock::MockExecutor;
    use crate::llm::SqlTranslator;
    use crate::pipeline::QueryPipeline;

    fn mock_state() -> Arc<AppState> {
        // No API key and no database credentials: fallback rules plus the
        // mock executor, so nothing here touches the network.
        let config = AppConfig::default();
        let translator = SqlTranslator::new(&config.llm).unwrap();
        let executor = Arc::new(MockExecutor::new());
        let pipeline = QueryPipeline::new(translator, executor, QueryContext::seed());
        Arc::new(AppState::new(config, pipeline))
    }

    #[test]
    fn negative_max_results_is_clamped_to_zero() {
        let payload: QueryApiRequest =
            serde_json::from_str(r#"{"query": "show customers", "max_results": -5}"#).unwrap();

        let request = to_query_request(payload);
        assert_eq!(request.max_results, 0);
    }

    #[test]
    fn omitted_fields_take_their_documented_defaults() {
        let payload: QueryApiRequest =
            serde_json::from_str(r#"{"query": "show customers"}"#).unwrap();

        let request = to_query_request(payload);
        assert_eq!(request.max_results, 10);
        assert!(request.explain);
    }

    #[tokio::test]
    async fn clamped_negative_limit_yields_a_minimal_result_set() {
        let payload = QueryApiRequest {
            query: "show customers".to_string(),
            max_results: -5,
            explain: false,
        };

        let Json(response) = process_text_query(&mock_state(), payload).await.unwrap();
        assert!(response.success);
        // Only the mock-mode note survives a zero limit.
        assert_eq!(response.row_count, 1);
        assert_eq!(response.row_count, response.results.len());
    }

    #[tokio::test]
    async fn blank_queries_are_rejected() {
        let payload = QueryApiRequest {
            query: "   ".to_string(),
            max_results: 10,
            explain: false,
        };

        let (status, _) = process_text_query(&mock_state(), payload).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_service_name_and_uptime() {
        let Json(body) = health_check(State(mock_state())).await;

        assert_eq!(body["status"], json!("healthy"));
        assert_eq!(body["service"], json!(SERVICE_NAME));
        assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
    }

    #[tokio::test]
    async fn root_reports_mock_mode_when_unconfigured() {
        let Json(body) = root(State(mock_state())).await;

        assert_eq!(body["database_mode"], json!("mock"));
        assert_eq!(body["llm_backend"], json!("gemini"));
        assert_eq!(body["status"], json!("active"));
    }
}
